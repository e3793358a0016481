pub mod config;
pub mod digest;
pub mod extract;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod recognizer;
pub mod tokenize;
pub mod types;

pub use config::{AnchorKeyword, ConfigError, DateOrder, ParserConfig};
pub use digest::image_digest;
pub use extract::{default_extractors, FieldExtractor};
pub use parser::ReceiptParser;
pub use pipeline::{PipelineError, ReceiptPipeline, ScanResult};
pub use reconcile::Reconciler;
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use tokenize::{Line, RawText, Token, TokenKind, TokenizedText, Tokenizer};
pub use types::{ExtractedField, FieldCandidate, FieldKind, FieldValue, LineItem, ReceiptRecord};
