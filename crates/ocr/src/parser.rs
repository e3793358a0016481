use crate::config::ParserConfig;
use crate::extract::{default_extractors, FieldExtractor};
use crate::reconcile::Reconciler;
use crate::tokenize::{RawText, Tokenizer};
use crate::types::{FieldCandidate, ReceiptRecord};

/// Tokenizer → field extractors → reconciler.
///
/// Extractors capture the configuration they need at construction; the
/// parser holds only read-only state, so one instance can serve any number
/// of concurrent requests behind an `Arc`.
pub struct ReceiptParser {
    tokenizer: Tokenizer,
    extractors: Vec<Box<dyn FieldExtractor>>,
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ReceiptParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { tokenizer: Tokenizer::new(), extractors: default_extractors(&config) }
    }

    /// Every candidate the extractors emit, before reconciliation.
    pub fn candidates(&self, raw: &RawText) -> Vec<FieldCandidate> {
        let doc = self.tokenizer.tokenize(raw);
        if doc.is_empty() {
            tracing::debug!("no printable text to parse");
            return vec![];
        }
        self.extractors
            .iter()
            .flat_map(|extractor| {
                let found = extractor.extract(&doc);
                tracing::debug!(extractor = extractor.name(), candidates = found.len(), "extractor finished");
                found
            })
            .collect()
    }

    pub fn parse(&self, raw: &RawText) -> ReceiptRecord {
        let record = Reconciler::reconcile(self.candidates(raw));
        tracing::debug!(
            confidence = record.confidence(),
            items = record.line_items().len(),
            "receipt reconciled"
        );
        record
    }

    pub fn parse_text(&self, text: &str) -> ReceiptRecord {
        self.parse(&RawText::from_block(text))
    }

    pub fn parse_lines<I, S>(&self, lines: I) -> ReceiptRecord
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse(&RawText::from_lines(lines))
    }
}
