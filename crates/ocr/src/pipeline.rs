use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::digest::image_digest;
use crate::parser::ReceiptParser;
use crate::recognizer::OcrBackend;
use crate::types::ReceiptRecord;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The result of scanning one receipt image.
#[derive(Debug)]
pub struct ScanResult {
    /// SHA-256 hex digest of the image, used to correlate log lines.
    pub digest_hex: String,
    /// Raw OCR text output; empty when recognition failed.
    pub ocr_text: String,
    pub record: ReceiptRecord,
}

/// Orchestrates: digest → OCR → parse. One instance serves every request.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    parser: Arc<ReceiptParser>,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R, parser: Arc<ReceiptParser>) -> Self {
        Self { recognizer, parser }
    }

    /// Process an image on disk. Only reading the file can fail.
    pub async fn process_file(&self, path: &Path) -> Result<ScanResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(self.process_bytes(&bytes))
    }

    /// Process raw image bytes. OCR failures degrade to an empty,
    /// zero-confidence record rather than an error.
    pub fn process_bytes(&self, data: &[u8]) -> ScanResult {
        let digest_hex = image_digest(data);

        let ocr_text = match self.recognizer.recognize(data) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(digest = %digest_hex, "OCR failed, parsing as empty text: {e}");
                String::new()
            }
        };

        let record = self.parser.parse_text(&ocr_text);
        tracing::info!(
            digest = %digest_hex,
            confidence = record.confidence(),
            items = record.line_items().len(),
            needs_review = record.needs_review(),
            "receipt scanned"
        );

        ScanResult { digest_hex, ocr_text, record }
    }
}
