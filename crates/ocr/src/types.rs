use chrono::NaiveDate;
use serde::Serialize;
use slipscan_core::Money;
use std::fmt;

/// Below this overall confidence a record should be confirmed by the user.
pub const REVIEW_THRESHOLD: f32 = 0.7;

/// A single extracted value with an associated confidence score (0.0–1.0).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractedField<T> {
    pub value: T,
    /// Confidence in this extraction (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
    /// Source line the value was read from.
    pub line: usize,
}

impl<T> ExtractedField<T> {
    pub fn new(value: T, confidence: f32, line: usize) -> Self {
        Self { value, confidence: confidence.clamp(0.0, 1.0), line }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LineItem {
    pub description: String,
    /// Negative only when `discount` is set.
    pub amount: Money,
    pub discount: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Merchant,
    Date,
    Total,
    Subtotal,
    Tax,
    LineItem,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Merchant => write!(f, "merchant"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Total => write!(f, "total"),
            FieldKind::Subtotal => write!(f, "subtotal"),
            FieldKind::Tax => write!(f, "tax"),
            FieldKind::LineItem => write!(f, "line_item"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Merchant(String),
    Date(NaiveDate),
    Total(Money),
    Subtotal(Money),
    Tax(Money),
    LineItem(LineItem),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Merchant(_) => FieldKind::Merchant,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Total(_) => FieldKind::Total,
            FieldValue::Subtotal(_) => FieldKind::Subtotal,
            FieldValue::Tax(_) => FieldKind::Tax,
            FieldValue::LineItem(_) => FieldKind::LineItem,
        }
    }
}

/// A tentative, scored extraction emitted by one field extractor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldCandidate {
    #[serde(flatten)]
    pub value: FieldValue,
    pub line: usize,
    pub confidence: f32,
}

impl FieldCandidate {
    pub fn new(value: FieldValue, line: usize, confidence: f32) -> Self {
        Self { value, line, confidence: confidence.clamp(0.0, 1.0) }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }
}

/// The reconciled, confidence-annotated representation of one receipt.
///
/// Only the reconciler builds non-empty records; the fields are read-only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceiptRecord {
    merchant: Option<ExtractedField<String>>,
    date: Option<ExtractedField<NaiveDate>>,
    /// Never negative; always two fractional digits.
    total: Option<ExtractedField<Money>>,
    subtotal: Option<ExtractedField<Money>>,
    tax: Option<ExtractedField<Money>>,
    line_items: Vec<LineItem>,
    /// Mean confidence of the merchant, date and total that were found.
    confidence: f32,
}

impl ReceiptRecord {
    /// The "could not parse" record: nothing found, zero confidence.
    pub fn empty() -> Self {
        Self {
            merchant: None,
            date: None,
            total: None,
            subtotal: None,
            tax: None,
            line_items: vec![],
            confidence: 0.0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        merchant: Option<ExtractedField<String>>,
        date: Option<ExtractedField<NaiveDate>>,
        total: Option<ExtractedField<Money>>,
        subtotal: Option<ExtractedField<Money>>,
        tax: Option<ExtractedField<Money>>,
        line_items: Vec<LineItem>,
        confidence: f32,
    ) -> Self {
        Self { merchant, date, total, subtotal, tax, line_items, confidence }
    }

    pub fn merchant(&self) -> Option<&ExtractedField<String>> {
        self.merchant.as_ref()
    }

    pub fn date(&self) -> Option<&ExtractedField<NaiveDate>> {
        self.date.as_ref()
    }

    pub fn total(&self) -> Option<&ExtractedField<Money>> {
        self.total.as_ref()
    }

    pub fn subtotal(&self) -> Option<&ExtractedField<Money>> {
        self.subtotal.as_ref()
    }

    pub fn tax(&self) -> Option<&ExtractedField<Money>> {
        self.tax.as_ref()
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Whether the extraction is good enough to show without asking the
    /// user to confirm it.
    pub fn needs_review(&self) -> bool {
        self.confidence < REVIEW_THRESHOLD
    }
}

const REPLY_MAX_ITEMS: usize = 5;
const REPLY_MAX_ITEM_CHARS: usize = 200;

/// Chat reply body.
impl fmt::Display for ReceiptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not_found = || "Not found".to_string();
        writeln!(f, "Store: {}", self.merchant.as_ref().map_or_else(not_found, |m| m.value.clone()))?;
        writeln!(f, "Date: {}", self.date.as_ref().map_or_else(not_found, |d| d.value.to_string()))?;
        write!(f, "Total: {}", self.total.as_ref().map_or_else(not_found, |t| t.value.to_string()))?;

        if !self.line_items.is_empty() {
            let items = self
                .line_items
                .iter()
                .take(REPLY_MAX_ITEMS)
                .map(|i| format!("{} {}", i.description, i.amount))
                .collect::<Vec<_>>()
                .join("; ");
            let items: String = items.chars().take(REPLY_MAX_ITEM_CHARS).collect();
            write!(f, "\nItems: {items}")?;
        }
        if self.needs_review() {
            write!(f, "\nSome fields could not be read reliably, please check them.")?;
        }
        Ok(())
    }
}
