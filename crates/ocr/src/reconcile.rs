use chrono::NaiveDate;
use slipscan_core::Money;

use crate::types::{ExtractedField, FieldCandidate, FieldValue, LineItem, ReceiptRecord};

/// Which source line wins between equally confident candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TieBreak {
    EarliestLine,
    /// Receipts restate subtotals before the final total, so amounts
    /// favour the last line.
    LatestLine,
}

fn offer<T>(slot: &mut Option<ExtractedField<T>>, value: T, line: usize, confidence: f32, tie: TieBreak) {
    let replace = match slot {
        None => true,
        Some(current) => match confidence.total_cmp(&current.confidence) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => match tie {
                TieBreak::EarliestLine => line < current.line,
                TieBreak::LatestLine => line > current.line,
            },
        },
    };
    if replace {
        *slot = Some(ExtractedField::new(value, confidence, line));
    }
}

/// Merges field candidates into one record.
pub struct Reconciler;

impl Reconciler {
    /// Never fails: no candidates at all gives [`ReceiptRecord::empty`].
    /// The result is independent of candidate order.
    pub fn reconcile(candidates: Vec<FieldCandidate>) -> ReceiptRecord {
        let mut merchant: Option<ExtractedField<String>> = None;
        let mut date: Option<ExtractedField<NaiveDate>> = None;
        let mut total: Option<ExtractedField<Money>> = None;
        let mut subtotal: Option<ExtractedField<Money>> = None;
        let mut tax: Option<ExtractedField<Money>> = None;
        let mut items: Vec<(usize, LineItem)> = Vec::new();

        for FieldCandidate { value, line, confidence } in candidates {
            match value {
                FieldValue::Merchant(name) => {
                    offer(&mut merchant, name, line, confidence, TieBreak::EarliestLine)
                }
                FieldValue::Date(d) => offer(&mut date, d, line, confidence, TieBreak::EarliestLine),
                FieldValue::Total(amount) if !amount.is_negative() => {
                    offer(&mut total, amount, line, confidence, TieBreak::LatestLine)
                }
                FieldValue::Total(_) => {}
                FieldValue::Subtotal(amount) => {
                    offer(&mut subtotal, amount, line, confidence, TieBreak::LatestLine)
                }
                FieldValue::Tax(amount) => offer(&mut tax, amount, line, confidence, TieBreak::LatestLine),
                FieldValue::LineItem(item) if item.discount || !item.amount.is_negative() => {
                    items.push((line, item))
                }
                FieldValue::LineItem(_) => {}
            }
        }

        // Stable: items sharing a line keep their emission order.
        items.sort_by_key(|(line, _)| *line);
        let line_items = items.into_iter().map(|(_, item)| item).collect();

        let present: Vec<f32> = [
            merchant.as_ref().map(|f| f.confidence),
            date.as_ref().map(|f| f.confidence),
            total.as_ref().map(|f| f.confidence),
        ]
        .into_iter()
        .flatten()
        .collect();
        let confidence = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f32>() / present.len() as f32
        };

        ReceiptRecord::new(merchant, date, total, subtotal, tax, line_items, confidence)
    }
}
