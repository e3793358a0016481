use chrono::NaiveDate;
use regex::Regex;
use slipscan_core::Money;

use crate::config::{DateOrder, ParserConfig};
use crate::tokenize::{phrase_words, Line, Token, TokenKind, TokenizedText};
use crate::types::{FieldCandidate, FieldValue, LineItem};

// ── Confidence scale ─────────────────────────────────────────────────────────

const MERCHANT_FIRST_LINE: f32 = 0.50;
const MERCHANT_NO_LETTERS: f32 = 0.20;
const MERCHANT_LONGER_ALTERNATIVE: f32 = 0.60;

const DATE_NUMERIC: f32 = 0.70;
const DATE_MONTH_NAME: f32 = 0.80;
const DATE_KEYWORD_BONUS: f32 = 0.20;
const DATE_LATE_PENALTY: f32 = 0.20;

const TOTAL_NEXT_LINE_PENALTY: f32 = 0.10;
const TOTAL_UNANCHORED: f32 = 0.40;
const SUMMARY_AMOUNT: f32 = 0.88;

const LINE_ITEM: f32 = 0.60;

/// One recognizer per receipt field. Implementations own whatever slice of
/// configuration they need and never fail: no match means no candidates.
pub trait FieldExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate>;
}

/// The fixed extractor set, in the order candidates are produced.
pub fn default_extractors(config: &ParserConfig) -> Vec<Box<dyn FieldExtractor>> {
    vec![
        Box::new(MerchantExtractor::new(config)),
        Box::new(DateExtractor::new(config)),
        Box::new(TotalExtractor::new(config)),
        Box::new(SummaryAmountExtractor::subtotal(config)),
        Box::new(SummaryAmountExtractor::tax(config)),
        Box::new(LineItemExtractor::new(config)),
    ]
}

fn phrases(keywords: &[String]) -> Vec<Vec<String>> {
    keywords
        .iter()
        .map(|k| phrase_words(k))
        .filter(|p| !p.is_empty())
        .collect()
}

fn money(token: &Token) -> Option<Money> {
    token.amount.map(Money::from_decimal)
}

fn non_negative(token: &Token) -> Option<Money> {
    money(token).filter(|m| !m.is_negative())
}

/// The non-negative amount closest to the token span `anchor`. On equal
/// distance the amount after the anchor wins.
fn nearest_amount(line: &Line, anchor: std::ops::Range<usize>) -> Option<Money> {
    line.tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| !anchor.contains(i))
        .filter_map(|(i, t)| non_negative(t).map(|m| (i, m)))
        .min_by_key(|(i, _)| {
            if *i >= anchor.end {
                (i - anchor.end, false)
            } else {
                (anchor.start - 1 - i, true)
            }
        })
        .map(|(_, m)| m)
}

fn first_amount(line: &Line) -> Option<Money> {
    line.tokens.iter().find_map(non_negative)
}

// ── Merchant ─────────────────────────────────────────────────────────────────

pub struct MerchantExtractor {
    scan_lines: usize,
    max_chars: usize,
}

impl MerchantExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        Self { scan_lines: config.merchant_scan_lines, max_chars: config.merchant_max_chars }
    }

    fn candidate(&self, line: &Line, confidence: f32) -> FieldCandidate {
        let name: String = line.text.chars().take(self.max_chars).collect();
        FieldCandidate::new(FieldValue::Merchant(name.trim_end().to_string()), line.index, confidence)
    }
}

fn letters_and_spaces(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && text.chars().all(|c| c.is_alphabetic() || c == ' ')
}

impl FieldExtractor for MerchantExtractor {
    fn name(&self) -> &'static str {
        "merchant"
    }

    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate> {
        let Some(first) = doc.lines().first() else {
            return vec![];
        };
        let first_len = first.text.chars().count();
        let first_confidence = if first.text.chars().any(char::is_alphabetic) {
            MERCHANT_FIRST_LINE
        } else {
            MERCHANT_NO_LETTERS
        };

        let mut out = vec![self.candidate(first, first_confidence)];
        for line in doc.lines().iter().take(self.scan_lines).skip(1) {
            if !letters_and_spaces(&line.text) {
                continue;
            }
            let confidence = if line.text.chars().count() > first_len {
                MERCHANT_LONGER_ALTERNATIVE
            } else {
                MERCHANT_FIRST_LINE
            };
            out.push(self.candidate(line, confidence));
        }
        out
    }
}

// ── Date ─────────────────────────────────────────────────────────────────────

pub struct DateExtractor {
    orders: Vec<DateOrder>,
    keywords: Vec<Vec<String>>,
    month_day_year: Regex,
    day_month_year: Regex,
}

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

impl DateExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            orders: config.date_orders.clone(),
            keywords: phrases(&config.date_keywords),
            month_day_year: Regex::new(&format!(r"(?i)\b{MONTH}\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\b"))
                .expect("invalid regex"),
            day_month_year: Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+{MONTH}\.?,?\s+(\d{{4}})\b"))
                .expect("invalid regex"),
        }
    }

    /// Read `a/b/c` under each configured order; the first valid date wins.
    fn parse_numeric(&self, key: &str) -> Option<NaiveDate> {
        let sep = key.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
        let groups: Vec<&str> = key.split(sep).collect();
        let [a, b, c] = groups[..] else {
            return None;
        };
        self.orders.iter().find_map(|order| date_from_groups(*order, [a, b, c]))
    }

    fn month_name_dates(&self, text: &str) -> Vec<NaiveDate> {
        let mdy = self.month_day_year.captures_iter(text).filter_map(|c| {
            let month = month_to_num(c.get(1)?.as_str())?;
            NaiveDate::from_ymd_opt(c.get(3)?.as_str().parse().ok()?, month, c.get(2)?.as_str().parse().ok()?)
        });
        let dmy = self.day_month_year.captures_iter(text).filter_map(|c| {
            let month = month_to_num(c.get(2)?.as_str())?;
            NaiveDate::from_ymd_opt(c.get(3)?.as_str().parse().ok()?, month, c.get(1)?.as_str().parse().ok()?)
        });
        mdy.chain(dmy).collect()
    }
}

impl FieldExtractor for DateExtractor {
    fn name(&self) -> &'static str {
        "date"
    }

    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate> {
        let lines = doc.lines();
        let mut out = Vec::new();

        for (pos, line) in lines.iter().enumerate() {
            let mut found: Vec<(NaiveDate, f32)> = line
                .tokens
                .iter()
                .filter(|t| t.kind == TokenKind::DateLike)
                .filter_map(|t| self.parse_numeric(&t.key))
                .map(|d| (d, DATE_NUMERIC))
                .collect();
            found.extend(self.month_name_dates(&line.text).into_iter().map(|d| (d, DATE_MONTH_NAME)));
            if found.is_empty() {
                continue;
            }

            let near_keyword = line.contains_any(&self.keywords)
                || pos.checked_sub(1).is_some_and(|p| lines[p].contains_any(&self.keywords));
            // Footers often repeat the date; only the first third counts as the header.
            let late = pos * 3 >= lines.len();

            for (date, base) in found {
                let mut confidence = base;
                if near_keyword {
                    confidence += DATE_KEYWORD_BONUS;
                }
                if late {
                    confidence -= DATE_LATE_PENALTY;
                }
                out.push(FieldCandidate::new(FieldValue::Date(date), line.index, confidence));
            }
        }
        out
    }
}

fn date_from_groups(order: DateOrder, [a, b, c]: [&str; 3]) -> Option<NaiveDate> {
    let (y, m, d) = match order {
        DateOrder::DayMonthYear => (c, b, a),
        DateOrder::MonthDayYear => (c, a, b),
        DateOrder::YearMonthDay => (a, b, c),
    };
    if d.len() > 2 || m.len() > 2 || !matches!(y.len(), 2 | 4) {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let year = if y.len() == 2 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
}

fn month_to_num(name: &str) -> Option<u32> {
    let abbr: String = name.chars().take(3).collect::<String>().to_lowercase();
    match abbr.as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

// ── Total ────────────────────────────────────────────────────────────────────

pub struct TotalExtractor {
    /// Most specific (highest confidence) first.
    anchors: Vec<(Vec<String>, f32)>,
    /// Subtotal and discount summaries ("Total Savings") never carry the total.
    excluded: Vec<Vec<String>>,
}

impl TotalExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        let mut anchors: Vec<(Vec<String>, f32)> = config
            .total_anchors
            .iter()
            .map(|a| (phrase_words(&a.phrase), a.confidence))
            .filter(|(p, _)| !p.is_empty())
            .collect();
        anchors.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut excluded = phrases(&config.subtotal_keywords);
        excluded.extend(phrases(&config.discount_keywords));
        Self { anchors, excluded }
    }

    fn best_anchor(&self, line: &Line) -> Option<(std::ops::Range<usize>, f32)> {
        if line.contains_any(&self.excluded) {
            return None;
        }
        self.anchors
            .iter()
            .find_map(|(phrase, confidence)| line.find_phrase(phrase).map(|span| (span, *confidence)))
    }
}

impl FieldExtractor for TotalExtractor {
    fn name(&self) -> &'static str {
        "total"
    }

    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate> {
        let lines = doc.lines();
        let mut out = Vec::new();

        // Every anchor line yields a candidate; the reconciler keeps the last
        // of equally confident ones.
        for (pos, line) in lines.iter().enumerate() {
            let Some((span, confidence)) = self.best_anchor(line) else {
                continue;
            };
            if let Some(amount) = nearest_amount(line, span) {
                out.push(FieldCandidate::new(FieldValue::Total(amount), line.index, confidence));
            } else if let Some((next, amount)) =
                lines.get(pos + 1).and_then(|next| first_amount(next).map(|a| (next, a)))
            {
                out.push(FieldCandidate::new(
                    FieldValue::Total(amount),
                    next.index,
                    confidence - TOTAL_NEXT_LINE_PENALTY,
                ));
            }
        }

        if out.is_empty() {
            // No anchor at all: fall back to the largest amount on the page.
            let largest = lines
                .iter()
                .flat_map(|l| l.tokens.iter().filter_map(non_negative).map(move |m| (m, l.index)))
                .max();
            if let Some((amount, line)) = largest {
                out.push(FieldCandidate::new(FieldValue::Total(amount), line, TOTAL_UNANCHORED));
            }
        }
        out
    }
}

// ── Subtotal / tax ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum SummaryField {
    Subtotal,
    Tax,
}

/// Amounts printed next to a summary keyword such as "subtotal" or "tax".
pub struct SummaryAmountExtractor {
    field: SummaryField,
    keywords: Vec<Vec<String>>,
}

impl SummaryAmountExtractor {
    pub fn subtotal(config: &ParserConfig) -> Self {
        Self { field: SummaryField::Subtotal, keywords: phrases(&config.subtotal_keywords) }
    }

    pub fn tax(config: &ParserConfig) -> Self {
        Self { field: SummaryField::Tax, keywords: phrases(&config.tax_keywords) }
    }
}

impl FieldExtractor for SummaryAmountExtractor {
    fn name(&self) -> &'static str {
        match self.field {
            SummaryField::Subtotal => "subtotal",
            SummaryField::Tax => "tax",
        }
    }

    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate> {
        doc.lines()
            .iter()
            .filter_map(|line| {
                let span = self.keywords.iter().find_map(|k| line.find_phrase(k))?;
                let amount = nearest_amount(line, span)?;
                let value = match self.field {
                    SummaryField::Subtotal => FieldValue::Subtotal(amount),
                    SummaryField::Tax => FieldValue::Tax(amount),
                };
                Some(FieldCandidate::new(value, line.index, SUMMARY_AMOUNT))
            })
            .collect()
    }
}

// ── Line items ───────────────────────────────────────────────────────────────

pub struct LineItemExtractor {
    /// Total anchors plus summary keywords: such lines are never items.
    excluded: Vec<Vec<String>>,
    discount: Vec<Vec<String>>,
}

impl LineItemExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        let mut excluded: Vec<Vec<String>> = config
            .total_anchors
            .iter()
            .map(|a| phrase_words(&a.phrase))
            .filter(|p| !p.is_empty())
            .collect();
        excluded.extend(phrases(&config.subtotal_keywords));
        excluded.extend(phrases(&config.tax_keywords));
        excluded.extend(phrases(&config.excluded_item_keywords));
        Self { excluded, discount: phrases(&config.discount_keywords) }
    }
}

/// Description from the tokens before the amount, without dot leaders or
/// a dangling currency symbol.
fn describe(leading: &[Token]) -> String {
    let end = leading
        .iter()
        .rposition(|t| t.kind != TokenKind::Punctuation)
        .map_or(0, |i| i + 1);
    leading[..end]
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([':', '.', '-', '*'])
        .to_string()
}

impl FieldExtractor for LineItemExtractor {
    fn name(&self) -> &'static str {
        "line_items"
    }

    fn extract(&self, doc: &TokenizedText) -> Vec<FieldCandidate> {
        let mut out = Vec::new();
        for line in doc.lines() {
            if line.contains_any(&self.excluded) {
                continue;
            }
            let [pos] = line.positions_of(TokenKind::CurrencyAmount)[..] else {
                continue;
            };
            let leading = &line.tokens[..pos];
            if !leading.iter().any(|t| t.kind == TokenKind::Word) {
                continue;
            }
            let Some(value) = money(&line.tokens[pos]) else {
                continue;
            };

            let discount = line.contains_any(&self.discount);
            let amount = if discount {
                -value.abs()
            } else if value.is_negative() {
                // A minus sign without a discount label is OCR noise we can't resolve.
                continue;
            } else {
                value
            };

            let description = describe(leading);
            if description.is_empty() {
                continue;
            }
            out.push(FieldCandidate::new(
                FieldValue::LineItem(LineItem { description, amount, discount }),
                line.index,
                LINE_ITEM,
            ));
        }
        out
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnchorKeyword;
    use crate::tokenize::{RawText, Tokenizer};

    fn doc(lines: &[&str]) -> TokenizedText {
        Tokenizer::new().tokenize(&RawText::from_lines(lines.iter().copied()))
    }

    fn run(extractor: &dyn FieldExtractor, lines: &[&str]) -> Vec<FieldCandidate> {
        extractor.extract(&doc(lines))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── Merchant ─────────────────────────────────────────────────────────────

    #[test]
    fn merchant_first_line_keeps_casing() {
        let c = run(&MerchantExtractor::new(&ParserConfig::default()), &["Joe's Diner", "Coffee 3.50"]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, FieldValue::Merchant("Joe's Diner".into()));
        assert!(approx(c[0].confidence, MERCHANT_FIRST_LINE));
    }

    #[test]
    fn merchant_longer_letters_only_line_outranks_first_line() {
        let c = run(
            &MerchantExtractor::new(&ParserConfig::default()),
            &["#1042", "WHOLE FOODS MARKET", "123 Main St"],
        );
        assert_eq!(c.len(), 2);
        assert!(approx(c[0].confidence, MERCHANT_NO_LETTERS));
        assert_eq!(c[1].value, FieldValue::Merchant("WHOLE FOODS MARKET".into()));
        assert!(approx(c[1].confidence, MERCHANT_LONGER_ALTERNATIVE));
    }

    #[test]
    fn merchant_shorter_alternative_gets_equal_confidence() {
        let c = run(
            &MerchantExtractor::new(&ParserConfig::default()),
            &["Welcome to our store", "ACME"],
        );
        assert_eq!(c.len(), 2);
        assert!(approx(c[1].confidence, c[0].confidence));
    }

    #[test]
    fn merchant_alternatives_limited_to_scan_window() {
        let c = run(
            &MerchantExtractor::new(&ParserConfig::default()),
            &["1", "2", "3", "LATE STORE NAME"],
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn merchant_is_truncated() {
        let config = ParserConfig { merchant_max_chars: 5, ..ParserConfig::default() };
        let c = run(&MerchantExtractor::new(&config), &["SUPERMARKET"]);
        assert_eq!(c[0].value, FieldValue::Merchant("SUPER".into()));
    }

    #[test]
    fn merchant_none_on_empty_doc() {
        assert!(run(&MerchantExtractor::new(&ParserConfig::default()), &[]).is_empty());
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    #[test]
    fn date_first_matching_order_wins() {
        let c = run(&DateExtractor::new(&ParserConfig::default()), &["STORE A", "12/05/2023", "x", "y", "z"]);
        assert_eq!(c[0].value, FieldValue::Date(ymd(2023, 12, 5)));
        assert_eq!(c[0].line, 1);
        assert!(approx(c[0].confidence, DATE_NUMERIC));
    }

    #[test]
    fn date_falls_through_invalid_orders() {
        // 25 cannot be a month, so month-day-year fails and day-month-year applies.
        let c = run(&DateExtractor::new(&ParserConfig::default()), &["25/12/2023"]);
        assert_eq!(c[0].value, FieldValue::Date(ymd(2023, 12, 25)));
        let c = run(&DateExtractor::new(&ParserConfig::default()), &["2024-03-15"]);
        assert_eq!(c[0].value, FieldValue::Date(ymd(2024, 3, 15)));
    }

    #[test]
    fn date_order_is_configurable() {
        let config = ParserConfig {
            date_orders: vec![DateOrder::DayMonthYear],
            ..ParserConfig::default()
        };
        let c = run(&DateExtractor::new(&config), &["12/05/2023"]);
        assert_eq!(c[0].value, FieldValue::Date(ymd(2023, 5, 12)));
    }

    #[test]
    fn date_two_digit_year_expands() {
        let c = run(&DateExtractor::new(&ParserConfig::default()), &["03.15.24"]);
        assert_eq!(c[0].value, FieldValue::Date(ymd(2024, 3, 15)));
    }

    #[test]
    fn date_unparseable_token_is_dropped() {
        assert!(run(&DateExtractor::new(&ParserConfig::default()), &["99/99/9999", "1/2/345"]).is_empty());
    }

    #[test]
    fn date_keyword_raises_confidence() {
        let c = run(
            &DateExtractor::new(&ParserConfig::default()),
            &["Date:", "01/15/2024", "a", "b", "c", "d"],
        );
        assert!(approx(c[0].confidence, DATE_NUMERIC + DATE_KEYWORD_BONUS));
        let c = run(
            &DateExtractor::new(&ParserConfig::default()),
            &["Date: 01/15/2024", "a", "b", "c"],
        );
        assert!(approx(c[0].confidence, DATE_NUMERIC + DATE_KEYWORD_BONUS));
    }

    #[test]
    fn date_in_footer_is_penalised() {
        let c = run(
            &DateExtractor::new(&ParserConfig::default()),
            &["STORE", "Item 1.00", "Total 1.00", "01/15/2024"],
        );
        assert!(approx(c[0].confidence, DATE_NUMERIC - DATE_LATE_PENALTY));
    }

    #[test]
    fn date_month_names() {
        let c = run(
            &DateExtractor::new(&ParserConfig::default()),
            &["WHOLE FOODS", "March 15, 2024", "15 Jan 2024", "x", "y", "z"],
        );
        assert_eq!(c[0].value, FieldValue::Date(ymd(2024, 3, 15)));
        assert!(approx(c[0].confidence, DATE_MONTH_NAME));
        assert_eq!(c[1].value, FieldValue::Date(ymd(2024, 1, 15)));
    }

    // ── Total ────────────────────────────────────────────────────────────────

    #[test]
    fn total_anchor_specificity() {
        let e = TotalExtractor::new(&ParserConfig::default());
        let grand = run(&e, &["Grand Total 15.00"]);
        let plain = run(&e, &["Total 15.00"]);
        let bare = run(&e, &["Coffee 15.00"]);
        assert!(grand[0].confidence > plain[0].confidence);
        assert!(plain[0].confidence > bare[0].confidence);
        assert!(approx(bare[0].confidence, TOTAL_UNANCHORED));
    }

    #[test]
    fn total_emits_every_anchor_line() {
        let c = run(&TotalExtractor::new(&ParserConfig::default()), &["Total 10.00", "Total 12.00"]);
        let values: Vec<_> = c.iter().map(|c| (c.value.clone(), c.line)).collect();
        assert_eq!(
            values,
            vec![
                (FieldValue::Total(Money::from_cents(1000)), 0),
                (FieldValue::Total(Money::from_cents(1200)), 1),
            ]
        );
    }

    #[test]
    fn total_case_insensitive_anchor() {
        let c = run(&TotalExtractor::new(&ParserConfig::default()), &["AMOUNT DUE: $42.10"]);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(4210)));
        assert!(approx(c[0].confidence, 0.90));
    }

    #[test]
    fn total_prefers_amount_nearest_anchor() {
        let c = run(&TotalExtractor::new(&ParserConfig::default()), &["3 items 1.00 Total 9.99 USD"]);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(999)));
    }

    #[test]
    fn total_reads_following_line() {
        let c = run(&TotalExtractor::new(&ParserConfig::default()), &["TOTAL", "$ 8.40", "Thanks"]);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(840)));
        assert_eq!(c[0].line, 1);
        assert!(approx(c[0].confidence, 0.85 - TOTAL_NEXT_LINE_PENALTY));
    }

    #[test]
    fn total_skips_subtotal_and_negative_amounts() {
        let c = run(
            &TotalExtractor::new(&ParserConfig::default()),
            &["Sub Total 14.00", "Total -2.00 16.20"],
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(1620)));
    }

    #[test]
    fn total_skips_discount_summary_lines() {
        let c = run(
            &TotalExtractor::new(&ParserConfig::default()),
            &["Total 15.00", "Total Savings 2.00", "Coupon Total 1.00"],
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(1500)));
    }

    #[test]
    fn balance_due_ranks_below_total() {
        let e = TotalExtractor::new(&ParserConfig::default());
        let total = run(&e, &["Total 3.50"]);
        let balance = run(&e, &["Balance Due 0.00"]);
        assert!(total[0].confidence > balance[0].confidence);
    }

    #[test]
    fn total_fallback_uses_largest_amount() {
        let c = run(&TotalExtractor::new(&ParserConfig::default()), &["STORE", "$5.00", "$3.00", "$8.00"]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(800)));
        assert_eq!(c[0].line, 3);
    }

    #[test]
    fn total_custom_anchors() {
        let config = ParserConfig {
            total_anchors: vec![AnchorKeyword::new("importe", 0.8)],
            ..ParserConfig::default()
        };
        let c = run(&TotalExtractor::new(&config), &["IMPORTE 7,50"]);
        assert_eq!(c[0].value, FieldValue::Total(Money::from_cents(750)));
        assert!(approx(c[0].confidence, 0.8));
    }

    #[test]
    fn total_none_without_amounts() {
        assert!(run(&TotalExtractor::new(&ParserConfig::default()), &["Total", "thank you"]).is_empty());
    }

    // ── Subtotal / tax ───────────────────────────────────────────────────────

    #[test]
    fn subtotal_and_tax() {
        let lines = ["STORE", "Subtotal $45.00", "Sales Tax 8% $3.60", "Total $48.60"];
        let sub = run(&SummaryAmountExtractor::subtotal(&ParserConfig::default()), &lines);
        let tax = run(&SummaryAmountExtractor::tax(&ParserConfig::default()), &lines);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].value, FieldValue::Subtotal(Money::from_cents(4500)));
        assert_eq!(tax.len(), 1);
        assert_eq!(tax[0].value, FieldValue::Tax(Money::from_cents(360)));
    }

    // ── Line items ───────────────────────────────────────────────────────────

    fn items(lines: &[&str]) -> Vec<LineItem> {
        run(&LineItemExtractor::new(&ParserConfig::default()), lines)
            .into_iter()
            .filter_map(|c| match c.value {
                FieldValue::LineItem(item) => Some(item),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn line_items_pair_description_and_amount() {
        let found = items(&["Joe's Diner", "Coffee  3.50", "Total   3.50"]);
        assert_eq!(
            found,
            vec![LineItem { description: "Coffee".into(), amount: Money::from_cents(350), discount: false }]
        );
    }

    #[test]
    fn line_items_need_exactly_one_amount_and_a_word() {
        let found = items(&["2 x 3.50 7.00", "12/05/2023 4.00", "Bagel 2.25", "Muffin"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Bagel");
    }

    #[test]
    fn line_items_exclude_summary_lines() {
        let found = items(&["Milk 2.00", "Subtotal 2.00", "Tax 0.10", "Cash 5.00", "Change 2.90", "Balance 2.10"]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn line_items_strip_leaders_and_symbols() {
        let found = items(&["Tea .......... $ 2.10"]);
        assert_eq!(found[0].description, "Tea");
        assert_eq!(found[0].amount, Money::from_cents(210));
    }

    #[test]
    fn line_items_discounts_are_negative_and_flagged() {
        let found = items(&["Coupon 1.00", "Member discount -0.50", "Bread -2.00"]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|i| i.discount && i.amount.is_negative()));
        assert_eq!(found[0].amount, Money::from_cents(-100));
        assert_eq!(found[1].amount, Money::from_cents(-50));
    }

    #[test]
    fn extractors_tolerate_empty_documents() {
        let config = ParserConfig::default();
        for extractor in default_extractors(&config) {
            assert!(run(extractor.as_ref(), &[]).is_empty(), "{} emitted candidates", extractor.name());
        }
    }
}
