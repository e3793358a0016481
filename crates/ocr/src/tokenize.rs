use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Range;
use std::str::FromStr;

/// OCR output as an ordered list of lines. No structure is assumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    lines: Vec<String>,
}

impl RawText {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect() }
    }

    /// Split a text block on `\n`, `\r\n` or a lone `\r`.
    pub fn from_block(text: &str) -> Self {
        Self::from_lines(text.lines().flat_map(|l| l.split('\r')))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Word,
    Number,
    CurrencyAmount,
    DateLike,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token as it appeared on the normalized line.
    pub text: String,
    /// Lower-cased text with wrapping punctuation trimmed; used for matching.
    pub key: String,
    pub kind: TokenKind,
    /// Signed value, set for `CurrencyAmount` tokens only.
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Index of this line in the originating [`RawText`].
    pub index: usize,
    /// Whitespace-collapsed text in its original casing.
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Line {
    /// Token range of the first occurrence of `words` (lower-case keys).
    pub fn find_phrase(&self, words: &[String]) -> Option<Range<usize>> {
        if words.is_empty() || words.len() > self.tokens.len() {
            return None;
        }
        self.tokens
            .windows(words.len())
            .position(|w| w.iter().zip(words).all(|(t, word)| t.key == *word))
            .map(|start| start..start + words.len())
    }

    pub fn contains_any(&self, phrases: &[Vec<String>]) -> bool {
        phrases.iter().any(|p| self.find_phrase(p).is_some())
    }

    pub fn positions_of(&self, kind: TokenKind) -> Vec<usize> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Normalized, classified lines of one receipt. Blank lines are dropped;
/// the rest keep their source index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizedText {
    lines: Vec<Line>,
}

impl TokenizedText {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines.iter().flat_map(|l| l.tokens.iter())
    }
}

/// Split a keyword into lower-case words comparable with [`Token::key`].
pub fn phrase_words(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(str::to_lowercase).collect()
}

const WRAPPING: &[char] = &[',', ';', ':', '(', ')', '[', ']', '{', '}', '|', '*', '"'];

/// Owns the compiled token patterns. Built once per parser.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    currency: Regex,
    date_like: Regex,
    number: Regex,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            currency: Regex::new(
                r"^[$€£¥]?(?P<lead>-)?[$€£¥]?(?P<int>\d{1,3}(?:,\d{3}){1,3}|\d{1,12})[.,](?P<frac>\d{1,2})[$€£¥]?(?P<trail>-)?$",
            )
            .expect("invalid regex"),
            date_like: Regex::new(
                r"^(?:\d{1,4}/\d{1,4}/\d{1,4}|\d{1,4}-\d{1,4}-\d{1,4}|\d{1,4}\.\d{1,4}\.\d{1,4})$",
            )
            .expect("invalid regex"),
            number: Regex::new(r"^\d+(?:[.,]\d+)*$").expect("invalid regex"),
        }
    }

    pub fn tokenize(&self, raw: &RawText) -> TokenizedText {
        let lines = raw
            .lines()
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let text = normalize_line(line);
                if text.is_empty() {
                    return None;
                }
                let tokens = text.split(' ').map(|t| self.classify(t)).collect();
                Some(Line { index, text, tokens })
            })
            .collect();
        TokenizedText { lines }
    }

    fn classify(&self, raw: &str) -> Token {
        let unpunctuated = raw.trim_end_matches([',', ';', ':', '.']);
        let parenthesized = unpunctuated.starts_with('(') && unpunctuated.ends_with(')');
        let core = raw.trim_matches(WRAPPING).trim_end_matches('.');
        let key = if core.is_empty() { raw.to_lowercase() } else { core.to_lowercase() };

        let token = |kind, amount| Token { text: raw.to_string(), key: key.clone(), kind, amount };

        if !raw.chars().any(char::is_alphanumeric) {
            return token(TokenKind::Punctuation, None);
        }
        if let Some(c) = self.currency.captures(core) {
            let int = c["int"].replace(',', "");
            let negative = parenthesized || c.name("lead").is_some() || c.name("trail").is_some();
            if let Ok(value) = Decimal::from_str(&format!("{int}.{}", &c["frac"])) {
                let value = if negative { -value } else { value };
                return token(TokenKind::CurrencyAmount, Some(value));
            }
            return token(TokenKind::Number, None);
        }
        if self.date_like.is_match(core) {
            return token(TokenKind::DateLike, None);
        }
        if self.number.is_match(core) {
            return token(TokenKind::Number, None);
        }
        token(TokenKind::Word, None)
    }
}

fn is_printable(c: char) -> bool {
    !c.is_control() && !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00AD}' | '\u{FFFD}')
}

fn normalize_line(line: &str) -> String {
    let cleaned: String = line
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| is_printable(*c))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
