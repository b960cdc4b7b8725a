//! Rule-based field extractors and normalizers for listing agreements.

pub mod amounts;
pub mod dates;
pub mod fee;
pub mod jurisdiction;
pub mod patterns;
pub mod wallets;
pub mod words;

pub use amounts::{extract_amount_value, normalize_amount, ListingFeeFallback};
pub use dates::{
    format_long_date, normalize_date, normalize_date_with_today, parse_long_date, DateNormalizer,
};
pub use fee::detect_technical_fee;
pub use jurisdiction::{infer_jurisdiction, COUNTRY_KEYWORDS};
pub use patterns::{strip_trailing_note, LabelExtractor, LabelPattern, SignerNameFallback};
pub use wallets::{extract_trading_pair, extract_wallets, TradingPairExtractor, WalletExtractor};
pub use words::number_to_words;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Label or rule that produced the match.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            confidence: self.confidence,
            position: self.position,
            source: self.source,
        }
    }
}

/// Check whether the character before byte offset `pos` is an ASCII word char.
pub(crate) fn preceded_by_word_char(text: &str, pos: usize) -> bool {
    text[..pos]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Byte offset of the character after the one starting at `pos`.
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len(), |c| pos + c.len_utf8())
}
