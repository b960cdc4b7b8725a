//! Fee amount extraction and normalization.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::{
    AMOUNT_MILLIONS, AMOUNT_NUMBER, AMOUNT_THOUSANDS, CURRENCY_TOKEN, LISTING_FEE_CONTEXT,
};
use super::{next_char_boundary, preceded_by_word_char, ExtractionMatch, FieldExtractor};

/// Normalize an amount string to a plain number.
///
/// `"$90k"` becomes `"90000"`, `"$1.5M"` becomes `"1500000"` and
/// `"30,000 USDT"` becomes `"30000"`. Text without a recognizable number is
/// returned with only the currency noise removed.
pub fn normalize_amount(value: &str) -> String {
    let stripped = value.replace(',', "");

    if let Some(caps) = AMOUNT_THOUSANDS.captures(&stripped) {
        if let Some(scaled) = scale(&caps[1], 1_000) {
            return scaled;
        }
    }

    if let Some(caps) = AMOUNT_MILLIONS.captures(&stripped) {
        if let Some(scaled) = scale(&caps[1], 1_000_000) {
            return scaled;
        }
    }

    let without_symbol = stripped.replace('$', "");
    CURRENCY_TOKEN
        .replace_all(&without_symbol, "")
        .trim()
        .to_string()
}

fn scale(number: &str, multiplier: i64) -> Option<String> {
    let amount = Decimal::from_str(number).ok()?;
    let scaled = amount.checked_mul(Decimal::from(multiplier))?;
    Some(
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
    )
}

/// Find the first number in `text` that does not continue a word.
///
/// A trailing k/M multiplier stays attached to the returned slice.
pub fn first_number(text: &str) -> Option<&str> {
    let mut pos = 0;
    while pos < text.len() {
        let found = AMOUNT_NUMBER.find_at(text, pos)?;
        if preceded_by_word_char(text, found.start()) {
            pos = next_char_boundary(text, found.start());
            continue;
        }
        return Some(found.as_str());
    }
    None
}

/// Normalize the value captured after an amount label.
pub fn extract_amount_value(raw: &str) -> String {
    match first_number(raw) {
        Some(number) => normalize_amount(number),
        None => normalize_amount(raw),
    }
}

/// Amount fallback: a number mentioned after "listing fee" in running text.
pub struct ListingFeeFallback;

impl ListingFeeFallback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ListingFeeFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ListingFeeFallback {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        LISTING_FEE_CONTEXT
            .captures_iter(text)
            .filter_map(|caps| {
                let number = caps.get(1)?;
                Some(
                    ExtractionMatch::new(normalize_amount(number.as_str()), 0.7, "listing fee")
                        .with_position(number.start(), number.end()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_amount_suffixes() {
        assert_eq!(normalize_amount("$90k"), "90000");
        assert_eq!(normalize_amount("90K"), "90000");
        assert_eq!(normalize_amount("$1.5M"), "1500000");
        assert_eq!(normalize_amount("2.5k"), "2500");
        assert_eq!(normalize_amount("$1,500k"), "1500000");
    }

    #[test]
    fn test_normalize_amount_rounds_half_up() {
        assert_eq!(normalize_amount("1.0005k"), "1001");
        assert_eq!(normalize_amount("0.0000005M"), "1");
    }

    #[test]
    fn test_normalize_amount_currency() {
        assert_eq!(normalize_amount("30,000 USDT"), "30000");
        assert_eq!(normalize_amount("$30,000"), "30000");
        assert_eq!(normalize_amount("usd 5,000.50"), "5000.50");
        assert_eq!(normalize_amount("5000 MATIC"), "5000 MATIC");
    }

    #[test]
    fn test_first_number_skips_word_digits() {
        assert_eq!(first_number("ERC20 fee 5,000 USDT"), Some("5,000"));
        assert_eq!(first_number("about $90k total"), Some("90k"));
        assert_eq!(first_number("no digits"), None);
    }

    #[test]
    fn test_extract_amount_value() {
        assert_eq!(extract_amount_value("USD 30,000 payable in USDT"), "30000");
        assert_eq!(extract_amount_value("$1.5M"), "1500000");
        assert_eq!(extract_amount_value("TBD"), "TBD");
    }

    #[test]
    fn test_listing_fee_fallback() {
        let fallback = ListingFeeFallback::new();
        let text = "We propose a listing fee of 45,000 USDT payable upfront.";
        assert_eq!(fallback.extract(text).unwrap().value, "45000");

        let text = "The listing fee is waived. Marketing budget 10,000.";
        assert!(fallback.extract(text).is_none());
    }
}
