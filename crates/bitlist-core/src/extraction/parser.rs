//! Rule-based agreement parser: label patterns, normalizers and fallbacks.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::agreement::{ExtractedFields, FieldKey};
use crate::models::config::ExtractionConfig;

use super::rules::{
    amounts::extract_amount_value, detect_technical_fee, infer_jurisdiction, DateNormalizer,
    ExtractionMatch, FieldExtractor, LabelExtractor, ListingFeeFallback, SignerNameFallback,
    TradingPairExtractor, WalletExtractor,
};
use super::AgreementExtractor;

/// Result of agreement extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted fields.
    pub fields: ExtractedFields,
    /// Label or fallback that produced each field.
    pub sources: BTreeMap<FieldKey, String>,
    /// Whether the technical fee clause applies.
    pub technical_fee: bool,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Agreement parser built on ordered label patterns.
pub struct RegexAgreementParser {
    /// Reference date for ambiguous numeric dates (system clock when unset).
    today: Option<NaiveDate>,
    /// Whether to apply keyword and shape fallbacks.
    use_fallbacks: bool,
    /// Whether waiver wording clears the technical fee.
    detect_fee_waiver: bool,
}

impl RegexAgreementParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self {
            today: None,
            use_fallbacks: true,
            detect_fee_waiver: true,
        }
    }

    /// Create a parser from the extraction config section.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            today: config.today,
            use_fallbacks: config.use_fallbacks,
            detect_fee_waiver: config.detect_fee_waiver,
        }
    }

    /// Fix the reference date used for date disambiguation.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Enable or disable fallbacks.
    pub fn with_fallbacks(mut self, enabled: bool) -> Self {
        self.use_fallbacks = enabled;
        self
    }

    fn date_normalizer(&self) -> DateNormalizer {
        self.today.map(DateNormalizer::new).unwrap_or_default()
    }

    /// Per-field post-processing of a cleaned label value.
    fn normalize(&self, key: FieldKey, value: &str, dates: &DateNormalizer) -> String {
        match key {
            FieldKey::Amount | FieldKey::MarketingAmount => extract_amount_value(value),
            FieldKey::SignDate | FieldKey::ListingDate => dates.normalize(value),
            FieldKey::Token => normalize_token(value),
            FieldKey::AmountInWords | FieldKey::MarketingInWords => value.to_uppercase(),
            _ => value.to_string(),
        }
    }

    /// First label match whose normalized value is non-empty.
    fn extract_labeled(
        &self,
        key: FieldKey,
        text: &str,
        dates: &DateNormalizer,
    ) -> Option<ExtractionMatch<String>> {
        LabelExtractor::new(key)
            .extract_all(text)
            .into_iter()
            .map(|m| {
                let normalized = self.normalize(key, &m.value, dates);
                m.map(|_| normalized)
            })
            .find(|m| !m.value.is_empty())
    }

    fn fallback(
        &self,
        key: FieldKey,
        text: &str,
        fields: &ExtractedFields,
    ) -> Option<ExtractionMatch<String>> {
        match key {
            FieldKey::SignName => SignerNameFallback::new().extract(text),
            FieldKey::Jurisdiction => {
                let address = fields.get(FieldKey::Address).unwrap_or_default();
                infer_jurisdiction(address, text)
                    .map(|country| ExtractionMatch::new(country, 0.5, "country keyword"))
            }
            FieldKey::Amount => ListingFeeFallback::new().extract(text),
            FieldKey::TradingPair => TradingPairExtractor::new().extract(text),
            FieldKey::Wallets => WalletExtractor::new().extract(text),
            _ => None,
        }
    }
}

impl Default for RegexAgreementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AgreementExtractor for RegexAgreementParser {
    fn extract(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let dates = self.date_normalizer();
        let mut fields = ExtractedFields::new();
        let mut sources = BTreeMap::new();

        info!("Extracting agreement fields from {} characters of text", text.len());

        for key in FieldKey::ALL {
            if let Some(found) = self.extract_labeled(key, text, &dates) {
                debug!("{key} matched label {:?}", found.source);
                sources.insert(key, found.source);
                fields.set(key, found.value);
            }
        }

        // Fallbacks run after all labels so the jurisdiction search sees the address
        if self.use_fallbacks {
            for key in FieldKey::ALL {
                if fields.has(key) {
                    continue;
                }
                if let Some(found) = self.fallback(key, text, &fields) {
                    debug!("{key} filled by fallback {:?}", found.source);
                    sources.insert(key, found.source);
                    fields.set(key, found.value);
                }
            }
        }

        let warnings: Vec<String> = fields
            .missing()
            .into_iter()
            .map(|key| format!("Could not extract {}", key.description()))
            .collect();

        let technical_fee = !self.detect_fee_waiver || detect_technical_fee(text);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted {} fields ({} missing) in {}ms",
            fields.len(),
            warnings.len(),
            processing_time_ms
        );

        ExtractionResult {
            fields,
            sources,
            technical_fee,
            warnings,
            processing_time_ms,
        }
    }
}

/// Canonical token symbol: quotes and parentheses removed, first word, uppercase.
fn normalize_token(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '(' | ')'))
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == ',' || c == '/')
        .find(|part| !part.is_empty())
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::patterns::FIELD_LABELS;
    use crate::models::agreement::AgreementRecord;
    use crate::render::render_labeled_text;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
    }

    fn parser() -> RegexAgreementParser {
        RegexAgreementParser::new().with_today(today())
    }

    const SAMPLE_EMAIL: &str = "\
Hi team, please find our details below.

1. Company Name: Ado Network SRL
2. Registered Address: Str. Exemplu 12, Bucuresti, Romania
3. Token Ticker: \"ado\"
4. Listing Fee Amount: $90k (inclusive of VAT)
5. Latest Listing Date: 11/2/26
6. Signer Name: Andrei Popescu
7. Marketing Fee: 30,000 USDT
8. Trading Pair: ADO/USDT
Wallet Address: 0x52908400098527886E0F7030069857D2E4169EE7
";

    #[test]
    fn test_extract_sample_email() {
        let result = parser().extract(SAMPLE_EMAIL);
        let fields = &result.fields;

        assert_eq!(fields.get(FieldKey::Company), Some("Ado Network SRL"));
        assert_eq!(
            fields.get(FieldKey::Address),
            Some("Str. Exemplu 12, Bucuresti, Romania")
        );
        assert_eq!(fields.get(FieldKey::Token), Some("ADO"));
        assert_eq!(fields.get(FieldKey::Amount), Some("90000"));
        assert_eq!(fields.get(FieldKey::ListingDate), Some("November 2, 2026"));
        assert_eq!(fields.get(FieldKey::SignName), Some("Andrei Popescu"));
        assert_eq!(fields.get(FieldKey::MarketingAmount), Some("30000"));
        assert_eq!(fields.get(FieldKey::TradingPair), Some("ADO/USDT"));
        assert_eq!(
            fields.get(FieldKey::Wallets),
            Some("0x52908400098527886E0F7030069857D2E4169EE7")
        );
        // Inferred from the address
        assert_eq!(fields.get(FieldKey::Jurisdiction), Some("Romania"));
        assert_eq!(result.sources[&FieldKey::Jurisdiction], "country keyword");
        assert!(result.technical_fee);
    }

    #[test]
    fn test_chinese_labels() {
        let text = "公司名称：某某科技有限公司\n注册地址：新加坡\n代币名称：abc\n上市费用：50,000 USDT\n上线日期：2026-03-01\n签署人：王伟";
        let fields = parser().extract_fields(text);
        assert_eq!(fields.get(FieldKey::Company), Some("某某科技有限公司"));
        assert_eq!(fields.get(FieldKey::Address), Some("新加坡"));
        assert_eq!(fields.get(FieldKey::Token), Some("ABC"));
        assert_eq!(fields.get(FieldKey::Amount), Some("50000"));
        assert_eq!(fields.get(FieldKey::ListingDate), Some("March 1, 2026"));
        assert_eq!(fields.get(FieldKey::SignName), Some("王伟"));
    }

    #[test]
    fn test_every_label_variant_extracts_its_field() {
        // Each label on its own line maps to its field
        for (key, labels) in FIELD_LABELS {
            for label in *labels {
                let literal = label
                    .replace(r"\s*", " ")
                    .replace("(?:fee )?", "")
                    .replace("(?:es)?", "")
                    .replace("s?", "")
                    .replace("[/／]", "/")
                    .replace(r"\(", "(")
                    .replace(r"\)", ")");
                let (value, expected) = match key {
                    FieldKey::SignDate | FieldKey::ListingDate => ("2026-03-01", "March 1, 2026"),
                    FieldKey::Amount | FieldKey::MarketingAmount => ("5,000", "5000"),
                    _ => ("VALUE", "VALUE"),
                };
                let text = format!("{literal}: {value}");
                let fields = parser().with_fallbacks(false).extract_fields(&text);
                assert_eq!(fields.get(*key), Some(expected), "label {label:?}");
            }
        }
    }

    #[test]
    fn test_pattern_precedence_uses_declared_order() {
        let text = "Date: 2026-01-05\nAgreement Date: 2026-02-20";
        let fields = parser().extract_fields(text);
        assert_eq!(fields.get(FieldKey::SignDate), Some("February 20, 2026"));
    }

    #[test]
    fn test_fallbacks() {
        let text = "Our company is registered in Tortola.\n\
                    We accept a listing fee of 45,000 USDT.\n\
                    Contact Name: Jane Doe\n\
                    Pair XYZ / USDT please.\n\
                    TRC20 TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7";
        let fields = parser().extract_fields(text);
        assert_eq!(fields.get(FieldKey::Jurisdiction), Some("British Virgin Islands"));
        assert_eq!(fields.get(FieldKey::Amount), Some("45000"));
        assert_eq!(fields.get(FieldKey::SignName), Some("Jane Doe"));
        assert_eq!(fields.get(FieldKey::TradingPair), Some("XYZ/USDT"));
        assert_eq!(
            fields.get(FieldKey::Wallets),
            Some("TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7")
        );
    }

    #[test]
    fn test_labels_inside_sentences_are_not_fields() {
        let text = "We confirm the Company Name: Acme Ltd and the Token Ticker: ACME.";
        let fields = parser().with_fallbacks(false).extract_fields(text);
        assert_eq!(fields.get(FieldKey::Company), None);
        assert_eq!(fields.get(FieldKey::Token), None);

        let text = "We confirm:\nCompany Name: Acme Ltd\nToken Ticker: ACME";
        let fields = parser().with_fallbacks(false).extract_fields(text);
        assert_eq!(fields.get(FieldKey::Company), Some("Acme Ltd"));
        assert_eq!(fields.get(FieldKey::Token), Some("ACME"));
    }

    #[test]
    fn test_fallbacks_disabled() {
        let text = "Registered in Tortola. Pair XYZ/USDT.";
        let fields = parser().with_fallbacks(false).extract_fields(text);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_unmatched_fields_are_absent() {
        let result = parser().extract("Nothing useful here.");
        assert!(result.fields.is_empty());
        assert_eq!(result.warnings.len(), FieldKey::ALL.len());
    }

    #[test]
    fn test_token_normalization() {
        assert_eq!(normalize_token("\"ado\" (Ado Network)"), "ADO");
        assert_eq!(normalize_token("btc/usdt"), "BTC");
        assert_eq!(normalize_token("' eth, erc20"), "ETH");
    }

    #[test]
    fn test_words_uppercased() {
        let fields = parser().extract_fields("Amount in words: ninety thousand");
        assert_eq!(fields.get(FieldKey::AmountInWords), Some("NINETY THOUSAND"));
    }

    #[test]
    fn test_waiver_sets_technical_fee() {
        let result = parser().extract("We agree to waive the technical fee.");
        assert!(!result.technical_fee);

        let config = ExtractionConfig {
            detect_fee_waiver: false,
            ..ExtractionConfig::default()
        };
        let result = RegexAgreementParser::from_config(&config)
            .extract("We agree to waive the technical fee.");
        assert!(result.technical_fee);
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let first = parser().extract_fields(SAMPLE_EMAIL);

        let mut record = AgreementRecord::new(today());
        record.merge(&first);
        let rendered = render_labeled_text(&record);
        let second = parser().extract_fields(&rendered);

        for key in FieldKey::ALL {
            if key == FieldKey::SignDate {
                continue;
            }
            assert_eq!(second.get(key), first.get(key), "field {key}");
        }
        assert_eq!(second.get(FieldKey::SignDate), Some("February 13, 2026"));
    }

    #[test]
    fn test_round_trip_multiple_wallets() {
        let text = "Wallet: 0x52908400098527886E0F7030069857D2E4169EE7\n\
                    Deposit: TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7";
        let mut record = AgreementRecord::new(today());
        record.set(
            FieldKey::Wallets,
            "0x52908400098527886E0F7030069857D2E4169EE7\nTLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7",
        );
        let rendered = render_labeled_text(&record);
        let fields = parser().extract_fields(&rendered);
        assert_eq!(fields.get(FieldKey::Wallets), Some(record.wallets.as_str()));

        let fields = parser().extract_fields(text);
        assert_eq!(
            fields.get(FieldKey::Wallets),
            Some("0x52908400098527886E0F7030069857D2E4169EE7")
        );
    }
}
