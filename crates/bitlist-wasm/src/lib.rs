//! WASM bindings for listing-agreement field extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use chrono::NaiveDate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use bitlist_core::ai::{
    offline_suggestion, parse_ai_response, parse_analysis_response, AiConfig,
    BUILTIN_FALLBACK_MODELS,
};
use bitlist_core::render::{render_labeled_text, rules_markdown};
use bitlist_core::store::{diff_records, FieldDiff, OptimizationLogEntry};
use bitlist_core::validation::{date_warning, validate_field};
use bitlist_core::{
    AgreementExtractor, AgreementRecord, ExtractedFields, FieldKey, RegexAgreementParser,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Serialize maps as plain objects rather than JS `Map`s.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js_record(record: JsValue) -> Result<AgreementRecord, JsValue> {
    from_js(record)
}

/// Today's date from the JS clock.
fn js_today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
}

fn default_parser() -> RegexAgreementParser {
    let parser = RegexAgreementParser::new();
    match js_today() {
        Some(today) => parser.with_today(today),
        None => parser,
    }
}

/// Extract agreement fields from text.
///
/// Returns the field map including `includeTechnicalFee`; fields that were
/// not found are omitted.
#[wasm_bindgen]
pub fn extract_fields(text: &str) -> Result<JsValue, JsValue> {
    let result = default_parser().extract(text);
    let mut fields = result.fields;
    fields.include_technical_fee = Some(result.technical_fee);
    to_js(&fields)
}

/// Check a record; returns `{ field: true }` for every invalid field.
#[wasm_bindgen]
pub fn validate_record(record: JsValue) -> Result<JsValue, JsValue> {
    let record = from_js_record(record)?;
    to_js(&bitlist_core::validate_record(&record).to_map())
}

/// Check a single field value. Unknown field names are an error.
#[wasm_bindgen]
pub fn validate_value(field: &str, value: &str) -> Result<bool, JsValue> {
    let key: FieldKey = field
        .parse()
        .map_err(|e: bitlist_core::ExtractionError| JsValue::from_str(&e.to_string()))?;
    Ok(validate_field(key, value))
}

/// Warning text for a past or far-future "Month D, YYYY" date.
#[wasm_bindgen]
pub fn check_date(value: &str) -> Option<String> {
    let today = js_today()?;
    date_warning(value, today).map(|w| w.to_string())
}

/// Whether the technical fee clause applies to this text.
#[wasm_bindgen]
pub fn detect_technical_fee(text: &str) -> bool {
    bitlist_core::detect_technical_fee(text)
}

/// Convert an amount to upper-case English words.
#[wasm_bindgen]
pub fn number_to_words(value: &str) -> String {
    bitlist_core::number_to_words(value)
}

/// Normalize a date to "Month D, YYYY" relative to today.
#[wasm_bindgen]
pub fn normalize_date(raw: &str) -> String {
    match js_today() {
        Some(today) => bitlist_core::normalize_date_with_today(raw, today),
        None => bitlist_core::normalize_date(raw),
    }
}

/// Country inferred from address keywords.
#[wasm_bindgen]
pub fn infer_jurisdiction(address: &str, full_text: &str) -> Option<String> {
    bitlist_core::infer_jurisdiction(address, full_text)
}

/// Extract KYC review fields keyed by snake_case name.
#[wasm_bindgen]
pub fn extract_kyc_fields(text: &str) -> Result<JsValue, JsValue> {
    to_js(&bitlist_core::extract_kyc_fields(text))
}

/// Parse an AI chat reply into agreement fields.
#[wasm_bindgen]
pub fn parse_ai_reply(content: &str) -> Result<JsValue, JsValue> {
    let fields = parse_ai_response(content).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&fields)
}

/// Render a record as labeled text.
#[wasm_bindgen]
pub fn render_record(record: JsValue) -> Result<String, JsValue> {
    let record = from_js_record(record)?;
    Ok(render_labeled_text(&record))
}

/// Markdown document describing the extraction rules.
#[wasm_bindgen]
pub fn export_rules() -> String {
    rules_markdown(&[])
}

/// Rules document followed by the given correction log entries.
#[wasm_bindgen]
pub fn export_rules_with_logs(logs: JsValue) -> Result<String, JsValue> {
    let logs: Vec<OptimizationLogEntry> = from_js(logs)?;
    Ok(rules_markdown(&logs))
}

/// Fields the user changed after extraction, as `{ field, aiValue, userValue }`.
#[wasm_bindgen]
pub fn diff_fields(extracted: JsValue, record: JsValue) -> Result<JsValue, JsValue> {
    let extracted: ExtractedFields = from_js(extracted)?;
    let record = from_js_record(record)?;
    to_js(&diff_records(&extracted, &record))
}

/// Suggestion text stored when no model analysed the corrections.
#[wasm_bindgen]
pub fn correction_fallback_suggestion(diffs: JsValue) -> Result<String, JsValue> {
    let diffs: Vec<FieldDiff> = from_js(diffs)?;
    Ok(offline_suggestion(&diffs))
}

/// Analysis requests for each model in order, primary first.
///
/// The caller tries them in turn until one succeeds.
#[wasm_bindgen]
pub fn analysis_requests(
    api_key: &str,
    base_url: &str,
    model: &str,
    source_text: &str,
    diffs: JsValue,
    current_prompt: &str,
) -> Result<JsValue, JsValue> {
    let diffs: Vec<FieldDiff> = from_js(diffs)?;
    let requests = AiConfig::new(api_key, base_url, model)
        .chain()
        .iter()
        .map(|ai| ai.build_analysis_request(source_text, &diffs, current_prompt))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&requests)
}

/// Parse an analysis reply; returns `{ analysis, suggestion }`.
#[wasm_bindgen]
pub fn parse_analysis_reply(content: &str) -> Result<JsValue, JsValue> {
    #[derive(Serialize)]
    struct Reply<'a> {
        analysis: &'a bitlist_core::ai::PromptAnalysis,
        suggestion: String,
    }

    let analysis =
        parse_analysis_response(content).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&Reply {
        suggestion: analysis.to_suggestion(),
        analysis: &analysis,
    })
}

/// Built-in fallback models tried after the configured one.
#[wasm_bindgen]
pub fn fallback_models() -> Result<JsValue, JsValue> {
    to_js(&BUILTIN_FALLBACK_MODELS)
}

/// Configurable agreement extractor for browser use.
#[wasm_bindgen]
pub struct ListingExtractor {
    parser: RegexAgreementParser,
}

#[wasm_bindgen]
impl ListingExtractor {
    /// Create a new extractor using today's date.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: default_parser(),
        }
    }

    /// Fix the reference date for ambiguous dates.
    #[wasm_bindgen]
    pub fn set_today(&mut self, year: i32, month: u32, day: u32) -> Result<(), JsValue> {
        let today = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| JsValue::from_str("invalid date"))?;
        let parser = std::mem::take(&mut self.parser);
        self.parser = parser.with_today(today);
        Ok(())
    }

    /// Enable or disable keyword and shape fallbacks.
    #[wasm_bindgen]
    pub fn set_fallbacks(&mut self, enabled: bool) {
        let parser = std::mem::take(&mut self.parser);
        self.parser = parser.with_fallbacks(enabled);
    }

    /// Extract fields with sources, warnings and timing.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.extract(text))
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_number_to_words() {
        assert_eq!(number_to_words("90,000"), "NINETY THOUSAND");
        assert_eq!(number_to_words("0"), "");
    }

    #[wasm_bindgen_test]
    fn test_detect_technical_fee() {
        assert!(detect_technical_fee("Listing fee: 10,000 USDT"));
        assert!(!detect_technical_fee("技术费免除"));
    }

    #[wasm_bindgen_test]
    fn test_infer_jurisdiction() {
        assert_eq!(
            infer_jurisdiction("Road Town, Tortola", "").as_deref(),
            Some("British Virgin Islands")
        );
    }

    #[wasm_bindgen_test]
    fn test_validate_value() {
        assert_eq!(validate_value("token", "ADO").ok(), Some(true));
        assert_eq!(validate_value("token", "ado").ok(), Some(false));
        assert!(validate_value("nope", "x").is_err());
    }

    #[wasm_bindgen_test]
    fn test_correction_path() {
        let mut extracted = ExtractedFields::new();
        extracted.token = Some("ADO".to_string());
        let mut record = AgreementRecord::new(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
        record.token = "ADOX".to_string();

        let diffs: Vec<FieldDiff> = from_js(
            diff_fields(to_js(&extracted).unwrap(), to_js(&record).unwrap()).unwrap(),
        )
        .unwrap();
        assert!(diffs.iter().any(|d| d.field == FieldKey::Token && d.user_value == "ADOX"));

        let suggestion = correction_fallback_suggestion(to_js(&diffs).unwrap()).unwrap();
        assert!(suggestion.starts_with("AI analysis unavailable."));

        assert!(analysis_requests("", "", "", "text", to_js(&diffs).unwrap(), "").is_err());
        let requests: Vec<serde_json::Value> = from_js(
            analysis_requests("key", "", "", "text", to_js(&diffs).unwrap(), "").unwrap(),
        )
        .unwrap();
        assert_eq!(requests.len(), 1 + BUILTIN_FALLBACK_MODELS.len());
    }

    #[wasm_bindgen_test]
    fn test_parse_analysis_reply_rejects_text() {
        assert!(parse_analysis_reply("no json here").is_err());
        assert!(parse_analysis_reply(r#"{"summary": "ok"}"#).is_ok());
    }

    #[wasm_bindgen_test]
    fn test_normalize_date_keeps_unknown_text() {
        assert_eq!(normalize_date("sometime soon"), "sometime soon");
        assert_eq!(normalize_date("2026-03-01"), "March 1, 2026");
    }
}
