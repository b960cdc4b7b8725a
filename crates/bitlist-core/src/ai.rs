//! LLM-assisted extraction: prompt, request shape and response parsing.
//!
//! Transport is left to the caller. This module only builds the request and
//! turns the model's reply into the same [`ExtractedFields`] the regex path
//! produces, so either source can populate a record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::agreement::{ExtractedFields, FieldKey};
use crate::models::config::AiSettings;
use crate::store::FieldDiff;

/// Built-in system prompt for agreement extraction.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert legal document analyzer specializing in crypto listing agreements. Extract the following fields from the email/contract text into JSON format.

Fields to extract:
- company: Company Name (the project's legal entity name, e.g. "Ado Network SRL", "BitDAO Ltd.")
- jurisdiction: Jurisdiction / Country of incorporation. If not explicitly stated, infer it from the registered address, the company name suffix (e.g. "SRL" means Romania, "Pte. Ltd." means Singapore) or any country mentioned in the text.
- address: Registered Address (full address string)
- listingdate: Listing Date / Latest Listing Date (format: Month D, YYYY, e.g. "February 26, 2026")
- amount: Listing Fee Amount (number only, no currency symbol, no commas)
- amountInWords: Listing Fee Amount in English words (ALL CAPS, e.g. "TEN THOUSAND")
- token: Token Symbol/Ticker (uppercase, e.g. "ADO", "BTC")
- signdate: Agreement Sign Date (format: Month D, YYYY)
- signname: Signer Full Name
- marketingamount: Marketing/Promotional Fee Amount (number only)
- marketinginwords: Marketing Fee in English words (ALL CAPS, e.g. "NINETY THOUSAND")
- tradingpair: Trading Pair (e.g. "ADO/USDT")
- wallets: Wallet Addresses (all addresses as a single string, preserve line breaks)

Rules:
1. Never leave jurisdiction empty when an address is present.
2. Convert every date to "Month D, YYYY". For ambiguous numeric dates prefer the reading that lies in the near future.
3. Amounts are plain numbers: "$90k" and "$90,000" both become "90000".
4. amountInWords and marketinginwords are ALL CAPS English words.
5. If a field cannot be determined, return an empty string.

Return ONLY raw JSON, no markdown, no explanation."#;

/// System prompt for explaining user corrections of an extraction.
pub const DIFF_ANALYSIS_PROMPT: &str = r#"You are an AI prompt optimization assistant. I will give you:
1. The original email text
2. A list of fields where the AI extraction got it wrong (AI value vs User's corrected value)
3. Optionally, the extraction prompt currently in use

For each diff, analyze WHY the AI might have extracted incorrectly and suggest how to improve the extraction prompt or regex rules.

Return JSON format:
{
  "suggestions": [
    {
      "field": "fieldName",
      "issue": "brief description of what went wrong",
      "fix": "specific suggestion to improve extraction"
    }
  ],
  "summary": "one-line overall summary"
}

Return ONLY raw JSON, no markdown."#;

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20240620";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Characters of source text sent along with a correction analysis.
const ANALYSIS_SNIPPET_CHARS: usize = 500;

const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A model tried after the configured one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FallbackModel {
    pub model: &'static str,
    pub base_url: &'static str,
    pub label: &'static str,
}

/// Built-in models, in the order they are tried.
pub const BUILTIN_FALLBACK_MODELS: &[FallbackModel] = &[
    FallbackModel {
        model: "gemini-2.5-pro",
        base_url: GEMINI_OPENAI_BASE_URL,
        label: "Gemini 2.5 Pro",
    },
    FallbackModel {
        model: "gemini-2.5-flash",
        base_url: GEMINI_OPENAI_BASE_URL,
        label: "Gemini 2.5 Flash",
    },
    FallbackModel {
        model: "gemini-2.0-flash",
        base_url: GEMINI_OPENAI_BASE_URL,
        label: "Gemini 2.0 Flash",
    },
];

/// Chat API flavor, chosen from the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAiCompatible,
}

/// Connection settings for an LLM endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Models tried in order after this one, with the same API key.
    pub fallbacks: Vec<FallbackModel>,
}

/// A fully described HTTP request, ready for any client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            fallbacks: BUILTIN_FALLBACK_MODELS.to_vec(),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: Vec<FallbackModel>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// This endpoint followed by each fallback model, in order.
    ///
    /// Every entry shares the API key. A fallback that repeats an earlier
    /// endpoint and model is skipped.
    pub fn chain(&self) -> Vec<AiConfig> {
        let mut chain = vec![AiConfig {
            fallbacks: Vec::new(),
            ..self.clone()
        }];
        for fallback in &self.fallbacks {
            let candidate = AiConfig {
                api_key: self.api_key.clone(),
                base_url: fallback.base_url.to_string(),
                model: fallback.model.to_string(),
                fallbacks: Vec::new(),
            };
            let seen = chain.iter().any(|c| {
                c.endpoint() == candidate.endpoint()
                    && c.model_or_default() == candidate.model_or_default()
            });
            if !seen {
                chain.push(candidate);
            }
        }
        chain
    }

    fn model_or_default(&self) -> &str {
        match (self.model.is_empty(), self.provider()) {
            (false, _) => &self.model,
            (true, Provider::Anthropic) => DEFAULT_ANTHROPIC_MODEL,
            (true, Provider::OpenAiCompatible) => "gpt-4o",
        }
    }

    fn clean_base_url(&self) -> &str {
        let base = if self.base_url.trim().is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.base_url.trim()
        };
        base.trim_end_matches('/')
    }

    pub fn provider(&self) -> Provider {
        if self.clean_base_url().contains("anthropic") {
            Provider::Anthropic
        } else {
            Provider::OpenAiCompatible
        }
    }

    /// Full request URL for the configured provider.
    pub fn endpoint(&self) -> String {
        match self.provider() {
            Provider::Anthropic => format!("{}/v1/messages", self.clean_base_url()),
            Provider::OpenAiCompatible => format!("{}/chat/completions", self.clean_base_url()),
        }
    }

    /// Build the extraction request for `text`.
    pub fn build_request(&self, system_prompt: &str, text: &str) -> Result<AiRequest, ExtractionError> {
        self.chat_request(system_prompt, &format!("Text:\n{text}"))
    }

    /// Build the request asking why the user corrected these fields.
    ///
    /// The source text is cut to its first 500 characters. A non-empty
    /// `current_prompt` is sent along so suggestions can refer to it.
    pub fn build_analysis_request(
        &self,
        source_text: &str,
        diffs: &[FieldDiff],
        current_prompt: &str,
    ) -> Result<AiRequest, ExtractionError> {
        if diffs.is_empty() {
            return Err(ExtractionError::NoCorrections);
        }
        let snippet: String = source_text.chars().take(ANALYSIS_SNIPPET_CHARS).collect();
        let mut user_prompt = format!(
            "Email text (first {ANALYSIS_SNIPPET_CHARS} chars):\n{snippet}\n\nDiffs:\n{}",
            format_diffs(diffs)
        );
        if !current_prompt.trim().is_empty() {
            user_prompt.push_str(&format!(
                "\n\nCurrent extraction prompt:\n{}",
                current_prompt.trim()
            ));
        }
        debug!("Built analysis request for {} diff(s)", diffs.len());
        self.chat_request(DIFF_ANALYSIS_PROMPT, &user_prompt)
    }

    fn chat_request(&self, system_prompt: &str, user_prompt: &str) -> Result<AiRequest, ExtractionError> {
        if self.api_key.trim().is_empty() {
            return Err(ExtractionError::MissingApiKey);
        }

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        let body = match self.provider() {
            Provider::Anthropic => {
                headers.push(("x-api-key".to_string(), self.api_key.clone()));
                headers.push(("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()));
                let model = self.model_or_default();
                json!({
                    "model": model,
                    "max_tokens": 4096,
                    "system": system_prompt,
                    "messages": [{ "role": "user", "content": user_prompt }],
                })
            }
            Provider::OpenAiCompatible => {
                headers.push(("Authorization".to_string(), format!("Bearer {}", self.api_key)));
                let model = self.model_or_default();
                let mut body = json!({
                    "model": model,
                    "messages": [
                        { "role": "system", "content": system_prompt },
                        { "role": "user", "content": user_prompt },
                    ],
                    "temperature": 0.1,
                });
                let base = self.clean_base_url();
                if base.contains("openai.com")
                    || base.contains("gemini")
                    || base.contains("generativelanguage.googleapis.com")
                {
                    body["response_format"] = json!({ "type": "json_object" });
                }
                body
            }
        };

        Ok(AiRequest {
            url: self.endpoint(),
            headers,
            body,
        })
    }

    /// Pull the assistant text out of a provider response body.
    pub fn response_content<'a>(&self, response: &'a Value) -> Option<&'a str> {
        match self.provider() {
            Provider::Anthropic => response["content"][0]["text"].as_str(),
            Provider::OpenAiCompatible => response["choices"][0]["message"]["content"].as_str(),
        }
    }
}

impl From<&AiSettings> for AiConfig {
    fn from(settings: &AiSettings) -> Self {
        Self::new(&settings.api_key, &settings.base_url, &settings.model)
    }
}

/// Parse the model's reply into extracted fields.
///
/// Markdown code fences are removed. Unknown keys are ignored, numbers and
/// booleans are stringified, and empty strings count as absent.
pub fn parse_ai_response(content: &str) -> Result<ExtractedFields, ExtractionError> {
    let map = parse_object(content)?;
    Ok(fields_from_map(&map))
}

/// Fence-stripped JSON object from a model reply.
fn parse_object(content: &str) -> Result<Map<String, Value>, ExtractionError> {
    let cleaned = content.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim())
        .map_err(|e| ExtractionError::InvalidAiResponse(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractionError::NotAnObject),
    }
}

/// One field-level suggestion from a correction analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSuggestion {
    pub field: String,
    pub issue: String,
    pub fix: String,
}

/// The model's explanation of a set of corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptAnalysis {
    pub suggestions: Vec<PromptSuggestion>,
    pub summary: String,
}

impl PromptAnalysis {
    /// Pretty JSON stored as the suggestion of a correction log entry.
    pub fn to_suggestion(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.summary.clone())
    }
}

/// Parse the reply to an analysis request.
pub fn parse_analysis_response(content: &str) -> Result<PromptAnalysis, ExtractionError> {
    let map = parse_object(content)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ExtractionError::InvalidAiResponse(e.to_string()))
}

/// One line per diff: `- token: AI="ADO" → User corrected to="ADOX"`.
pub fn format_diffs(diffs: &[FieldDiff]) -> String {
    diffs
        .iter()
        .map(|d| {
            format!(
                "- {}: AI=\"{}\" → User corrected to=\"{}\"",
                d.field, d.ai_value, d.user_value
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Suggestion text used when no model analysis is available.
pub fn offline_suggestion(diffs: &[FieldDiff]) -> String {
    if diffs.is_empty() {
        return String::new();
    }
    format!("AI analysis unavailable. Diffs:\n{}", format_diffs(diffs))
}

fn fields_from_map(map: &Map<String, Value>) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    for (name, value) in map {
        if name == "includeTechnicalFee" {
            fields.include_technical_fee = value.as_bool();
            continue;
        }
        let Ok(key) = name.parse::<FieldKey>() else {
            warn!("Ignoring unknown field {name:?} in AI response");
            continue;
        };
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        if !text.is_empty() {
            fields.set(key, text);
        }
    }

    fields
}
