//! Label patterns for listing-agreement fields (English and Chinese).

use lazy_static::lazy_static;
use regex::Regex;

use super::{next_char_boundary, ExtractionMatch, FieldExtractor};
use crate::models::agreement::FieldKey;

/// Optional bullet (• * - ●) or list number (1. 2) 3、) before a label.
const PREFIX: &str = r"(?:[•*\-●]\s*|\d+[.)、]\s*)?";

/// Colon separator, ASCII or full-width.
const SEP: &str = r"\s*[:：]\s*";

/// Label fragments per field, in priority order. The first label that
/// matches a line wins, regardless of where that line sits in the text.
pub const FIELD_LABELS: &[(FieldKey, &[&str])] = &[
    (
        FieldKey::Company,
        &[
            r"company\s*名称",
            r"company\s*name",
            r"compny\s*name",
            r"companyname",
            r"company\s*nm",
            r"legal\s*entity\s*name",
            r"entity\s*name",
            r"project\s*entity",
            r"company",
            r"公司名称",
            r"公司名",
        ],
    ),
    (
        FieldKey::Jurisdiction,
        &[
            r"jurisdiction\s*管辖地[/／]国",
            r"jurisdiction\s*[/／]\s*country",
            r"country\s*of\s*incorporation",
            r"incorporation\s*country",
            r"jurisdiction",
            r"管辖地[/／]国",
            r"管辖地",
            r"注册国家",
        ],
    ),
    (
        FieldKey::Address,
        &[
            r"registered\s*address",
            r"company\s*address",
            r"business\s*address",
            r"office\s*address",
            r"addr",
            r"address\s*公司地址",
            r"address",
            r"注册地址",
            r"公司地址",
            r"地址",
        ],
    ),
    (
        FieldKey::SignDate,
        &[
            r"合同签署\s*date",
            r"agreement\s*date",
            r"signing\s*date",
            r"sign\s*date",
            r"contract\s*date",
            r"签署日期",
            r"签约日期",
            r"date",
        ],
    ),
    (
        FieldKey::ListingDate,
        &[
            r"latest\s*listing\s*date",
            r"listing\s*date",
            r"latest\s*date",
            r"launch\s*date",
            r"go\s*live\s*date",
            r"listing\s*day",
            r"listing\s*time",
            r"list\s*date",
            r"time\s*to\s*market",
            r"expected\s*listing",
            r"target\s*listing",
            r"上市日",
            r"最晚上线日期",
            r"上线日期",
            r"上币日期",
            r"listing",
        ],
    ),
    (
        FieldKey::Token,
        &[
            r"token\s*代币名称",
            r"token\s*ticker",
            r"ticker\s*name",
            r"ticker",
            r"token\s*symbol",
            r"coin\s*name",
            r"coin",
            r"symbol",
            r"token\s*name",
            r"token",
            r"代币名称",
            r"代币",
        ],
    ),
    (
        FieldKey::Amount,
        &[
            r"listing\s*fee\s*amount",
            r"listing\s*fee\s*\(USD\)",
            r"listing\s*fee\s*\(USDT\)",
            r"listing\s*fee",
            r"上市费用\s*金额",
            r"上市费用",
            r"上市费",
            r"fee\s*amount",
            r"amount",
        ],
    ),
    (
        FieldKey::AmountInWords,
        &[
            r"listing\s*fee\s*in\s*words",
            r"amount\s*in\s*words",
            r"fee\s*in\s*words",
            r"money\s*上市费英文大写",
            r"amountinwords",
            r"amount\s*in\s*english",
            r"英文大写",
            r"金额大写",
        ],
    ),
    (
        FieldKey::SignName,
        &[
            r"签署人\s*1",
            r"签署人",
            r"signer\s*full\s*name",
            r"signer\s*name",
            r"full\s*legal\s*name",
            r"legal\s*name",
            r"authorized\s*signer",
            r"representative\s*name",
            r"contact\s*person",
            r"signer",
            r"name1",
        ],
    ),
    (
        FieldKey::MarketingAmount,
        &[
            r"marketing\s*(?:fee\s*)?amount",
            r"marketing\s*fee\s*\(USD\)",
            r"marketing\s*fee\s*\(USDT\)",
            r"marketing\s*fee",
            r"promotional\s*fee",
            r"promotion\s*fee",
            r"营销费用",
            r"推广费",
            r"marketing",
        ],
    ),
    (
        FieldKey::MarketingInWords,
        &[
            r"marketing\s*(?:fee\s*)?in\s*words",
            r"marketing\s*fee\s*words",
            r"marketing\s*amount\s*in\s*words",
            r"marketing\s*in\s*english",
            r"营销费大写",
        ],
    ),
    (
        FieldKey::TradingPair,
        &[
            r"trading\s*pairs?",
            r"trade\s*pairs?",
            r"pairs?",
            r"交易对",
        ],
    ),
    (
        FieldKey::Wallets,
        &[
            r"wallet\s*address(?:es)?",
            r"deposit\s*address(?:es)?",
            r"钱包地址",
            r"wallets?",
        ],
    ),
];

/// Words that, directly followed by one whitespace, disqualify a bare
/// `Name:` label from being read as the signer.
const NAME_EXCLUDED_PREFIXES: &[&str] = &["company", "token", "legal", "entity", "signer", "full"];

lazy_static! {
    /// Compiled label patterns, keyed by field in extraction order.
    pub static ref FIELD_PATTERNS: Vec<(FieldKey, Vec<LabelPattern>)> = FIELD_LABELS
        .iter()
        .map(|(key, labels)| (*key, labels.iter().map(|l| LabelPattern::new(*l)).collect()))
        .collect();

    /// First numeric run with an optional k/M multiplier suffix.
    pub static ref AMOUNT_NUMBER: Regex = Regex::new(
        r"(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:\s*[kKmM]\b)?"
    ).unwrap();

    /// Amount with a thousand multiplier ("$90k", "90 K").
    pub static ref AMOUNT_THOUSANDS: Regex = Regex::new(
        r"\$?\s*(\d+(?:\.\d+)?)\s*[kK]\b"
    ).unwrap();

    /// Amount with a million multiplier ("$1.5M").
    pub static ref AMOUNT_MILLIONS: Regex = Regex::new(
        r"\$?\s*(\d+(?:\.\d+)?)\s*[mM]\b"
    ).unwrap();

    /// Currency tokens stripped from plain amounts.
    pub static ref CURRENCY_TOKEN: Regex = Regex::new(
        r"(?i)\s*(?:USDT|USD)\s*"
    ).unwrap();

    /// Number mentioned after "listing fee" within the same sentence.
    pub static ref LISTING_FEE_CONTEXT: Regex = Regex::new(
        r"(?i)listing\s*fee[^.]*?(\d{1,3}(?:,\d{3})+|\d+(?:,\d{3})*)"
    ).unwrap();

    /// Generic "Name:" label for the signer fallback.
    pub static ref GENERIC_NAME: Regex = Regex::new(
        r"(?i)Name\s*[:：]\s*(.+)"
    ).unwrap();

    /// Trading pair quoted against a major asset.
    pub static ref TRADING_PAIR: Regex = Regex::new(
        r"\b([A-Z0-9]{2,10})\s*/\s*(USDT|BTC|ETH|USDC|USD)\b"
    ).unwrap();

    /// Address-shaped tokens: EVM, Tron, Bitcoin legacy/P2SH, bech32.
    pub static ref WALLET_ADDRESS: Regex = Regex::new(
        r"\b(?:0x[a-fA-F0-9]{40}|T[a-zA-Z0-9]{33}|[13][a-km-zA-HJ-NP-Z1-9]{25,34}|bc1[a-zA-HJ-NP-Z0-9]{39,59})\b"
    ).unwrap();

    // Date shapes, tried in this order by the date normalizer
    pub static ref DATE_FULL: Regex = Regex::new(
        r"^(January|February|March|April|May|June|July|August|September|October|November|December)\s+([0-9]{1,2}),?\s*([0-9]{4})$"
    ).unwrap();

    pub static ref DATE_SHORT_MONTH: Regex = Regex::new(
        r"(?i)^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+([0-9]{1,2}),?\s*([0-9]{4})$"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_WORD: Regex = Regex::new(
        r"(?i)^([0-9]{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+([0-9]{4})$"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"^([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})$"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"^([0-9]{1,2})[/.\-]([0-9]{1,2})[/.\-]([0-9]{2,4})$"
    ).unwrap();

    /// A single trailing parenthetical note, e.g. "(if applicable)".
    pub static ref TRAILING_NOTE: Regex = Regex::new(
        r"\s*\([^()]*\)\s*$"
    ).unwrap();
}

/// One label matcher: `<prefix><label><colon><value to end of line>`.
#[derive(Debug)]
pub struct LabelPattern {
    label: &'static str,
    regex: Regex,
}

impl LabelPattern {
    /// Compile a label fragment into a line-anchored, case-insensitive matcher.
    pub fn new(label: &'static str) -> Self {
        let regex = Regex::new(&format!(r"(?im)^[^\S\r\n]*{PREFIX}{label}{SEP}(.+)")).unwrap();
        Self { label, regex }
    }

    /// The label fragment this pattern was built from.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Find the raw value following the label, with its byte span.
    pub fn capture<'t>(&self, text: &'t str) -> Option<(&'t str, usize, usize)> {
        let caps = self.regex.captures(text)?;
        let value = caps.get(1)?;
        Some((value.as_str(), value.start(), value.end()))
    }
}

/// Trim a captured value and drop one trailing parenthetical note.
pub fn strip_trailing_note(value: &str) -> String {
    TRAILING_NOTE.replace(value.trim(), "").trim().to_string()
}

/// Label patterns declared for a field.
pub fn label_patterns(key: FieldKey) -> &'static [LabelPattern] {
    FIELD_PATTERNS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, patterns)| patterns.as_slice())
        .unwrap_or(&[])
}

/// Ordered label matcher for one field.
///
/// Produces the cleaned but not yet normalized value.
pub struct LabelExtractor {
    field: FieldKey,
    patterns: &'static [LabelPattern],
}

impl LabelExtractor {
    pub fn new(field: FieldKey) -> Self {
        Self {
            field,
            patterns: label_patterns(field),
        }
    }

    pub fn field(&self) -> FieldKey {
        self.field
    }

    fn match_pattern(pattern: &LabelPattern, text: &str) -> Option<ExtractionMatch<String>> {
        let (raw, start, end) = pattern.capture(text)?;
        let value = strip_trailing_note(raw);
        if value.is_empty() {
            return None;
        }
        Some(ExtractionMatch::new(value, 0.95, pattern.label()).with_position(start, end))
    }
}

impl FieldExtractor for LabelExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.patterns
            .iter()
            .find_map(|pattern| Self::match_pattern(pattern, text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.patterns
            .iter()
            .filter_map(|pattern| Self::match_pattern(pattern, text))
            .collect()
    }
}

/// Signer fallback: a bare `Name:` label not preceded by an excluded word.
pub struct SignerNameFallback;

impl SignerNameFallback {
    pub fn new() -> Self {
        Self
    }

    fn is_excluded(before: &str) -> bool {
        let mut chars = before.chars();
        match chars.next_back() {
            Some(c) if c.is_whitespace() => {}
            _ => return false,
        }
        let rest = chars.as_str();
        NAME_EXCLUDED_PREFIXES.iter().any(|prefix| {
            rest.len() >= prefix.len()
                && rest.is_char_boundary(rest.len() - prefix.len())
                && rest[rest.len() - prefix.len()..].eq_ignore_ascii_case(prefix)
        })
    }
}

impl Default for SignerNameFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SignerNameFallback {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let Some(caps) = GENERIC_NAME.captures_at(text, pos) else {
                break;
            };
            let (Some(full), Some(value)) = (caps.get(0), caps.get(1)) else {
                break;
            };

            if Self::is_excluded(&text[..full.start()]) {
                pos = next_char_boundary(text, full.start());
                continue;
            }

            let cleaned = strip_trailing_note(value.as_str());
            if !cleaned.is_empty() {
                results.push(
                    ExtractionMatch::new(cleaned, 0.6, "name")
                        .with_position(value.start(), value.end()),
                );
            }
            pos = full.end();
        }

        results
    }
}
