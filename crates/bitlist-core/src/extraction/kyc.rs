//! KYC review field extraction.
//!
//! KYC exports arrive as loosely formatted label/value text: one pair per
//! line, several pairs on a line, or a bare label with its value on the next
//! line. Labels are matched case-insensitively in English and Chinese.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::next_char_boundary;

/// A KYC record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycField {
    AccountId,
    Name,
    Country,
    Gender,
    IdExpired,
    IdExpiry,
    IdType,
    IdNumber,
    Dob,
    SubmitTime,
    ReviewTime,
    SubmitIp,
    IpLocation,
    DeviceId,
    DeviceType,
    Channel,
}

impl KycField {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycField::AccountId => "account_id",
            KycField::Name => "name",
            KycField::Country => "country",
            KycField::Gender => "gender",
            KycField::IdExpired => "id_expired",
            KycField::IdExpiry => "id_expiry",
            KycField::IdType => "id_type",
            KycField::IdNumber => "id_number",
            KycField::Dob => "dob",
            KycField::SubmitTime => "submit_time",
            KycField::ReviewTime => "review_time",
            KycField::SubmitIp => "submit_ip",
            KycField::IpLocation => "ip_location",
            KycField::DeviceId => "device_id",
            KycField::DeviceType => "device_type",
            KycField::Channel => "channel",
        }
    }

    /// Label used in KYC report templates.
    pub fn template_label(&self) -> &'static str {
        match self {
            KycField::AccountId => "Account ID",
            KycField::Name => "Name",
            KycField::Country => "Country",
            KycField::Gender => "Gender",
            KycField::IdExpired => "ID Expired",
            KycField::IdExpiry => "ID Expiry Date",
            KycField::IdType => "ID Type",
            KycField::IdNumber => "ID Number",
            KycField::Dob => "Date of Birth",
            KycField::SubmitTime => "Submit Time",
            KycField::ReviewTime => "Review Time",
            KycField::SubmitIp => "Submit IP",
            KycField::IpLocation => "IP Location",
            KycField::DeviceId => "Submit Device ID",
            KycField::DeviceType => "Device Type",
            KycField::Channel => "Channel",
        }
    }
}

impl fmt::Display for KycField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels per field, in lookup order.
pub const KYC_LABELS: &[(KycField, &[&str])] = &[
    (KycField::AccountId, &["account id", "account id with bitmart", "cid"]),
    (KycField::Name, &["姓名", "name", "full name"]),
    (KycField::Country, &["国家", "国籍", "country"]),
    (KycField::Gender, &["性别", "gender"]),
    (
        KycField::IdExpired,
        &["证件是否过期", "是否过期", "证件过期", "证件是否有效", "id expired", "expired"],
    ),
    (
        KycField::IdExpiry,
        &[
            "证件过期时间",
            "过期时间",
            "证件到期时间",
            "到期时间",
            "有效期",
            "证件有效期",
            "id expiry date",
            "expiry date",
            "expiration date",
        ],
    ),
    (
        KycField::IdType,
        &["证件类型", "证件类别", "证件种类", "id type", "document type"],
    ),
    (
        KycField::IdNumber,
        &["证件号", "证件号码", "证件编号", "id number", "document number"],
    ),
    (KycField::Dob, &["生日", "出生日期", "date of birth", "dob"]),
    (KycField::SubmitTime, &["提交时间", "提交日期", "submit time"]),
    (KycField::ReviewTime, &["审核时间", "审核日期", "review time"]),
    (
        KycField::SubmitIp,
        &["提交IP", "提交 IP", "提交ip", "提交IP地址", "submit ip"],
    ),
    (
        KycField::IpLocation,
        &["IP归属地", "IP 归属地", "IP所在地", "IP所属地", "ip归属地", "ip location"],
    ),
    (
        KycField::DeviceId,
        &[
            "提交设备",
            "设备ID",
            "设备id",
            "设备编号",
            "设备标识",
            "device id",
            "submit device",
            "submit device id",
            "device identifier",
        ],
    ),
    (KycField::DeviceType, &["设备类型", "设备类别", "device type"]),
    (
        KycField::Channel,
        &["认证渠道", "认证方式", "channel", "verification channel", "kyc channel"],
    ),
];

/// Compiled matchers for one label.
struct KycLabel {
    /// Label anywhere in a line, with an optional colon.
    inline: Regex,
    /// Label at line start; group 2 is the remainder.
    leading: Regex,
    /// Line consisting of only the label.
    bare: Regex,
}

impl KycLabel {
    fn new(label: &str) -> Self {
        let escaped = regex::escape(label);
        Self {
            inline: Regex::new(&format!(r"(?i)({escaped})\s*[:：]?")).unwrap(),
            leading: Regex::new(&format!(r"(?i)^({escaped})\s*[:：]?\s*(.*)$")).unwrap(),
            bare: Regex::new(&format!(r"(?i)^{escaped}\s*[:：]?\s*$")).unwrap(),
        }
    }
}

lazy_static! {
    static ref KYC_PATTERNS: Vec<(KycField, Vec<KycLabel>)> = KYC_LABELS
        .iter()
        .map(|(field, labels)| (*field, labels.iter().map(|l| KycLabel::new(l)).collect()))
        .collect();

    static ref BULLET_PREFIX: Regex = Regex::new(r"^(?:[-\u{2013}\u{2014}]\s+|[\u{2022}\u{00b7}]\s+)").unwrap();

    static ref DEVICE_ID_PREFIX: Regex = Regex::new(r"(?i)^(?:id|device\s*id)\s*[:：]\s*").unwrap();
}

/// Extracted KYC values keyed by field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KycFields(BTreeMap<KycField, String>);

impl KycFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: KycField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: KycField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KycField, &str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Extract KYC fields from free-form review text. Never fails.
pub fn extract_kyc_fields(text: &str) -> KycFields {
    let lines: Vec<String> = text
        .lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = KycFields::new();

    for (idx, line) in lines.iter().enumerate() {
        extract_inline_pairs(line, &mut result);

        let Some((field, remainder)) = leading_label(line) else {
            continue;
        };

        if !remainder.is_empty() && !is_label_line(remainder) {
            // The inline pass already split this line at every label.
            if result.get(field).is_none() {
                result.insert(field, normalize_value(field, remainder));
            }
            continue;
        }

        if let Some(value) = value_on_following_line(&lines[idx + 1..], field) {
            result.insert(field, normalize_value(field, value));
        }
    }

    debug!("Extracted {} KYC fields", result.len());
    result
}

/// Trim a line and drop a leading bullet or dash marker.
fn clean_line(line: &str) -> String {
    let line = line.trim();
    if matches!(line, "-" | "\u{2014}" | "\u{2013}") {
        return line.to_string();
    }
    BULLET_PREFIX.replace(line, "").trim().to_string()
}

fn normalize_value(field: KycField, value: &str) -> String {
    let value = value.trim();
    if field == KycField::DeviceId {
        return DEVICE_ID_PREFIX.replace(value, "").to_string();
    }
    value.to_string()
}

/// A label must be followed by whitespace, a colon or the end of the line.
fn ends_label(line: &str, pos: usize) -> bool {
    match line[pos..].chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || c == ':' || c == '：',
    }
}

/// Field whose label makes up the whole line.
fn bare_label_field(line: &str) -> Option<KycField> {
    let candidate = line.trim();
    if candidate.is_empty() {
        return None;
    }
    KYC_PATTERNS
        .iter()
        .find(|(_, labels)| labels.iter().any(|l| l.bare.is_match(candidate)))
        .map(|(field, _)| *field)
}

fn is_label_line(line: &str) -> bool {
    bare_label_field(line).is_some()
}

/// First field whose label starts the line, with the rest of the line.
fn leading_label(line: &str) -> Option<(KycField, &str)> {
    for (field, labels) in KYC_PATTERNS.iter() {
        for label in labels {
            let Some(caps) = label.leading.captures(line) else {
                continue;
            };
            let (Some(name), Some(rest)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if ends_label(line, name.end()) {
                return Some((*field, rest.as_str().trim()));
            }
        }
    }
    None
}

/// Value for a bare label: the next line, skipping repeats of the same label.
fn value_on_following_line(rest: &[String], field: KycField) -> Option<&str> {
    let mut lines = rest.iter().skip_while(|l| bare_label_field(l) == Some(field));
    let candidate = lines.next()?;
    if is_label_line(candidate) || leading_label(candidate).is_some() {
        return None;
    }
    Some(candidate.trim())
}

/// Split a line at every label occurrence and record the values between them.
fn extract_inline_pairs(line: &str, result: &mut KycFields) {
    let mut occurrences: Vec<(usize, usize, KycField)> = Vec::new();

    for (field, labels) in KYC_PATTERNS.iter() {
        for label in labels {
            let mut pos = 0;
            while pos < line.len() {
                let Some(caps) = label.inline.captures_at(line, pos) else {
                    break;
                };
                let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
                    break;
                };
                if ends_label(line, name.end()) {
                    occurrences.push((full.start(), full.end(), *field));
                    pos = full.end();
                } else {
                    pos = next_char_boundary(line, name.start());
                }
            }
        }
    }

    occurrences.sort_by_key(|(start, _, _)| *start);

    for (idx, (_, end, field)) in occurrences.iter().enumerate() {
        let next_start = occurrences.get(idx + 1).map_or(line.len(), |o| o.0);
        if *end >= next_start {
            continue;
        }
        let raw = line[*end..next_start]
            .trim()
            .trim_start_matches([':', '：'])
            .trim();
        if raw.is_empty() || is_label_line(raw) {
            continue;
        }

        let value = normalize_value(*field, raw);
        let longer = result
            .get(*field)
            .is_none_or(|existing| value.chars().count() > existing.chars().count());
        if longer {
            result.insert(*field, value);
        }
    }
}
