//! Advisory validation of user-edited agreement records.
//!
//! Validation flags fields for review; it never blocks document generation.
//! Empty fields are always valid.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::extraction::rules::dates::parse_long_date;
use crate::models::agreement::{AgreementRecord, FieldKey};

const LONG_DATE: &str = r"^(January|February|March|April|May|June|July|August|September|October|November|December)\s(0?[1-9]|[12][0-9]|3[01]),\s[0-9]{4}$";
const PLAIN_AMOUNT: &str = r"^[0-9,]+(\.[0-9]{1,2})?$";
const UPPER_WORDS: &str = r"^[A-Z\s\-]+$";

/// Acceptance pattern for one field.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRule {
    pub field: FieldKey,
    pub pattern: &'static str,
    pub hint: &'static str,
}

/// Rules for every string field, in field order.
pub const VALIDATION_RULES: &[ValidationRule] = &[
    ValidationRule {
        field: FieldKey::Company,
        pattern: r"^[一-龥a-zA-Z()（）\s.&,]{2,100}$",
        hint: "2-100 letters, spaces or ().&,",
    },
    ValidationRule {
        field: FieldKey::Jurisdiction,
        pattern: r"^[一-龥a-zA-Z\s,]{2,50}$",
        hint: "2-50 letters, spaces or commas",
    },
    ValidationRule {
        field: FieldKey::Address,
        pattern: r"^[一-龥a-zA-Z0-9\s#\-.,()（）]{5,150}$",
        hint: "5-150 letters, digits, spaces or #-.,()",
    },
    ValidationRule {
        field: FieldKey::SignDate,
        pattern: LONG_DATE,
        hint: "Month D, YYYY",
    },
    ValidationRule {
        field: FieldKey::ListingDate,
        pattern: LONG_DATE,
        hint: "Month D, YYYY",
    },
    ValidationRule {
        field: FieldKey::Token,
        pattern: r"^[A-Z0-9]{2,10}$",
        hint: "2-10 uppercase letters or digits",
    },
    ValidationRule {
        field: FieldKey::Amount,
        pattern: PLAIN_AMOUNT,
        hint: "number only, up to 2 decimals",
    },
    ValidationRule {
        field: FieldKey::AmountInWords,
        pattern: UPPER_WORDS,
        hint: "ALL CAPS words",
    },
    ValidationRule {
        field: FieldKey::SignName,
        pattern: r"^[一-龥a-zA-Z\s.]{2,50}$",
        hint: "2-50 letters, spaces or dots",
    },
    ValidationRule {
        field: FieldKey::MarketingAmount,
        pattern: PLAIN_AMOUNT,
        hint: "number only, up to 2 decimals",
    },
    ValidationRule {
        field: FieldKey::MarketingInWords,
        pattern: UPPER_WORDS,
        hint: "ALL CAPS words",
    },
    ValidationRule {
        field: FieldKey::TradingPair,
        pattern: r"^[A-Z0-9]+/[A-Z0-9]+$",
        hint: "BASE/QUOTE in uppercase",
    },
    ValidationRule {
        field: FieldKey::Wallets,
        pattern: r"^[A-Za-z0-9_\s:,.\-]{10,500}$",
        hint: "10-500 address characters",
    },
];

lazy_static! {
    static ref COMPILED_RULES: Vec<(FieldKey, Regex)> = VALIDATION_RULES
        .iter()
        .map(|rule| (rule.field, Regex::new(rule.pattern).unwrap()))
        .collect();
}

/// Rule declared for a field.
pub fn rule_for(key: FieldKey) -> Option<&'static ValidationRule> {
    VALIDATION_RULES.iter().find(|rule| rule.field == key)
}

/// Check one value. Blank values always pass.
pub fn validate_field(key: FieldKey, value: &str) -> bool {
    if value.trim().is_empty() {
        return true;
    }
    COMPILED_RULES
        .iter()
        .find(|(field, _)| *field == key)
        .is_none_or(|(_, regex)| regex.is_match(value))
}

/// Validate every field of a record.
pub fn validate_record(record: &AgreementRecord) -> ValidationReport {
    let invalid = record
        .iter()
        .filter(|(key, value)| !validate_field(*key, value))
        .map(|(key, _)| key)
        .collect();
    ValidationReport { invalid }
}

/// Fields that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    invalid: BTreeSet<FieldKey>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn is_invalid(&self, key: FieldKey) -> bool {
        self.invalid.contains(&key)
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.invalid.iter().copied()
    }

    /// Invalid fields with the hint describing the expected format.
    pub fn issues(&self) -> Vec<(FieldKey, &'static str)> {
        self.invalid
            .iter()
            .map(|key| (*key, rule_for(*key).map_or("", |rule| rule.hint)))
            .collect()
    }

    /// `field -> true` map for invalid fields.
    pub fn to_map(&self) -> BTreeMap<FieldKey, bool> {
        self.invalid.iter().map(|key| (*key, true)).collect()
    }
}

/// Date outside the expected signing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWarning {
    /// The date is before today.
    Past,
    /// The date is more than twelve months after today.
    TooFar,
}

impl fmt::Display for DateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWarning::Past => f.write_str("date has already passed"),
            DateWarning::TooFar => f.write_str("date is more than 12 months away"),
        }
    }
}

/// Warn about past dates and dates more than a year out.
///
/// Only "Month D, YYYY" values are checked; anything else yields no warning.
pub fn date_warning(value: &str, today: NaiveDate) -> Option<DateWarning> {
    let date = parse_long_date(value)?;
    if date < today {
        return Some(DateWarning::Past);
    }
    let limit = today.checked_add_months(Months::new(12))?;
    (date > limit).then_some(DateWarning::TooFar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> AgreementRecord {
        AgreementRecord::new(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())
    }

    #[test]
    fn test_token_rule() {
        let mut r = record();
        r.token = "btc1".to_string();
        let report = validate_record(&r);
        assert!(report.is_invalid(FieldKey::Token));
        assert_eq!(report.issues(), vec![(FieldKey::Token, "2-10 uppercase letters or digits")]);

        r.token = String::new();
        assert!(validate_record(&r).is_valid());
    }

    #[test]
    fn test_default_record_is_valid() {
        assert!(validate_record(&record()).is_valid());
    }

    #[test]
    fn test_field_rules() {
        assert!(validate_field(FieldKey::Company, "Ado Network S.R.L."));
        assert!(validate_field(FieldKey::Company, "某某科技（香港）有限公司"));
        assert!(!validate_field(FieldKey::Company, "Ado Network 2"));
        assert!(validate_field(FieldKey::Address, "Str. Exemplu 12, Bucuresti"));
        assert!(validate_field(FieldKey::ListingDate, "March 1, 2026"));
        assert!(!validate_field(FieldKey::ListingDate, "2026-03-01"));
        assert!(!validate_field(FieldKey::ListingDate, "March 32, 2026"));
        assert!(validate_field(FieldKey::Amount, "90,000.50"));
        assert!(!validate_field(FieldKey::Amount, "90k"));
        assert!(validate_field(FieldKey::AmountInWords, "NINETY-ONE THOUSAND"));
        assert!(!validate_field(FieldKey::AmountInWords, "Ninety"));
        assert!(validate_field(FieldKey::TradingPair, "ADO/USDT"));
        assert!(!validate_field(FieldKey::TradingPair, "ADO-USDT"));
        assert!(validate_field(FieldKey::SignName, "Andrei Popescu"));
        assert!(validate_field(
            FieldKey::Wallets,
            "ERC20: 0x52908400098527886E0F7030069857D2E4169EE7\nTRC20: TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7"
        ));
        assert!(!validate_field(FieldKey::Wallets, "short"));
    }

    #[test]
    fn test_blank_values_pass() {
        for key in FieldKey::ALL {
            assert!(validate_field(key, "   "), "{key}");
        }
    }

    #[test]
    fn test_report_map() {
        let mut r = record();
        r.tradingpair = "ado/usdt".to_string();
        r.amount = "lots".to_string();
        let map = validate_record(&r).to_map();
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            vec![(FieldKey::Amount, true), (FieldKey::TradingPair, true)]
        );
    }

    #[test]
    fn test_date_warning() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
        assert_eq!(date_warning("February 12, 2026", today), Some(DateWarning::Past));
        assert_eq!(date_warning("February 13, 2026", today), None);
        assert_eq!(date_warning("February 13, 2027", today), None);
        assert_eq!(date_warning("February 14, 2027", today), Some(DateWarning::TooFar));
        assert_eq!(date_warning("next week", today), None);
        assert_eq!(date_warning("", today), None);
    }
}
