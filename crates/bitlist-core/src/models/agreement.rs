//! Listing agreement data models.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::extraction::rules::dates::format_long_date;
use crate::extraction::rules::words::number_to_words;

/// A string-valued field of a listing agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    #[serde(rename = "company")]
    Company,
    #[serde(rename = "jurisdiction")]
    Jurisdiction,
    #[serde(rename = "address")]
    Address,
    #[serde(rename = "signdate")]
    SignDate,
    #[serde(rename = "listingdate")]
    ListingDate,
    #[serde(rename = "token")]
    Token,
    #[serde(rename = "amount")]
    Amount,
    #[serde(rename = "amountInWords")]
    AmountInWords,
    #[serde(rename = "signname")]
    SignName,
    #[serde(rename = "marketingamount")]
    MarketingAmount,
    #[serde(rename = "marketinginwords")]
    MarketingInWords,
    #[serde(rename = "tradingpair")]
    TradingPair,
    #[serde(rename = "wallets")]
    Wallets,
}

impl FieldKey {
    /// All fields in extraction order.
    pub const ALL: [FieldKey; 13] = [
        FieldKey::Company,
        FieldKey::Jurisdiction,
        FieldKey::Address,
        FieldKey::SignDate,
        FieldKey::ListingDate,
        FieldKey::Token,
        FieldKey::Amount,
        FieldKey::AmountInWords,
        FieldKey::SignName,
        FieldKey::MarketingAmount,
        FieldKey::MarketingInWords,
        FieldKey::TradingPair,
        FieldKey::Wallets,
    ];

    /// Wire name used in JSON records and template placeholders.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Company => "company",
            FieldKey::Jurisdiction => "jurisdiction",
            FieldKey::Address => "address",
            FieldKey::SignDate => "signdate",
            FieldKey::ListingDate => "listingdate",
            FieldKey::Token => "token",
            FieldKey::Amount => "amount",
            FieldKey::AmountInWords => "amountInWords",
            FieldKey::SignName => "signname",
            FieldKey::MarketingAmount => "marketingamount",
            FieldKey::MarketingInWords => "marketinginwords",
            FieldKey::TradingPair => "tradingpair",
            FieldKey::Wallets => "wallets",
        }
    }

    /// Human-readable description (English / Chinese).
    pub fn description(&self) -> &'static str {
        match self {
            FieldKey::Company => "Company Name / 公司名称",
            FieldKey::Jurisdiction => "Jurisdiction / 管辖地",
            FieldKey::Address => "Registered Address / 注册地址",
            FieldKey::SignDate => "Agreement Sign Date / 签署日期",
            FieldKey::ListingDate => "Listing Date / 上线日期",
            FieldKey::Token => "Token Symbol / 代币名称",
            FieldKey::Amount => "Listing Fee Amount / 上市费用金额",
            FieldKey::AmountInWords => "Listing Fee in English Words (ALL CAPS)",
            FieldKey::SignName => "Signer Full Name / 签署人",
            FieldKey::MarketingAmount => "Marketing Fee Amount / 营销费用金额",
            FieldKey::MarketingInWords => "Marketing Fee in English Words (ALL CAPS)",
            FieldKey::TradingPair => "Trading Pair / 交易对",
            FieldKey::Wallets => "Wallet Addresses / 钱包地址",
        }
    }

    /// Whether the field holds a "Month D, YYYY" date.
    pub fn is_date(&self) -> bool {
        matches!(self, FieldKey::SignDate | FieldKey::ListingDate)
    }

    /// Whether the field holds a plain numeric amount.
    pub fn is_amount(&self) -> bool {
        matches!(self, FieldKey::Amount | FieldKey::MarketingAmount)
    }

    /// The words field kept in sync with this amount field, if any.
    pub fn words_counterpart(&self) -> Option<FieldKey> {
        match self {
            FieldKey::Amount => Some(FieldKey::AmountInWords),
            FieldKey::MarketingAmount => Some(FieldKey::MarketingInWords),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExtractionError::UnknownField(s.to_string()))
    }
}

/// A partial agreement produced by extraction.
///
/// Fields that could not be determined are `None` so that merging into an
/// existing record never clobbers values the user already has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listingdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(rename = "amountInWords", skip_serializing_if = "Option::is_none")]
    pub amount_in_words: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketingamount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketinginwords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tradingpair: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallets: Option<String>,
    #[serde(rename = "includeTechnicalFee", skip_serializing_if = "Option::is_none")]
    pub include_technical_fee: Option<bool>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: FieldKey) -> &Option<String> {
        match key {
            FieldKey::Company => &self.company,
            FieldKey::Jurisdiction => &self.jurisdiction,
            FieldKey::Address => &self.address,
            FieldKey::SignDate => &self.signdate,
            FieldKey::ListingDate => &self.listingdate,
            FieldKey::Token => &self.token,
            FieldKey::Amount => &self.amount,
            FieldKey::AmountInWords => &self.amount_in_words,
            FieldKey::SignName => &self.signname,
            FieldKey::MarketingAmount => &self.marketingamount,
            FieldKey::MarketingInWords => &self.marketinginwords,
            FieldKey::TradingPair => &self.tradingpair,
            FieldKey::Wallets => &self.wallets,
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut Option<String> {
        match key {
            FieldKey::Company => &mut self.company,
            FieldKey::Jurisdiction => &mut self.jurisdiction,
            FieldKey::Address => &mut self.address,
            FieldKey::SignDate => &mut self.signdate,
            FieldKey::ListingDate => &mut self.listingdate,
            FieldKey::Token => &mut self.token,
            FieldKey::Amount => &mut self.amount,
            FieldKey::AmountInWords => &mut self.amount_in_words,
            FieldKey::SignName => &mut self.signname,
            FieldKey::MarketingAmount => &mut self.marketingamount,
            FieldKey::MarketingInWords => &mut self.marketinginwords,
            FieldKey::TradingPair => &mut self.tradingpair,
            FieldKey::Wallets => &mut self.wallets,
        }
    }

    /// Get a field value, treating empty strings as absent.
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.slot(key).as_deref().filter(|v| !v.is_empty())
    }

    /// Set a field value.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(value.into());
    }

    /// Remove a field value.
    pub fn clear(&mut self, key: FieldKey) {
        *self.slot_mut(key) = None;
    }

    /// Check whether a non-empty value is present for `key`.
    pub fn has(&self, key: FieldKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of populated string fields.
    pub fn len(&self) -> usize {
        FieldKey::ALL.iter().filter(|k| self.has(**k)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate populated fields in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        FieldKey::ALL
            .iter()
            .filter_map(move |k| self.get(*k).map(|v| (*k, v)))
    }

    /// Fields that are still missing.
    pub fn missing(&self) -> Vec<FieldKey> {
        FieldKey::ALL.iter().copied().filter(|k| !self.has(*k)).collect()
    }
}

/// The full, user-editable listing agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementRecord {
    pub company: String,
    pub jurisdiction: String,
    pub address: String,
    pub listingdate: String,
    pub amount: String,
    #[serde(rename = "amountInWords")]
    pub amount_in_words: String,
    pub token: String,
    pub signdate: String,
    pub signname: String,
    pub marketingamount: String,
    pub marketinginwords: String,
    pub tradingpair: String,
    pub wallets: String,
    #[serde(rename = "includeTechnicalFee")]
    pub include_technical_fee: bool,
}

impl AgreementRecord {
    /// Create an empty record whose sign date defaults to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            company: String::new(),
            jurisdiction: String::new(),
            address: String::new(),
            listingdate: String::new(),
            amount: String::new(),
            amount_in_words: String::new(),
            token: String::new(),
            signdate: format_long_date(today),
            signname: String::new(),
            marketingamount: String::new(),
            marketinginwords: String::new(),
            tradingpair: String::new(),
            wallets: String::new(),
            include_technical_fee: true,
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::Company => &mut self.company,
            FieldKey::Jurisdiction => &mut self.jurisdiction,
            FieldKey::Address => &mut self.address,
            FieldKey::SignDate => &mut self.signdate,
            FieldKey::ListingDate => &mut self.listingdate,
            FieldKey::Token => &mut self.token,
            FieldKey::Amount => &mut self.amount,
            FieldKey::AmountInWords => &mut self.amount_in_words,
            FieldKey::SignName => &mut self.signname,
            FieldKey::MarketingAmount => &mut self.marketingamount,
            FieldKey::MarketingInWords => &mut self.marketinginwords,
            FieldKey::TradingPair => &mut self.tradingpair,
            FieldKey::Wallets => &mut self.wallets,
        }
    }

    /// Get a field value.
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Company => &self.company,
            FieldKey::Jurisdiction => &self.jurisdiction,
            FieldKey::Address => &self.address,
            FieldKey::SignDate => &self.signdate,
            FieldKey::ListingDate => &self.listingdate,
            FieldKey::Token => &self.token,
            FieldKey::Amount => &self.amount,
            FieldKey::AmountInWords => &self.amount_in_words,
            FieldKey::SignName => &self.signname,
            FieldKey::MarketingAmount => &self.marketingamount,
            FieldKey::MarketingInWords => &self.marketinginwords,
            FieldKey::TradingPair => &self.tradingpair,
            FieldKey::Wallets => &self.wallets,
        }
    }

    /// Replace a field value verbatim.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.slot_mut(key) = value.into();
    }

    /// Apply a user edit.
    ///
    /// Editing an amount field re-derives its words counterpart whenever the
    /// new amount converts to a non-empty phrase.
    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        if let Some(words_key) = key.words_counterpart() {
            let words = number_to_words(&value);
            if !words.is_empty() {
                self.set(words_key, words);
            }
        }
        self.set(key, value);
    }

    /// Merge extracted fields, leaving absent fields untouched.
    pub fn merge(&mut self, fields: &ExtractedFields) {
        for (key, value) in fields.iter() {
            self.set(key, value);
        }
        if let Some(fee) = fields.include_technical_fee {
            self.include_technical_fee = fee;
        }
    }

    /// Iterate all string fields in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        FieldKey::ALL.iter().map(move |k| (*k, self.get(*k)))
    }
}

impl Default for AgreementRecord {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl From<&AgreementRecord> for ExtractedFields {
    fn from(record: &AgreementRecord) -> Self {
        let mut fields = ExtractedFields::new();
        for (key, value) in record.iter() {
            if !value.is_empty() {
                fields.set(key, value);
            }
        }
        fields.include_technical_fee = Some(record.include_technical_fee);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let record = AgreementRecord::new(today());
        assert_eq!(record.signdate, "February 13, 2026");
        assert!(record.include_technical_fee);
        assert!(record.company.is_empty());
    }

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut record = AgreementRecord::new(today());
        record.company = "Ado Network SRL".to_string();

        let mut fields = ExtractedFields::new();
        fields.set(FieldKey::Token, "ADO");

        record.merge(&fields);
        assert_eq!(record.company, "Ado Network SRL");
        assert_eq!(record.token, "ADO");
        assert_eq!(record.signdate, "February 13, 2026");
    }

    #[test]
    fn test_set_field_syncs_words() {
        let mut record = AgreementRecord::new(today());
        record.set_field(FieldKey::Amount, "90000");
        assert_eq!(record.amount_in_words, "NINETY THOUSAND");

        record.set_field(FieldKey::MarketingAmount, "1,000,000");
        assert_eq!(record.marketinginwords, "ONE MILLION");

        // Unparseable amounts leave the words untouched
        record.set_field(FieldKey::Amount, "tbd");
        assert_eq!(record.amount, "tbd");
        assert_eq!(record.amount_in_words, "NINETY THOUSAND");
    }

    #[test]
    fn test_field_key_round_trip() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>().unwrap(), key);
        }
        assert!("nonsense".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_extracted_fields_serialization_skips_absent() {
        let mut fields = ExtractedFields::new();
        fields.set(FieldKey::AmountInWords, "TEN THOUSAND");
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"amountInWords":"TEN THOUSAND"}"#);
    }

    #[test]
    fn test_extracted_fields_empty_string_is_absent() {
        let mut fields = ExtractedFields::new();
        fields.set(FieldKey::Company, "");
        assert!(fields.is_empty());
        assert_eq!(fields.missing().len(), 13);
    }
}
