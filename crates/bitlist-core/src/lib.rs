//! Core library for listing-agreement field extraction.
//!
//! This crate provides:
//! - Bilingual (English/Chinese) label patterns for agreement fields
//! - Date, amount and token normalization
//! - Jurisdiction inference from address keywords
//! - Number-to-words conversion for fee amounts
//! - Validation rules for user-edited records
//! - KYC field extraction
//! - An injectable key-value store for config, prompts and history

pub mod ai;
pub mod error;
pub mod extraction;
pub mod models;
pub mod render;
pub mod store;
pub mod validation;

pub use error::{BitlistError, ExtractionError, Result, StoreError};
pub use extraction::{
    detect_technical_fee, extract_fields, extract_kyc_fields, AgreementExtractor,
    ExtractionResult, KycFields, RegexAgreementParser,
};
pub use extraction::rules::{
    infer_jurisdiction, normalize_amount, normalize_date, normalize_date_with_today,
    number_to_words,
};
pub use models::agreement::{AgreementRecord, ExtractedFields, FieldKey};
pub use models::config::BitlistConfig;
pub use store::{FileStore, History, HistoryItem, HistoryKind, KeyValueStore, MemoryStore};
pub use validation::{date_warning, validate_record, DateWarning, ValidationReport};
