//! Data models for listing agreements and configuration.

pub mod agreement;
pub mod config;

pub use agreement::{AgreementRecord, ExtractedFields, FieldKey};
pub use config::BitlistConfig;
