//! Listing agreement field extraction module.

pub mod kyc;
mod parser;
pub mod rules;

pub use kyc::{extract_kyc_fields, KycField, KycFields};
pub use parser::{ExtractionResult, RegexAgreementParser};
pub use rules::detect_technical_fee;

use crate::models::agreement::ExtractedFields;

/// Trait for agreement field extractors.
///
/// Extraction is best-effort: fields that cannot be found are simply absent.
pub trait AgreementExtractor {
    /// Extract fields with per-field provenance and warnings.
    fn extract(&self, text: &str) -> ExtractionResult;

    /// Extract only the field map.
    fn extract_fields(&self, text: &str) -> ExtractedFields {
        self.extract(text).fields
    }
}

/// Extract agreement fields from raw text with default settings.
pub fn extract_fields(text: &str) -> ExtractedFields {
    RegexAgreementParser::new().extract_fields(text)
}
