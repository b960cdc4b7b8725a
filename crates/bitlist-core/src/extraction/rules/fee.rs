//! Technical-fee detection.

/// Phrases indicating the technical fee is waived.
const WAIVER_KEYWORDS: &[&str] = &["waive", "waiver", "no technical fee", "免除"];

/// Decide whether the agreement should include the technical fee clause.
///
/// Returns `false` when the text mentions a waiver anywhere.
pub fn detect_technical_fee(text: &str) -> bool {
    let lower = text.to_lowercase();
    !WAIVER_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
