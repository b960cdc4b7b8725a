//! Error types for the bitlist-core library.
//!
//! Field extraction and normalization are best-effort and never fail; these
//! errors cover the surrounding concerns (persistence, configuration, parsing
//! of AI responses).

use thiserror::Error;

/// Main error type for the bitlist library.
#[derive(Error, Debug)]
pub enum BitlistError {
    /// Extraction error (AI response handling).
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Key-value store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to field extraction from external sources.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The AI response body was not valid JSON.
    #[error("invalid JSON from AI: {0}")]
    InvalidAiResponse(String),

    /// The AI response was valid JSON but not an object.
    #[error("AI response is not a JSON object")]
    NotAnObject,

    /// Unknown field name.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// No API key configured for the AI endpoint.
    #[error("no API key configured")]
    MissingApiKey,

    /// A correction analysis was requested without any corrections.
    #[error("no corrections to analyze")]
    NoCorrections,
}

/// Errors related to the key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file could not be read or written.
    #[error("store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored value could not be (de)serialized.
    #[error("failed to (de)serialize {key}: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A lock guarding the store was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type for the bitlist library.
pub type Result<T> = std::result::Result<T, BitlistError>;
