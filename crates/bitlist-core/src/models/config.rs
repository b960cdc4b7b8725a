//! Configuration structures for the extraction pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BitlistError, Result};

/// Main configuration for bitlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BitlistConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Storage configuration.
    pub store: StoreConfig,

    /// AI extraction endpoint configuration.
    pub ai: AiSettings,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fixed "today" used for ambiguous date resolution (system clock when unset).
    pub today: Option<NaiveDate>,

    /// Apply keyword and shape fallbacks for fields no label matched.
    pub use_fallbacks: bool,

    /// Clear the technical-fee flag when the text mentions a waiver.
    /// When disabled the fee is always included.
    pub detect_fee_waiver: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            today: None,
            use_fallbacks: true,
            detect_fee_waiver: true,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the JSON store file.
    pub data_dir: PathBuf,

    /// Store file name inside `data_dir`.
    pub file_name: String,

    /// Maximum number of history entries kept.
    pub max_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_name: "store.json".to_string(),
            max_history: 50,
        }
    }
}

/// AI endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// API base URL (OpenAI-compatible or Anthropic).
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// API key. Empty disables AI extraction.
    pub api_key: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: String::new(),
        }
    }
}

impl BitlistConfig {
    /// Load and check configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.store.max_history == 0 {
            return Err(BitlistError::Config("store.max_history must be at least 1".to_string()));
        }
        if self.store.file_name.trim().is_empty() {
            return Err(BitlistError::Config("store.file_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Full path of the store file.
    pub fn store_path(&self) -> PathBuf {
        self.store.data_dir.join(&self.store.file_name)
    }
}
