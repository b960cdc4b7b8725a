//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod history;
pub mod kyc;
pub mod prompt;
pub mod rules;
pub mod tools;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use bitlist_core::models::config::BitlistConfig;
use bitlist_core::FileStore;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bitlist")
        .join("config.json")
}

/// Config file selected by `--config`, or the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration. A missing default file yields defaults; a missing
/// explicit file is an error.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BitlistConfig> {
    if let Some(path) = config_path {
        return Ok(BitlistConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(BitlistConfig::from_file(&default_path)?)
    } else {
        Ok(BitlistConfig::default())
    }
}

/// Open the JSON store named by the configuration.
pub fn open_store(config: &BitlistConfig) -> anyhow::Result<FileStore> {
    let path = config.store_path();
    debug!("Opening store at {}", path.display());
    Ok(FileStore::open(path)?)
}

/// Read input text from a file, or from stdin when `input` is `-`.
pub fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read_to_string(path)?)
}
