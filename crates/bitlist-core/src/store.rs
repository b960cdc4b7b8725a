//! Injected key-value storage for config, prompts, history and correction logs.
//!
//! Callers pass a [`KeyValueStore`] explicitly; nothing here reads global state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{offline_suggestion, DEFAULT_SYSTEM_PROMPT};
use crate::error::StoreError;
use crate::models::agreement::{AgreementRecord, ExtractedFields, FieldKey};
use crate::models::config::BitlistConfig;

pub const CONFIG_KEY: &str = "config";
pub const PROMPT_KEY: &str = "prompt";
pub const HISTORY_KEY: &str = "history";
pub const OPTIMIZATION_LOG_KEY: &str = "optimization_log";

/// Default cap for history and optimization logs.
pub const MAX_ENTRIES: usize = 50;

/// Characters of source text kept with an optimization log entry.
const SNIPPET_CHARS: usize = 200;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String key-value storage capability.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;

    /// Replace `key` with `f(current)` without releasing the store's lock in
    /// between. Nothing is written when `f` fails.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> StoreResult<String>,
    ) -> StoreResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> StoreResult<String>,
    ) -> StoreResult<()> {
        (**self).update(key, f)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> StoreResult<String>,
    ) -> StoreResult<()> {
        (**self).update(key, f)
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.clear();
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> StoreResult<String>,
    ) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let value = f(entries.get(key).map(String::as_str))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as a single JSON object file.
///
/// The whole file is rewritten on every mutation. A missing file is an
/// empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Serde {
                    key: path.display().to_string(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!("Opened store at {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of `entries`, write it, then swap it in.
    /// On a failed write the in-memory map is left as it was.
    fn commit(
        &self,
        entries: &mut BTreeMap<String, String>,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> StoreResult<()> {
        let mut staged = entries.clone();
        change(&mut staged);
        self.persist(&staged)?;
        *entries = staged;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Serde {
            key: self.path.display().to_string(),
            source,
        })?;
        fs::write(&self.path, content).map_err(io_err)?;
        debug!("Persisted {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        self.commit(&mut entries, |staged| {
            staged.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        self.commit(&mut entries, |staged| {
            staged.remove(key);
        })
    }

    fn clear(&self) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        self.commit(&mut entries, BTreeMap::clear)
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> StoreResult<String>,
    ) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let value = f(entries.get(key).map(String::as_str))?;
        self.commit(&mut entries, |staged| {
            staged.insert(key.to_string(), value);
        })
    }
}

/// Parse a stored JSON value; missing or corrupt values read as the default.
fn parse_or_default<T>(key: &str, raw: Option<&str>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring corrupt value for {key}: {e}");
            T::default()
        }
    }
}

fn read_json<T, S>(store: &S, key: &str) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    Ok(parse_or_default(key, store.get(key)?.as_deref()))
}

fn to_json<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })
}

fn write_json<T, S>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    store.set(key, &to_json(key, value)?)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Load the shared config, falling back to defaults.
pub fn load_config<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<BitlistConfig> {
    read_json(store, CONFIG_KEY)
}

pub fn save_config<S: KeyValueStore + ?Sized>(store: &S, config: &BitlistConfig) -> StoreResult<()> {
    write_json(store, CONFIG_KEY, config)
}

/// The custom extraction prompt, or the built-in one when none is stored.
pub fn load_prompt<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<String> {
    Ok(store
        .get(PROMPT_KEY)?
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()))
}

pub fn save_prompt<S: KeyValueStore + ?Sized>(store: &S, prompt: &str) -> StoreResult<()> {
    store.set(PROMPT_KEY, prompt)
}

/// Drop the custom prompt so the built-in one applies again.
pub fn reset_prompt<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<()> {
    store.remove(PROMPT_KEY)
}

/// Which generator produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Listing,
    Kyc,
}

/// One saved extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    /// Unix time in milliseconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub input_text: String,
    #[serde(rename = "outputData")]
    pub output: serde_json::Value,
}

impl HistoryItem {
    /// The stored listing extraction, or `None` for KYC entries.
    pub fn listing_fields(&self) -> StoreResult<Option<ExtractedFields>> {
        if self.kind != HistoryKind::Listing {
            return Ok(None);
        }
        serde_json::from_value(self.output.clone())
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: format!("{HISTORY_KEY}/{}", self.id),
                source,
            })
    }
}

/// Newest-first list stored under one key and capped in length.
fn prepend_capped<T, S>(store: &S, key: &str, item: &T, cap: usize) -> StoreResult<()>
where
    T: Serialize + DeserializeOwned + Clone,
    S: KeyValueStore + ?Sized,
{
    store.update(key, &mut |current: Option<&str>| {
        let mut items: Vec<T> = parse_or_default(key, current);
        items.insert(0, item.clone());
        items.truncate(cap);
        to_json(key, &items)
    })
}

/// Capped extraction history.
pub struct History<S> {
    store: S,
    max_items: usize,
}

impl<S: KeyValueStore> History<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_items: MAX_ENTRIES,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// All entries, newest first.
    pub fn list(&self) -> StoreResult<Vec<HistoryItem>> {
        read_json(&self.store, HISTORY_KEY)
    }

    pub fn list_by_kind(&self, kind: HistoryKind) -> StoreResult<Vec<HistoryItem>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|item| item.kind == kind)
            .collect())
    }

    /// Record an extraction and return the stored entry.
    pub fn add<T: Serialize>(
        &self,
        kind: HistoryKind,
        input_text: &str,
        output: &T,
    ) -> StoreResult<HistoryItem> {
        let output = serde_json::to_value(output).map_err(|source| StoreError::Serde {
            key: HISTORY_KEY.to_string(),
            source,
        })?;
        let item = HistoryItem {
            id: Uuid::new_v4().to_string(),
            timestamp: now_millis(),
            kind,
            input_text: input_text.to_string(),
            output,
        };
        prepend_capped(&self.store, HISTORY_KEY, &item, self.max_items)?;
        debug!("Saved history entry {}", item.id);
        Ok(item)
    }

    /// Find an entry by full id or by an id prefix that matches exactly one entry.
    pub fn find(&self, id: &str) -> StoreResult<Option<HistoryItem>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        let mut matches: Vec<HistoryItem> = self
            .list()?
            .into_iter()
            .filter(|item| item.id.starts_with(id))
            .collect();
        if let Some(pos) = matches.iter().position(|item| item.id == id) {
            return Ok(Some(matches.swap_remove(pos)));
        }
        Ok(if matches.len() == 1 { matches.pop() } else { None })
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(HISTORY_KEY)
    }
}

/// A field where the user corrected the extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: FieldKey,
    pub ai_value: String,
    pub user_value: String,
}

/// Compare extracted fields with the record the user finally kept.
pub fn diff_records(extracted: &ExtractedFields, user: &AgreementRecord) -> Vec<FieldDiff> {
    FieldKey::ALL
        .iter()
        .filter_map(|key| {
            let ai_value = extracted.get(*key).unwrap_or_default().trim();
            let user_value = user.get(*key).trim();
            (ai_value != user_value).then(|| FieldDiff {
                field: *key,
                ai_value: ai_value.to_string(),
                user_value: user_value.to_string(),
            })
        })
        .collect()
}

/// One batch of corrections with the suggestion derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationLogEntry {
    pub id: String,
    pub timestamp: i64,
    pub diffs: Vec<FieldDiff>,
    pub suggestion: String,
    pub email_snippet: String,
}

impl OptimizationLogEntry {
    /// New entry stamped now, or `None` when there is nothing to record.
    pub fn new(source_text: &str, diffs: Vec<FieldDiff>, suggestion: &str) -> Option<Self> {
        if diffs.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4().to_string(),
            timestamp: now_millis(),
            diffs,
            suggestion: suggestion.to_string(),
            email_snippet: source_text.chars().take(SNIPPET_CHARS).collect(),
        })
    }
}

/// Capped log of user corrections, newest first.
pub struct OptimizationLog<S> {
    store: S,
    max_items: usize,
}

impl<S: KeyValueStore> OptimizationLog<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_items: MAX_ENTRIES,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn list(&self) -> StoreResult<Vec<OptimizationLogEntry>> {
        read_json(&self.store, OPTIMIZATION_LOG_KEY)
    }

    /// Record corrections. Nothing is stored when `diffs` is empty.
    pub fn add(
        &self,
        source_text: &str,
        diffs: Vec<FieldDiff>,
        suggestion: &str,
    ) -> StoreResult<Option<OptimizationLogEntry>> {
        let Some(entry) = OptimizationLogEntry::new(source_text, diffs, suggestion) else {
            return Ok(None);
        };
        prepend_capped(&self.store, OPTIMIZATION_LOG_KEY, &entry, self.max_items)?;
        info!("Logged {} corrected field(s)", entry.diffs.len());
        Ok(Some(entry))
    }

    /// Diff an extraction against the record the user kept and log the result.
    ///
    /// Without a `suggestion` the entry carries a plain summary of the diffs.
    pub fn record_correction(
        &self,
        source_text: &str,
        extracted: &ExtractedFields,
        user: &AgreementRecord,
        suggestion: Option<&str>,
    ) -> StoreResult<Option<OptimizationLogEntry>> {
        let diffs = diff_records(extracted, user);
        let suggestion = match suggestion {
            Some(text) => text.to_string(),
            None => offline_suggestion(&diffs),
        };
        self.add(source_text, diffs, &suggestion)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(OPTIMIZATION_LOG_KEY)
    }
}
