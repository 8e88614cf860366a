//! Bounded publish history persisted as a JSON snapshot in a key-value store

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Store key holding the history snapshot
pub const HISTORY_KEY: &str = "conversion_history";

/// Maximum number of entries kept
pub const DEFAULT_CAPACITY: usize = 50;

/// One published page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Derived from the creation timestamp (milliseconds since the epoch)
    pub id: String,
    pub title: String,
    /// ISO-8601 creation time
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl HistoryItem {
    pub fn new(title: impl Into<String>, url: Option<String>) -> Self {
        Self::at(Utc::now(), title, url)
    }

    pub fn at(created: DateTime<Utc>, title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: created.timestamp_millis().to_string(),
            title: title.into(),
            date: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            url,
        }
    }
}

/// Minimal string key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store keeping one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Newest-first list of published pages, capped at `capacity`.
///
/// Every mutation overwrites the whole snapshot in the store.
pub struct History<S: KeyValueStore> {
    store: S,
    items: Vec<HistoryItem>,
    capacity: usize,
}

impl<S: KeyValueStore> History<S> {
    /// Rehydrate from the store. A snapshot that is not valid JSON is
    /// discarded with a warning rather than failing startup.
    pub fn load(store: S, capacity: usize) -> Result<Self> {
        let mut items: Vec<HistoryItem> = match store.get(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring unreadable history snapshot: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        items.truncate(capacity);

        Ok(Self {
            store,
            items,
            capacity,
        })
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an entry at the front, evicting the oldest beyond capacity
    pub fn record(&mut self, item: HistoryItem) -> Result<()> {
        self.items.insert(0, item);
        self.items.truncate(self.capacity);
        self.persist()
    }

    /// Remove entries with the given id; returns whether any was removed
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.items)?;
        self.store.set(HISTORY_KEY, &snapshot)
    }
}
