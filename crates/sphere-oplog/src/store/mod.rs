//! The bounded local log cache and its key-value backends.

pub mod file;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, warn};

use sphere_core::config::oplog::{OplogConfig, StoreKind};
use sphere_core::result::AppResult;
use sphere_core::traits::store::KeyValueStore;

use crate::entry::LogEntry;
use crate::retention::RetentionPolicy;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;

/// Open the backend selected by `config.store`.
pub async fn open_store(config: &OplogConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    match config.store {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::File => Ok(Arc::new(FileStore::new(&config.data_dir).await?)),
    }
}

/// The serialized log list under one key, trimmed on every write.
///
/// The whole list is read, modified and written back on each mutation; the
/// internal mutex serializes those cycles so concurrent writers cannot lose
/// each other's entries.
#[derive(Debug)]
pub struct LocalLogCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    retention: RetentionPolicy,
    write_lock: Mutex<()>,
}

impl LocalLogCache {
    /// Create a cache over `store` under `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, retention: RetentionPolicy) -> Self {
        Self {
            store,
            key: key.into(),
            retention,
            write_lock: Mutex::new(()),
        }
    }

    /// The retention policy applied on every write.
    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Read the stored list.
    ///
    /// A missing key is an empty list. A value that does not parse is
    /// logged and treated as empty; the next write replaces it.
    async fn load(&self) -> AppResult<Vec<LogEntry>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<LogEntry>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable local operation log");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, entries: &[LogEntry]) -> AppResult<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(&self.key, &json).await
    }

    /// Current entries, trimmed, newest first. Read failures yield an empty
    /// list.
    pub async fn entries(&self, now: DateTime<Utc>) -> Vec<LogEntry> {
        match self.load().await {
            Ok(entries) => self.retention.apply(entries, now),
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read local operation log");
                Vec::new()
            }
        }
    }

    /// Add one entry and trim. A cached entry with the same id is replaced.
    /// Returns the number of cached entries afterwards.
    pub async fn append(&self, entry: LogEntry, now: DateTime<Utc>) -> AppResult<usize> {
        let _guard = self.write_lock.lock().await;
        let cached = self.load().await?;
        let entries = self.retention.apply(merge_entries(vec![entry], cached), now);
        self.save(&entries).await?;
        Ok(entries.len())
    }

    /// Merge `incoming` into the cache, keeping cached entries whose ids are
    /// not in `incoming`, then trim. Returns the merged list.
    pub async fn merge(&self, incoming: Vec<LogEntry>, now: DateTime<Utc>) -> AppResult<Vec<LogEntry>> {
        let _guard = self.write_lock.lock().await;
        let cached = self.load().await?;
        let merged = self.retention.apply(merge_entries(incoming, cached), now);
        self.save(&merged).await?;
        Ok(merged)
    }

    /// What [`LocalLogCache::merge`] would return, without writing.
    pub async fn preview_merge(&self, incoming: Vec<LogEntry>, now: DateTime<Utc>) -> Vec<LogEntry> {
        let cached = self.entries(now).await;
        self.retention.apply(merge_entries(incoming, cached), now)
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(&self.key).await
    }
}

/// `incoming` followed by the `cached` entries whose ids it does not contain.
fn merge_entries(incoming: Vec<LogEntry>, cached: Vec<LogEntry>) -> Vec<LogEntry> {
    let mut merged = incoming;
    for entry in cached {
        if !merged.iter().any(|e| e.id == entry.id) {
            merged.push(entry);
        }
    }
    merged
}
