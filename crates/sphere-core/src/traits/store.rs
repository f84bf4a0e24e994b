//! Key-value store trait for the persisted local cache.

use async_trait::async_trait;

use crate::result::AppResult;

/// A string key-value store (browser-storage equivalent).
///
/// Values are opaque strings; callers serialize to JSON themselves. Stores
/// make no atomicity promise across a `get` followed by a `set`; callers
/// that read-modify-write must serialize access on their side.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Short backend identifier for logs (e.g. `"memory"`, `"file"`).
    fn store_type(&self) -> &str;

    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
