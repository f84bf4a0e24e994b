//! In-memory key-value store.

use async_trait::async_trait;
use dashmap::DashMap;

use sphere_core::result::AppResult;
use sphere_core::traits::store::KeyValueStore;

/// Process-local store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries.contains_key(key))
    }
}
