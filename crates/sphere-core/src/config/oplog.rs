//! Operation log recorder configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Local cache backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local map; lost when the process exits.
    Memory,
    /// One JSON file per key under [`OplogConfig::data_dir`].
    #[default]
    File,
}

/// Tuning for deduplication, retention and IP resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OplogConfig {
    /// Identical `(action, details)` calls closer than this are dropped.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
    /// Suppressor entries older than this are purged.
    #[serde(default = "default_dedup_horizon")]
    pub dedup_horizon_seconds: u64,
    /// Maximum number of entries kept in the local cache.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Maximum age of entries kept in the local cache.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    /// How long a resolved client IP is reused.
    #[serde(default = "default_ip_cache")]
    pub ip_cache_seconds: u64,
    /// Hard deadline for the local network probe.
    #[serde(default = "default_probe_timeout")]
    pub ip_probe_timeout_ms: u64,
    /// Local cache backend.
    #[serde(default)]
    pub store: StoreKind,
    /// Directory used by the file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Key under which the serialized log list is stored.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl OplogConfig {
    /// Dedup window as a [`Duration`].
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    /// Suppressor cleanup horizon as a [`Duration`].
    pub fn dedup_horizon(&self) -> Duration {
        Duration::from_secs(self.dedup_horizon_seconds)
    }

    /// IP cache validity as a [`Duration`].
    pub fn ip_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ip_cache_seconds)
    }

    /// Local probe deadline as a [`Duration`].
    pub fn ip_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.ip_probe_timeout_ms)
    }
}

impl Default for OplogConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window(),
            dedup_horizon_seconds: default_dedup_horizon(),
            max_entries: default_max_entries(),
            max_age_days: default_max_age_days(),
            ip_cache_seconds: default_ip_cache(),
            ip_probe_timeout_ms: default_probe_timeout(),
            store: StoreKind::default(),
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
        }
    }
}

fn default_dedup_window() -> u64 {
    3000
}

fn default_dedup_horizon() -> u64 {
    300
}

fn default_max_entries() -> usize {
    100
}

fn default_max_age_days() -> u32 {
    30
}

fn default_ip_cache() -> u64 {
    300
}

fn default_probe_timeout() -> u64 {
    3000
}

fn default_data_dir() -> String {
    "data/oplog".to_string()
}

fn default_storage_key() -> String {
    "operation_logs".to_string()
}
