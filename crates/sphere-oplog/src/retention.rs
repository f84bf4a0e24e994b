//! Count and age bounds for the local log cache.

use chrono::{DateTime, Duration, Utc};

use sphere_core::config::oplog::OplogConfig;

use crate::entry::LogEntry;

/// Retention policy applied after every local cache mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_entries: usize,
    max_age: Duration,
}

impl RetentionPolicy {
    /// Create a policy keeping at most `max_entries` entries no older than `max_age`.
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            max_entries,
            max_age,
        }
    }

    /// Build the policy from configuration.
    pub fn from_config(config: &OplogConfig) -> Self {
        Self::new(
            config.max_entries,
            Duration::days(i64::from(config.max_age_days)),
        )
    }

    /// Maximum number of retained entries.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Maximum age of a retained entry.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Apply the age rule, then the count rule, returning entries newest first.
    ///
    /// Entries whose age exceeds the maximum are dropped first; the survivors
    /// are sorted by descending timestamp (stable, so ties keep their order)
    /// and truncated to the newest `max_entries`.
    pub fn apply(&self, mut entries: Vec<LogEntry>, now: DateTime<Utc>) -> Vec<LogEntry> {
        let max_age = self.max_age;
        entries.retain(|e| now.signed_duration_since(e.timestamp) <= max_age);
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(self.max_entries);
        entries
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&OplogConfig::default())
    }
}
