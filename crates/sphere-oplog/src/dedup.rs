//! Suppression of identical log calls repeated within a short window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Deduplication key
type DedupKey = String;

/// Drops repeated `(action, details)` calls, e.g. a submit handler that
/// fires twice on re-render.
#[derive(Debug)]
pub struct DuplicateSuppressor {
    /// Window duration
    window: chrono::Duration,
    /// Entries older than this are purged on every check
    horizon: chrono::Duration,
    /// Last seen time per key
    last_seen: Mutex<HashMap<DedupKey, DateTime<Utc>>>,
}

impl DuplicateSuppressor {
    /// Create a suppressor with the given window and cleanup horizon.
    ///
    /// The horizon is raised to the window if it is shorter, so purging can
    /// never forget a key that is still inside its window.
    pub fn new(window: Duration, horizon: Duration) -> Self {
        let window = to_chrono(window);
        let horizon = to_chrono(horizon).max(window);
        Self {
            window,
            horizon,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Build a dedup key from an action and its normalized details.
    pub fn make_key(action: &str, details: Option<&str>) -> DedupKey {
        format!("{}:{}", action, details.unwrap_or_default())
    }

    /// Returns `true` if a call with `key` at `now` is a duplicate.
    ///
    /// A suppressed call does not refresh the key's timestamp, so a burst is
    /// measured from its first call. A call exactly one window later passes.
    pub fn should_suppress(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());

        let horizon = self.horizon;
        map.retain(|_, seen| now.signed_duration_since(*seen) < horizon);

        if let Some(last) = map.get(key) {
            if now.signed_duration_since(*last) < self.window {
                return true;
            }
        }

        map.insert(key.to_string(), now);
        false
    }

    /// Number of keys currently remembered.
    pub fn tracked_keys(&self) -> usize {
        self.last_seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Forget every key.
    pub fn reset(&self) {
        self.last_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
