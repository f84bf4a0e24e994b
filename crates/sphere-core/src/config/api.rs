//! Backend REST API configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the Study Sphere backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g. `http://localhost:5050`).
    /// When unset the recorder runs offline and only uses the local cache.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bearer token sent with every request, if any.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Per-request deadline in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Path of the log-ingestion endpoint (POST).
    #[serde(default = "default_logs_path")]
    pub ingest_path: String,
    /// Path of the log-listing endpoint (GET).
    #[serde(default = "default_logs_path")]
    pub list_path: String,
    /// Path of the log-clear endpoint (DELETE).
    #[serde(default = "default_logs_path")]
    pub clear_path: String,
    /// Path of the client IP lookup endpoint (GET).
    #[serde(default = "default_ip_path")]
    pub ip_path: String,
}

impl ApiConfig {
    /// Request deadline as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            request_timeout_ms: default_request_timeout(),
            ingest_path: default_logs_path(),
            list_path: default_logs_path(),
            clear_path: default_logs_path(),
            ip_path: default_ip_path(),
        }
    }
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_logs_path() -> String {
    "/api/operation-logs".to_string()
}

fn default_ip_path() -> String {
    "/api/client-ip".to_string()
}
