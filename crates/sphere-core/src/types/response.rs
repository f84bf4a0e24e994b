//! The `{success, data, message}` envelope returned by the backend API.

use serde::{Deserialize, Serialize};

/// Standard backend response wrapper.
///
/// `data` is optional because failure responses usually omit it, and some
/// endpoints (IP lookup) omit `success` altogether.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the request was successful. Missing means success.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Response data. Missing reads as `None` without requiring `T: Default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Creates a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Creates a failure envelope.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

fn default_success() -> bool {
    true
}
