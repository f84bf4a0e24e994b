//! The workspace error type.
//!
//! Library code returns [`AppError`]; component errors (backend transport,
//! store I/O, config parsing) convert into it so `?` works across crate
//! boundaries.

use std::fmt;

use thiserror::Error;

/// Broad category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Something the caller asked for does not exist.
    NotFound,
    /// Caller input was rejected.
    Validation,
    /// Bug or unexpected state.
    Internal,
    /// The local store could not be read or written.
    Storage,
    /// JSON encoding or decoding failed.
    Serialization,
    /// Configuration is missing or malformed.
    Configuration,
    /// The backend API failed or refused the call.
    ExternalService,
    /// A call ran past its deadline.
    Timeout,
}

impl ErrorKind {
    /// Stable upper-case code, as rendered in messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Internal => "INTERNAL",
            Self::Storage => "STORAGE",
            Self::Serialization => "SERIALIZATION",
            Self::Configuration => "CONFIGURATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error with a kind, a message and an optional cause.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category.
    pub kind: ErrorKind,
    /// What went wrong, for humans.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// An error without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// An error wrapping `source`.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether the caller's input was at fault.
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

/// Clones carry the kind and message; the cause is not cloneable and is
/// dropped.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let message = format!("Invalid JSON: {err}");
        Self::with_source(ErrorKind::Serialization, message, err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let message = format!("I/O failure: {err}");
        Self::with_source(ErrorKind::Storage, message, err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        let message = format!("Bad configuration: {err}");
        Self::with_source(ErrorKind::Configuration, message, err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let message = format!("Invalid input: {err}");
        Self::with_source(ErrorKind::Validation, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::storage("disk full");
        assert_eq!(err.to_string(), "STORAGE: disk full");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::from(io);
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse.into();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::ExternalService).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorKind::ExternalService.code()));
    }
}
