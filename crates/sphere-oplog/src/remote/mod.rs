//! Backend API client for the audit-log endpoints.

#[cfg(feature = "http")]
pub mod http;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use sphere_core::error::{AppError, ErrorKind};

pub use self::wire::{IngestRequest, RemoteLogRow};

/// Why a backend call failed.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No backend URL is configured.
    #[error("backend API is not configured")]
    NotConfigured,
    /// Connection, TLS or body transfer failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The call did not finish within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-2xx status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The backend answered `{success: false}`.
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    /// The body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        let kind = match err {
            RemoteError::Timeout(_) => ErrorKind::Timeout,
            RemoteError::NotConfigured => ErrorKind::Configuration,
            _ => ErrorKind::ExternalService,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

/// The four backend endpoints the recorder talks to.
#[async_trait]
pub trait RemoteLogApi: Send + Sync + std::fmt::Debug + 'static {
    /// Submit one entry; returns the stored row (server id and timestamp).
    async fn ingest(&self, request: &IngestRequest) -> Result<RemoteLogRow, RemoteError>;

    /// Fetch the stored log rows.
    async fn list(&self) -> Result<Vec<RemoteLogRow>, RemoteError>;

    /// Delete every stored row.
    async fn clear(&self) -> Result<(), RemoteError>;

    /// The caller's IP address as seen by the backend.
    async fn client_ip(&self) -> Result<String, RemoteError>;
}

/// Stand-in used when no backend is configured; every call fails fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLogApi;

#[async_trait]
impl RemoteLogApi for OfflineLogApi {
    async fn ingest(&self, _request: &IngestRequest) -> Result<RemoteLogRow, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn list(&self) -> Result<Vec<RemoteLogRow>, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn client_ip(&self) -> Result<String, RemoteError> {
        Err(RemoteError::NotConfigured)
    }
}
