//! HTTP implementation of [`RemoteLogApi`] using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use sphere_core::config::api::ApiConfig;
use sphere_core::error::AppError;
use sphere_core::types::response::ApiEnvelope;

use super::wire::{IngestRequest, IpData, LogListData, RemoteLogRow};
use super::{RemoteError, RemoteLogApi};

/// Backend client. Every call is bounded by the configured request timeout.
#[derive(Debug, Clone)]
pub struct HttpLogApi {
    client: Client,
    base_url: String,
    config: ApiConfig,
}

impl HttpLogApi {
    /// Create a client for `config.base_url`.
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::configuration("api.base_url is not set"))?;

        let client = Client::builder()
            .user_agent(concat!("study-sphere/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config: config.clone(),
        })
    }

    fn timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the `{success, data, message}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, RemoteError> {
        let timeout = self.timeout();
        let call = async {
            let response = builder
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RemoteError::Status(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;

            serde_json::from_slice::<ApiEnvelope<T>>(&body)
                .map_err(|e| RemoteError::Malformed(e.to_string()))
        };

        let envelope = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| RemoteError::Timeout(timeout))??;

        if !envelope.success {
            return Err(RemoteError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "no message".to_string()),
            ));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl RemoteLogApi for HttpLogApi {
    async fn ingest(&self, request: &IngestRequest) -> Result<RemoteLogRow, RemoteError> {
        let builder = self
            .request(Method::POST, &self.config.ingest_path)
            .json(request);
        let envelope = self.send::<RemoteLogRow>(builder).await?;
        debug!(action = %request.action, "Operation log accepted by backend");
        Ok(envelope.data.unwrap_or_default())
    }

    async fn list(&self) -> Result<Vec<RemoteLogRow>, RemoteError> {
        let builder = self.request(Method::GET, &self.config.list_path);
        let envelope = self.send::<LogListData>(builder).await?;
        Ok(envelope.data.unwrap_or_default().logs)
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        let builder = self.request(Method::DELETE, &self.config.clear_path);
        self.send::<serde_json::Value>(builder).await?;
        Ok(())
    }

    async fn client_ip(&self) -> Result<String, RemoteError> {
        let builder = self.request(Method::GET, &self.config.ip_path);
        let envelope = self.send::<IpData>(builder).await?;
        envelope
            .data
            .map(|d| d.ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| RemoteError::Malformed("missing data.ip".to_string()))
    }
}
