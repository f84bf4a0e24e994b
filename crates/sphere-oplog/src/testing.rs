//! In-memory backend double shared by unit tests.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::clock::Clock;
use crate::remote::{IngestRequest, RemoteError, RemoteLogApi, RemoteLogRow};

#[derive(Debug, Default)]
pub struct FakeRemote {
    online: AtomicBool,
    ip: Option<String>,
    clock: Option<Arc<dyn Clock>>,
    rows: Mutex<Vec<RemoteLogRow>>,
    next_id: AtomicUsize,
    ingest_calls: AtomicUsize,
    ip_calls: AtomicUsize,
}

impl FakeRemote {
    /// An offline backend: every log call fails, no IP.
    pub fn new() -> Self {
        Self::default()
    }

    /// An online backend accepting writes.
    pub fn online() -> Self {
        let fake = Self::default();
        fake.set_online(true);
        fake
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    /// Stamp stored rows with `clock` instead of leaving `created_at` empty.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn push_row(&self, row: RemoteLogRow) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn stored(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn ingest_calls(&self) -> usize {
        self.ingest_calls.load(Ordering::SeqCst)
    }

    pub fn ip_calls(&self) -> usize {
        self.ip_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Transport("connection refused".into()))
        }
    }
}

#[async_trait]
impl RemoteLogApi for FakeRemote {
    async fn ingest(&self, request: &IngestRequest) -> Result<RemoteLogRow, RemoteError> {
        self.ingest_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = RemoteLogRow {
            id: Some(json!(id)),
            admin_id: Some(json!(request.actor_id)),
            admin_name: Some(request.actor_name.clone()),
            action: Some(request.action.clone()),
            details: request.details.clone().map(serde_json::Value::String),
            created_at: self.clock.as_ref().map(|c| c.now().to_rfc3339()),
            ip_address: Some(request.ip_address.clone()),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<RemoteLogRow>, RemoteError> {
        self.check_online()?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        self.check_online()?;
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    async fn client_ip(&self) -> Result<String, RemoteError> {
        self.ip_calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .clone()
            .ok_or_else(|| RemoteError::Transport("connection refused".into()))
    }
}
