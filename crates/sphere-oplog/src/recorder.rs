//! The operation log recorder.
//!
//! A [`LogRecorder`] owns everything that used to be process-wide state
//! (the dedup map, the IP cache, the local cache handle), so independent
//! recorders never interfere with each other.
//!
//! Per call, [`LogRecorder::record`] moves through
//! `START -> SUPPRESSED` or `START -> REMOTE_ATTEMPT -> REMOTE_OK | LOCAL_FALLBACK`.
//! The suppression decision is made before the first await point, so it
//! reflects call order even when completions race.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use sphere_core::config::AppConfig;
use sphere_core::config::oplog::OplogConfig;
use sphere_core::result::AppResult;
use sphere_core::traits::identity::IdentityProvider;
use sphere_core::traits::store::KeyValueStore;
use sphere_core::types::actor::Actor;

use crate::clock::{Clock, SystemClock};
use crate::csv;
use crate::dedup::DuplicateSuppressor;
use crate::entry::{LogEntry, RecordRequest};
use crate::identity::StaticIdentity;
use crate::ip::{IpProbe, IpResolver, UdpRouteProbe};
use crate::remote::{IngestRequest, OfflineLogApi, RemoteLogApi};
use crate::retention::RetentionPolicy;
use crate::store::{LocalLogCache, MemoryStore};

/// Result of one [`LogRecorder::record`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Duplicate inside the dedup window; nothing was written.
    Skipped,
    /// Accepted by the backend and mirrored locally.
    Remote(LogEntry),
    /// Backend unavailable; recorded in the local cache only.
    Local(LogEntry),
}

impl RecordOutcome {
    /// The recorded entry, unless the call was skipped.
    pub fn entry(&self) -> Option<&LogEntry> {
        match self {
            Self::Skipped => None,
            Self::Remote(entry) | Self::Local(entry) => Some(entry),
        }
    }

    /// Whether the call was dropped as a duplicate.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// Backend rows merged with local-only entries.
    Remote,
    /// Backend unreachable; local cache only.
    Local,
}

/// Result of [`LogRecorder::list`].
#[derive(Debug, Clone)]
pub struct LogListing {
    /// Entries, newest first.
    pub entries: Vec<LogEntry>,
    /// Where they came from.
    pub source: ListSource,
}

/// Result of [`LogRecorder::clear_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// The backend acknowledged the clear.
    pub remote: bool,
    /// The local cache was emptied.
    pub local: bool,
}

impl ClearOutcome {
    /// Both stores were cleared.
    pub fn is_complete(&self) -> bool {
        self.remote && self.local
    }
}

/// Audit-log writer with deduplication, IP annotation and a local fallback.
#[derive(Debug)]
pub struct LogRecorder {
    remote: Arc<dyn RemoteLogApi>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    suppressor: DuplicateSuppressor,
    ip: IpResolver,
    cache: LocalLogCache,
}

impl LogRecorder {
    /// Start building a recorder tuned by `config`.
    pub fn builder(config: &OplogConfig) -> LogRecorderBuilder {
        LogRecorderBuilder::new(config.clone())
    }

    /// Build a recorder from the application configuration.
    ///
    /// Uses the HTTP backend when `api.base_url` is set and the `http`
    /// feature is enabled; otherwise runs offline on the local cache.
    pub async fn from_config(
        config: &AppConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> AppResult<Self> {
        let store = crate::store::open_store(&config.oplog).await?;
        let remote = remote_from_config(config)?;
        info!(
            store = store.store_type(),
            online = config.api.base_url.is_some(),
            "Operation log recorder initialized"
        );
        Ok(Self::builder(&config.oplog)
            .remote(remote)
            .store(store)
            .identity(identity)
            .build())
    }

    /// Record one operation.
    ///
    /// Only a blank `action` is reported as an error. Backend and local
    /// storage failures degrade to the local fallback and are logged.
    #[instrument(skip(self, request), fields(action = %request.action))]
    pub async fn record(&self, request: RecordRequest) -> AppResult<RecordOutcome> {
        request.validate()?;

        let details = request.normalized_details();
        let key = DuplicateSuppressor::make_key(&request.action, details.as_deref());
        if self.suppressor.should_suppress(&key, self.clock.now()) {
            debug!("Duplicate operation log suppressed");
            return Ok(RecordOutcome::Skipped);
        }

        let actor = request
            .actor
            .clone()
            .or_else(|| self.identity.current_actor())
            .unwrap_or_else(Actor::system);
        let ip_address = self.ip.resolve(request.ip_address.as_deref()).await;

        let payload = IngestRequest {
            actor_id: actor.id,
            actor_name: actor.name,
            action: request.action,
            details,
            ip_address,
        };

        let outcome = match self.remote.ingest(&payload).await {
            Ok(row) => RecordOutcome::Remote(row.into_entry(&payload, self.clock.now())),
            Err(e) => {
                warn!(error = %e, "Backend rejected operation log, keeping it locally");
                RecordOutcome::Local(self.local_entry(payload))
            }
        };

        if let Some(entry) = outcome.entry() {
            if let Err(e) = self.cache.append(entry.clone(), self.clock.now()).await {
                error!(error = %e, "Failed to write local operation log");
            }
        }

        Ok(outcome)
    }

    fn local_entry(&self, payload: IngestRequest) -> LogEntry {
        LogEntry {
            id: Uuid::now_v7().to_string(),
            actor_id: payload.actor_id,
            actor_name: payload.actor_name,
            action: payload.action,
            details: payload.details,
            timestamp: self.clock.now(),
            ip_address: payload.ip_address,
        }
    }

    /// Fetch the log, preferring the backend.
    ///
    /// Backend rows are merged with local-only entries and written back to
    /// the local cache. If the backend fails, the local cache is returned.
    pub async fn list(&self) -> LogListing {
        match self.remote.list().await {
            Ok(rows) => {
                let total = rows.len();
                let incoming: Vec<LogEntry> = rows.iter().filter_map(|r| r.to_entry()).collect();
                if incoming.len() < total {
                    warn!(
                        skipped = total - incoming.len(),
                        "Ignoring backend log rows without id, action or timestamp"
                    );
                }

                let now = self.clock.now();
                let entries = match self.cache.merge(incoming.clone(), now).await {
                    Ok(merged) => merged,
                    Err(e) => {
                        error!(error = %e, "Failed to refresh local operation log");
                        self.cache.retention().apply(incoming, now)
                    }
                };
                LogListing {
                    entries,
                    source: ListSource::Remote,
                }
            }
            Err(e) => {
                warn!(error = %e, "Backend log listing failed, using local cache");
                LogListing {
                    entries: self.local_entries().await,
                    source: ListSource::Local,
                }
            }
        }
    }

    /// The local cache, trimmed, newest first.
    pub async fn local_entries(&self) -> Vec<LogEntry> {
        self.cache.entries(self.clock.now()).await
    }

    /// Clear the backend log and the local cache.
    ///
    /// The local cache is cleared even when the backend call fails, and the
    /// dedup state is forgotten.
    pub async fn clear_all(&self) -> ClearOutcome {
        let remote = match self.remote.clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Backend log clear failed");
                false
            }
        };
        let local = match self.cache.clear().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to clear local operation log");
                false
            }
        };
        self.suppressor.reset();
        info!(remote, local, "Operation logs cleared");
        ClearOutcome { remote, local }
    }

    /// CSV export of the entries [`LogRecorder::list`] would return.
    ///
    /// Read-only: backend rows are merged with the local cache in memory and
    /// the cache is not rewritten.
    pub async fn export_csv(&self) -> String {
        let now = self.clock.now();
        let entries = match self.remote.list().await {
            Ok(rows) => {
                let incoming: Vec<LogEntry> = rows.iter().filter_map(|r| r.to_entry()).collect();
                self.cache.preview_merge(incoming, now).await
            }
            Err(e) => {
                warn!(error = %e, "Backend log listing failed, exporting local cache");
                self.cache.entries(now).await
            }
        };
        csv::export(&entries)
    }

    /// Resolve the client IP as [`LogRecorder::record`] would.
    pub async fn resolve_ip(&self, explicit: Option<&str>) -> String {
        self.ip.resolve(explicit).await
    }
}

#[cfg(feature = "http")]
fn remote_from_config(config: &AppConfig) -> AppResult<Arc<dyn RemoteLogApi>> {
    if config.api.base_url.is_none() {
        return Ok(Arc::new(OfflineLogApi));
    }
    Ok(Arc::new(crate::remote::http::HttpLogApi::new(&config.api)?))
}

#[cfg(not(feature = "http"))]
fn remote_from_config(config: &AppConfig) -> AppResult<Arc<dyn RemoteLogApi>> {
    if config.api.base_url.is_some() {
        warn!("api.base_url is set but the http feature is disabled; running offline");
    }
    Ok(Arc::new(OfflineLogApi))
}

/// Builder for [`LogRecorder`]. Unset collaborators default to an offline
/// backend, an in-memory store, an anonymous identity, the system clock
/// and the UDP route probe.
#[derive(Debug)]
pub struct LogRecorderBuilder {
    config: OplogConfig,
    remote: Option<Arc<dyn RemoteLogApi>>,
    store: Option<Arc<dyn KeyValueStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    clock: Option<Arc<dyn Clock>>,
    probe: Option<Arc<dyn IpProbe>>,
}

impl LogRecorderBuilder {
    fn new(config: OplogConfig) -> Self {
        Self {
            config,
            remote: None,
            store: None,
            identity: None,
            clock: None,
            probe: None,
        }
    }

    /// Backend API client.
    pub fn remote(mut self, remote: Arc<dyn RemoteLogApi>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Key-value store for the local cache.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Identity provider.
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Local IP probe.
    pub fn probe(mut self, probe: Arc<dyn IpProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Assemble the recorder.
    pub fn build(self) -> LogRecorder {
        let config = self.config;
        let remote = self.remote.unwrap_or_else(|| Arc::new(OfflineLogApi));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(StaticIdentity::anonymous()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(UdpRouteProbe::default()));

        let ip = IpResolver::new(
            Arc::clone(&remote),
            probe,
            Arc::clone(&clock),
            config.ip_cache_ttl(),
            config.ip_probe_timeout(),
        );
        let cache = LocalLogCache::new(
            store,
            config.storage_key.clone(),
            RetentionPolicy::from_config(&config),
        );

        LogRecorder {
            remote,
            identity,
            clock,
            suppressor: DuplicateSuppressor::new(config.dedup_window(), config.dedup_horizon()),
            ip,
            cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::entry::UNKNOWN_IP;
    use crate::identity::SessionIdentity;
    use crate::ip::NoProbe;
    use crate::remote::RemoteLogRow;
    use crate::testing::FakeRemote;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use sphere_core::error::ErrorKind;

    struct Harness {
        recorder: LogRecorder,
        remote: Arc<FakeRemote>,
        clock: Arc<ManualClock>,
        session: Arc<SessionIdentity>,
        store: Arc<MemoryStore>,
    }

    fn start() -> DateTime<Utc> {
        "2024-04-01T09:00:00Z".parse().unwrap()
    }

    fn harness(remote: FakeRemote) -> Harness {
        let clock = Arc::new(ManualClock::new(start()));
        let remote = Arc::new(remote.with_clock(clock.clone()));
        let session = Arc::new(SessionIdentity::new());
        let store = Arc::new(MemoryStore::new());
        let recorder = LogRecorder::builder(&OplogConfig::default())
            .remote(remote.clone())
            .store(store.clone())
            .identity(session.clone())
            .clock(clock.clone())
            .probe(Arc::new(NoProbe))
            .build();
        Harness {
            recorder,
            remote,
            clock,
            session,
            store,
        }
    }

    #[tokio::test]
    async fn test_immediate_duplicate_adds_one_entry() {
        let h = harness(FakeRemote::new());

        let first = h
            .recorder
            .record(RecordRequest::new("ログイン").details("userA成功"))
            .await
            .unwrap();
        let second = h
            .recorder
            .record(RecordRequest::new("ログイン").details("userA成功"))
            .await
            .unwrap();

        assert!(matches!(first, RecordOutcome::Local(_)));
        assert!(second.is_skipped());
        assert_eq!(h.recorder.local_entries().await.len(), 1);
        assert_eq!(h.remote.ingest_calls(), 1);
    }

    #[tokio::test]
    async fn test_window_elapsed_records_again() {
        let h = harness(FakeRemote::new());
        let req = || RecordRequest::new("ログイン").details("userA成功");

        h.recorder.record(req()).await.unwrap();
        h.clock.advance_ms(2999);
        assert!(h.recorder.record(req()).await.unwrap().is_skipped());
        h.clock.advance_ms(1);
        assert!(!h.recorder.record(req()).await.unwrap().is_skipped());

        assert_eq!(h.recorder.local_entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_same_action_different_details_not_suppressed() {
        let h = harness(FakeRemote::new());

        h.recorder
            .record(RecordRequest::new("コース作成").details("数学"))
            .await
            .unwrap();
        let other = h
            .recorder
            .record(RecordRequest::new("コース作成").details("英語"))
            .await
            .unwrap();

        assert!(!other.is_skipped());
        assert_eq!(h.recorder.local_entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_structured_details_with_reordered_fields_are_duplicates() {
        let h = harness(FakeRemote::new());

        h.recorder
            .record(RecordRequest::new("評価更新").details(json!({"student": 4, "score": 80})))
            .await
            .unwrap();
        let again = h
            .recorder
            .record(RecordRequest::new("評価更新").details(json!({"score": 80, "student": 4})))
            .await
            .unwrap();

        assert!(again.is_skipped());
    }

    #[tokio::test]
    async fn test_retention_keeps_latest_hundred() {
        let h = harness(FakeRemote::new());

        for i in 0..150 {
            h.recorder
                .record(RecordRequest::new("ログイン").details(format!("#{i}")))
                .await
                .unwrap();
            h.clock.advance_ms(3001);
        }

        let entries = h.recorder.local_entries().await;
        assert_eq!(entries.len(), 100);
        assert_eq!(entries.first().unwrap().details.as_deref(), Some("#149"));
        assert_eq!(entries.last().unwrap().details.as_deref(), Some("#50"));
        assert!(entries.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_old_entries_expire() {
        let h = harness(FakeRemote::new());

        h.recorder.record(RecordRequest::new("古い操作")).await.unwrap();
        h.clock.advance(chrono::Duration::days(31));
        h.recorder.record(RecordRequest::new("新しい操作")).await.unwrap();

        let entries = h.recorder.local_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "新しい操作");
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local_entry() {
        let h = harness(FakeRemote::new());

        let outcome = h.recorder.record(RecordRequest::new("ログアウト")).await.unwrap();

        let RecordOutcome::Local(entry) = outcome else {
            panic!("expected local fallback");
        };
        assert!(Uuid::parse_str(&entry.id).is_ok());
        assert_eq!(entry.timestamp, start());
        assert_eq!(h.recorder.local_entries().await, vec![entry]);
    }

    #[tokio::test]
    async fn test_remote_success_uses_server_id() {
        let h = harness(FakeRemote::online());
        h.session.sign_in(Actor::new("8", "高橋"));

        let outcome = h.recorder.record(RecordRequest::new("コース作成")).await.unwrap();

        let RecordOutcome::Remote(entry) = outcome else {
            panic!("expected remote outcome");
        };
        assert_eq!(entry.id, "1");
        assert_eq!(entry.actor_name, "高橋");
        assert_eq!(h.remote.stored(), 1);
        assert_eq!(h.recorder.local_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_call_uses_system_actor() {
        let h = harness(FakeRemote::new());

        let outcome = h.recorder.record(RecordRequest::new("自動処理")).await.unwrap();

        let entry = outcome.entry().unwrap();
        assert_eq!(entry.actor_id, "system");
        assert_eq!(entry.actor_name, "unknown");
        assert_eq!(entry.ip_address, UNKNOWN_IP);
    }

    #[tokio::test]
    async fn test_explicit_overrides_win() {
        let h = harness(FakeRemote::new());
        h.session.sign_in(Actor::new("8", "高橋"));

        let outcome = h
            .recorder
            .record(
                RecordRequest::new("ログイン")
                    .actor(Actor::new("99", "代理"))
                    .ip_address("198.51.100.2"),
            )
            .await
            .unwrap();

        let entry = outcome.entry().unwrap();
        assert_eq!(entry.actor_id, "99");
        assert_eq!(entry.ip_address, "198.51.100.2");
    }

    #[tokio::test]
    async fn test_blank_action_is_rejected() {
        let h = harness(FakeRemote::online());

        let err = h.recorder.record(RecordRequest::new(" ")).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(h.remote.ingest_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_prefers_backend_and_keeps_local_only_entries() {
        let h = harness(FakeRemote::new());
        h.recorder.record(RecordRequest::new("オフライン操作")).await.unwrap();

        h.remote.set_online(true);
        h.clock.advance_ms(5000);
        h.remote.push_row(RemoteLogRow {
            id: Some(json!(500)),
            admin_id: Some(json!(2)),
            admin_name: Some("伊藤".into()),
            action: Some("ログイン".into()),
            details: None,
            created_at: Some(h.clock.now().to_rfc3339()),
            ip_address: Some("10.0.0.2".into()),
        });

        let listing = h.recorder.list().await;

        assert_eq!(listing.source, ListSource::Remote);
        let actions: Vec<&str> = listing.entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["ログイン", "オフライン操作"]);
        assert_eq!(h.recorder.local_entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_list_falls_back_to_local_cache() {
        let h = harness(FakeRemote::new());
        h.recorder.record(RecordRequest::new("ログイン")).await.unwrap();

        let listing = h.recorder.list().await;

        assert_eq!(listing.source, ListSource::Local);
        assert_eq!(listing.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_local_even_if_backend_fails() {
        let h = harness(FakeRemote::new());
        h.recorder.record(RecordRequest::new("ログイン")).await.unwrap();

        let outcome = h.recorder.clear_all().await;

        assert!(!outcome.remote);
        assert!(outcome.local);
        assert!(!outcome.is_complete());
        assert!(h.recorder.local_entries().await.is_empty());
        assert!(!h.store.exists("operation_logs").await.unwrap());
    }

    #[tokio::test]
    async fn test_export_csv_contains_header_and_rows() {
        let h = harness(FakeRemote::new());
        h.recorder
            .record(RecordRequest::new("コース作成").details("Excel, 初級"))
            .await
            .unwrap();

        let csv = h.recorder.export_csv().await;

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(csv::HEADER));
        assert!(lines.next().unwrap().contains("\"Excel, 初級\""));
    }

    #[tokio::test]
    async fn test_export_csv_leaves_local_cache_untouched() {
        let h = harness(FakeRemote::new());
        h.recorder.record(RecordRequest::new("オフライン操作")).await.unwrap();
        h.remote.set_online(true);
        h.remote.push_row(RemoteLogRow {
            id: Some(json!(77)),
            action: Some("ログイン".into()),
            created_at: Some(h.clock.now().to_rfc3339()),
            ..RemoteLogRow::default()
        });

        let csv = h.recorder.export_csv().await;

        assert!(csv.contains("\"ログイン\""));
        assert!(csv.contains("\"オフライン操作\""));
        assert_eq!(h.recorder.local_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_id_collision_replaces_stale_cached_entry() {
        let h = harness(FakeRemote::online());
        let stale = LogEntry {
            id: "1".into(),
            actor_id: "1".into(),
            actor_name: "管理者".into(),
            action: "古い操作".into(),
            details: None,
            timestamp: start() - chrono::Duration::days(1),
            ip_address: UNKNOWN_IP.into(),
        };
        h.store
            .set("operation_logs", &serde_json::to_string(&vec![stale]).unwrap())
            .await
            .unwrap();

        let outcome = h.recorder.record(RecordRequest::new("新しい操作")).await.unwrap();

        assert_eq!(outcome.entry().map(|e| e.id.as_str()), Some("1"));
        let actions: Vec<String> = h
            .recorder
            .local_entries()
            .await
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["新しい操作".to_string()]);
    }

    #[tokio::test]
    async fn test_independent_recorders_do_not_share_dedup_state() {
        let a = harness(FakeRemote::new());
        let b = harness(FakeRemote::new());

        a.recorder.record(RecordRequest::new("ログイン")).await.unwrap();
        let outcome = b.recorder.record(RecordRequest::new("ログイン")).await.unwrap();

        assert!(!outcome.is_skipped());
    }
}
