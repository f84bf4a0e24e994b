//! Best-effort client IP resolution for audit entries.
//!
//! Resolution never fails: every error path ends at [`UNKNOWN_IP`].
//! Order: explicit value, cached value, backend lookup, local probe.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::clock::Clock;
use crate::entry::UNKNOWN_IP;
use crate::remote::RemoteLogApi;

/// Local discovery of the machine's outbound address.
#[async_trait]
pub trait IpProbe: Send + Sync + std::fmt::Debug + 'static {
    /// Try to find the local address; `None` when nothing usable was found.
    async fn probe(&self) -> Option<String>;
}

/// Learns the outbound interface address by "connecting" a UDP socket to a
/// public address. UDP connect only selects a route; nothing is sent.
#[derive(Debug, Clone, Copy)]
pub struct UdpRouteProbe {
    target: SocketAddr,
}

impl UdpRouteProbe {
    /// Probe the route towards `target`.
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }
}

impl Default for UdpRouteProbe {
    fn default() -> Self {
        Self::new(SocketAddr::from(([8, 8, 8, 8], 80)))
    }
}

#[async_trait]
impl IpProbe for UdpRouteProbe {
    async fn probe(&self) -> Option<String> {
        let bind: SocketAddr = match self.target {
            SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
            SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
        };
        let socket = UdpSocket::bind(bind).await.ok()?;
        socket.connect(self.target).await.ok()?;
        let local = socket.local_addr().ok()?.ip();
        usable(local).then(|| local.to_string())
    }
}

fn usable(ip: IpAddr) -> bool {
    !ip.is_unspecified() && !ip.is_loopback()
}

/// A probe that never finds anything (sandboxed hosts, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

#[async_trait]
impl IpProbe for NoProbe {
    async fn probe(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
struct CachedIp {
    ip: String,
    resolved_at: DateTime<Utc>,
}

/// Resolves and memoizes the client IP for one recorder.
#[derive(Debug)]
pub struct IpResolver {
    remote: Arc<dyn RemoteLogApi>,
    probe: Arc<dyn IpProbe>,
    clock: Arc<dyn Clock>,
    cache_ttl: chrono::Duration,
    probe_timeout: Duration,
    cached: Mutex<Option<CachedIp>>,
}

impl IpResolver {
    /// Create a resolver.
    pub fn new(
        remote: Arc<dyn RemoteLogApi>,
        probe: Arc<dyn IpProbe>,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            probe,
            clock,
            cache_ttl: chrono::Duration::from_std(cache_ttl).unwrap_or(chrono::Duration::MAX),
            probe_timeout,
            cached: Mutex::new(None),
        }
    }

    /// Resolve the IP to record.
    ///
    /// An explicit value other than blank or `"unknown"` is returned as-is
    /// and never cached.
    pub async fn resolve(&self, explicit: Option<&str>) -> String {
        if let Some(ip) = explicit.map(str::trim).filter(|ip| is_known(ip)) {
            return ip.to_string();
        }

        if let Some(ip) = self.cached_ip() {
            return ip;
        }

        match self.remote.client_ip().await {
            Ok(ip) if is_known(&ip) => return self.remember(ip),
            Ok(_) => debug!("Backend returned no usable client IP"),
            Err(e) => debug!(error = %e, "Backend IP lookup failed"),
        }

        match tokio::time::timeout(self.probe_timeout, self.probe.probe()).await {
            Ok(Some(ip)) if is_known(&ip) => self.remember(ip),
            Ok(_) => {
                debug!("Local IP probe found nothing");
                UNKNOWN_IP.to_string()
            }
            Err(_) => {
                debug!(timeout = ?self.probe_timeout, "Local IP probe timed out");
                UNKNOWN_IP.to_string()
            }
        }
    }

    /// The cached IP if it is still fresh.
    pub fn cached_ip(&self) -> Option<String> {
        let now = self.clock.now();
        let cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        cached
            .as_ref()
            .filter(|c| now.signed_duration_since(c.resolved_at) < self.cache_ttl)
            .map(|c| c.ip.clone())
    }

    /// Drop the cached IP.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn remember(&self, ip: String) -> String {
        let entry = CachedIp {
            ip: ip.clone(),
            resolved_at: self.clock.now(),
        };
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(entry);
        ip
    }
}

fn is_known(ip: &str) -> bool {
    !ip.is_empty() && !ip.eq_ignore_ascii_case(UNKNOWN_IP)
}
