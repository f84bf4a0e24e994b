//! JSON bodies exchanged with the backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entry::{LogDetails, LogEntry, UNKNOWN_IP};

/// Body of the log-ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    /// Acting user id.
    pub actor_id: String,
    /// Acting user display name.
    pub actor_name: String,
    /// Action category.
    pub action: String,
    /// Normalized details.
    pub details: Option<String>,
    /// Resolved client IP.
    pub ip_address: String,
}

/// One stored row as returned by the backend.
///
/// The listing endpoint uses the database column names (`admin_id`,
/// `created_at`, ...) while the ingestion endpoint echoes the request's
/// camelCase names, so both spellings are accepted. Ids may be numeric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteLogRow {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "actorId")]
    pub admin_id: Option<Value>,
    #[serde(default, alias = "actorName")]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default, alias = "timestamp", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "ipAddress")]
    pub ip_address: Option<String>,
}

/// `data` of the listing response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogListData {
    #[serde(default)]
    pub logs: Vec<RemoteLogRow>,
}

/// `data` of the IP lookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct IpData {
    pub ip: String,
}

impl RemoteLogRow {
    /// Convert a listed row. Rows without an id, an action or a parseable
    /// timestamp are unusable and yield `None`.
    pub fn to_entry(&self) -> Option<LogEntry> {
        let id = self.id.as_ref().and_then(value_to_string)?;
        let action = self.action.clone().filter(|a| !a.trim().is_empty())?;
        let timestamp = self.created_at.as_deref().and_then(parse_timestamp)?;

        Some(LogEntry {
            id,
            actor_id: self
                .admin_id
                .as_ref()
                .and_then(value_to_string)
                .unwrap_or_else(|| sphere_core::types::actor::SYSTEM_ACTOR_ID.to_string()),
            actor_name: self
                .admin_name
                .clone()
                .unwrap_or_else(|| sphere_core::types::actor::UNKNOWN_ACTOR_NAME.to_string()),
            action,
            details: self.normalized_details(),
            timestamp,
            ip_address: self
                .ip_address
                .clone()
                .filter(|ip| !ip.is_empty())
                .unwrap_or_else(|| UNKNOWN_IP.to_string()),
        })
    }

    /// Merge an ingestion acknowledgement with the request that produced it.
    ///
    /// The server's id and timestamp win; anything the server left out is
    /// taken from the request, and a missing id or timestamp is generated
    /// locally.
    pub fn into_entry(self, request: &IngestRequest, now: DateTime<Utc>) -> LogEntry {
        let details = match &self.details {
            Some(_) => self.normalized_details(),
            None => request.details.clone(),
        };
        LogEntry {
            id: self
                .id
                .as_ref()
                .and_then(value_to_string)
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            actor_id: self
                .admin_id
                .as_ref()
                .and_then(value_to_string)
                .unwrap_or_else(|| request.actor_id.clone()),
            actor_name: self
                .admin_name
                .unwrap_or_else(|| request.actor_name.clone()),
            action: self
                .action
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| request.action.clone()),
            details,
            timestamp: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now),
            ip_address: self
                .ip_address
                .filter(|ip| !ip.is_empty())
                .unwrap_or_else(|| request.ip_address.clone()),
        }
    }

    fn normalized_details(&self) -> Option<String> {
        self.details
            .clone()
            .and_then(|d| LogDetails::Structured(d).normalize())
    }
}

/// Render a JSON scalar id as a string. Strings are used as-is, numbers in
/// decimal; anything else is not an id.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T09:30:00.000Z`) and the MySQL
/// `DATETIME` rendering (`2024-05-01 09:30:00`), which is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
