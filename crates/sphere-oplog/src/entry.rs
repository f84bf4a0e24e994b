//! Operation log entry model and the write request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use sphere_core::types::actor::Actor;

/// Sentinel IP recorded when the client address could not be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// An immutable operation log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Server-assigned id, or a locally generated UUID v7.
    pub id: String,
    /// Acting user id (`"system"` when anonymous).
    pub actor_id: String,
    /// Acting user display name.
    pub actor_name: String,
    /// Short action category, e.g. `"ログイン"` or `"コース作成"`.
    pub action: String,
    /// Human-readable description, already normalized to text.
    #[serde(default)]
    pub details: Option<String>,
    /// When the action was recorded.
    pub timestamp: DateTime<Utc>,
    /// Best-effort client IP, or [`UNKNOWN_IP`].
    pub ip_address: String,
}

/// Details attached to a log call.
///
/// Callers pass either free text or a structured record; both are reduced to
/// a single string by [`LogDetails::normalize`] before they reach the
/// suppressor or any store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogDetails {
    /// Free text.
    Text(String),
    /// A structured JSON record.
    Structured(Value),
}

impl LogDetails {
    /// Reduce to the stored string form.
    ///
    /// Blank text and JSON `null` normalize to `None`. A JSON string is
    /// stored unquoted. Other JSON values are rendered canonically with
    /// object keys sorted, so field order never affects the result.
    pub fn normalize(&self) -> Option<String> {
        match self {
            Self::Text(text) if text.trim().is_empty() => None,
            Self::Text(text) => Some(text.clone()),
            Self::Structured(Value::Null) => None,
            Self::Structured(Value::String(text)) => {
                Self::Text(text.clone()).normalize()
            }
            Self::Structured(value) => Some(canonical_json(value)),
        }
    }
}

impl From<&str> for LogDetails {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LogDetails {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for LogDetails {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Render JSON with object keys in sorted order at every depth.
///
/// Sorts explicitly instead of relying on `serde_json::Map` being a
/// `BTreeMap`, which stops holding once any crate in the build enables
/// serde_json's `preserve_order` feature.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A request to record one operation.
#[derive(Debug, Clone, Default, Validate)]
pub struct RecordRequest {
    /// Action category. Must contain a non-whitespace character.
    #[validate(custom(function = "validate_action"))]
    pub action: String,
    /// Optional details.
    pub details: Option<LogDetails>,
    /// Overrides the identity provider when set.
    pub actor: Option<Actor>,
    /// Overrides IP resolution when set to something other than `"unknown"`.
    pub ip_address: Option<String>,
}

impl RecordRequest {
    /// Start a request for `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Attach details.
    pub fn details(mut self, details: impl Into<LogDetails>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Record on behalf of an explicit actor.
    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Use an explicit client IP.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Details in their stored string form.
    pub fn normalized_details(&self) -> Option<String> {
        self.details.as_ref().and_then(LogDetails::normalize)
    }
}

fn validate_action(action: &str) -> Result<(), ValidationError> {
    if action.trim().is_empty() {
        let mut err = ValidationError::new("blank_action");
        err.message = Some("action must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_details_ignore_field_order() {
        let a = LogDetails::from(json!({"course": "基礎", "id": 3, "tags": [{"b": 1, "a": 2}]}));
        let b = LogDetails::from(json!({"tags": [{"a": 2, "b": 1}], "id": 3, "course": "基礎"}));
        assert_eq!(a.normalize(), b.normalize());
        assert_eq!(
            a.normalize().unwrap(),
            r#"{"course":"基礎","id":3,"tags":[{"a":2,"b":1}]}"#
        );
    }

    #[test]
    fn test_canonical_json_sorts_keys_regardless_of_insertion() {
        let mut map = serde_json::Map::new();
        map.insert("z".into(), json!("最後"));
        map.insert("a".into(), json!({"y": 1, "b": "\"q\""}));
        let rendered = canonical_json(&Value::Object(map));
        assert_eq!(rendered, r#"{"a":{"b":"\"q\"","y":1},"z":"最後"}"#);
    }

    #[test]
    fn test_blank_details_normalize_to_none() {
        assert_eq!(LogDetails::from("   ").normalize(), None);
        assert_eq!(LogDetails::from(Value::Null).normalize(), None);
        assert_eq!(
            LogDetails::from(json!("userA成功")).normalize().as_deref(),
            Some("userA成功")
        );
    }

    #[test]
    fn test_blank_action_fails_validation() {
        assert!(RecordRequest::new("  ").validate().is_err());
        assert!(RecordRequest::new("").validate().is_err());
        assert!(RecordRequest::new("ログイン").validate().is_ok());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = LogEntry {
            id: "1".into(),
            actor_id: "7".into(),
            actor_name: "山田".into(),
            action: "ログイン".into(),
            details: None,
            timestamp: "2024-05-01T00:00:00Z".parse().unwrap(),
            ip_address: UNKNOWN_IP.into(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["actorName"], "山田");
        assert_eq!(value["ipAddress"], "unknown");
    }
}
