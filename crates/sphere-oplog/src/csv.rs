//! CSV export of operation logs.
//!
//! The layout matches what the admin dashboard downloads: a fixed Japanese
//! header row, one quoted row per entry, timestamps in Japan Standard Time.

use chrono::{DateTime, FixedOffset, Utc};

use crate::entry::LogEntry;

/// Header row: timestamp, actor name, action, details, IP.
pub const HEADER: &str = "日時,管理者名,操作,詳細,IPアドレス";

/// Byte-order mark prepended to exported files so spreadsheet tools pick
/// up UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Render `entries` as CSV, CRLF-terminated rows, in the given order.
pub fn export(entries: &[LogEntry]) -> String {
    let mut out = String::with_capacity(64 * (entries.len() + 1));
    out.push_str(HEADER);
    out.push_str("\r\n");
    for entry in entries {
        let fields = [
            format_timestamp(entry.timestamp),
            entry.actor_name.clone(),
            entry.action.clone(),
            entry.details.clone().unwrap_or_default(),
            entry.ip_address.clone(),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Quote a field, doubling embedded quotes.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// `YYYY/MM/DD HH:MM:SS` in JST.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(JST_OFFSET_SECONDS) {
        Some(jst) => ts.with_timezone(&jst).format("%Y/%m/%d %H:%M:%S").to_string(),
        None => ts.format("%Y/%m/%d %H:%M:%S").to_string(),
    }
}
