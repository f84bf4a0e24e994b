//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use sphere_oplog::LogEntry;
use sphere_oplog::csv::format_timestamp;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One log entry as displayed.
#[derive(Debug, Serialize, Tabled)]
pub struct LogRow {
    /// Time (JST)
    #[tabled(rename = "日時")]
    pub time: String,
    /// Actor name
    #[tabled(rename = "管理者名")]
    pub actor: String,
    /// Action
    #[tabled(rename = "操作")]
    pub action: String,
    /// Details
    #[tabled(rename = "詳細")]
    pub details: String,
    /// IP
    #[tabled(rename = "IPアドレス")]
    pub ip: String,
    /// Entry id
    #[tabled(rename = "ID")]
    pub id: String,
}

impl From<&LogEntry> for LogRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            time: format_timestamp(entry.timestamp),
            actor: entry.actor_name.clone(),
            action: entry.action.clone(),
            details: entry.details.clone().unwrap_or_default(),
            ip: entry.ip_address.clone(),
            id: entry.id.clone(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No operation logs.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print one log entry in the selected format
pub fn print_entry(entry: &LogEntry, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let row = LogRow::from(entry);
            print_kv("ID", &row.id);
            print_kv("Time", &row.time);
            print_kv("Actor", &format!("{} ({})", row.actor, entry.actor_id));
            print_kv("Action", &row.action);
            print_kv("Details", &row.details);
            print_kv("IP address", &row.ip);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(entry).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message. Goes to stderr so JSON output stays clean.
pub fn print_warning(msg: &str) {
    eprintln!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{key}:"), value);
}
