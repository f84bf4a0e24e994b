//! `sphere list`: show operation logs, newest first.

use clap::Args;

use sphere_core::error::AppError;
use sphere_oplog::{ListSource, LogRecorder};

use crate::output::{self, LogRow, OutputFormat};

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Read only the local cache, without contacting the backend
    #[arg(long)]
    pub local: bool,

    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Execute the list command
pub async fn execute(
    args: &ListArgs,
    recorder: &LogRecorder,
    format: OutputFormat,
) -> Result<(), AppError> {
    let entries = if args.local {
        recorder.local_entries().await
    } else {
        let listing = recorder.list().await;
        if listing.source == ListSource::Local {
            output::print_warning("Backend unavailable; showing the local cache");
        }
        listing.entries
    };

    let limit = args.limit.unwrap_or(entries.len());
    let rows: Vec<LogRow> = entries.iter().take(limit).map(LogRow::from).collect();
    output::print_list(&rows, format);
    Ok(())
}
