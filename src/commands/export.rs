//! `sphere export`: write operation logs as CSV.

use clap::Args;

use sphere_core::error::{AppError, ErrorKind};
use sphere_oplog::LogRecorder;
use sphere_oplog::csv::UTF8_BOM;

use crate::output;

/// Arguments for the export command
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file path; defaults to `operation_logs_<YYYYMMDD>.csv`
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write to stdout instead of a file (no byte-order mark)
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

fn default_file_name() -> String {
    format!("operation_logs_{}.csv", chrono::Local::now().format("%Y%m%d"))
}

/// Execute the export command
pub async fn execute(args: &ExportArgs, recorder: &LogRecorder) -> Result<(), AppError> {
    let csv = recorder.export_csv().await;

    if args.stdout {
        print!("{csv}");
        return Ok(());
    }

    let path = args.output.clone().unwrap_or_else(default_file_name);
    tokio::fs::write(&path, format!("{UTF8_BOM}{csv}"))
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write '{path}'"), e)
        })?;

    output::print_success(&format!("Exported operation logs to '{path}'"));
    Ok(())
}
