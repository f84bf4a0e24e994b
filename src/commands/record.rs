//! `sphere record`: write one operation log entry.

use clap::Args;
use serde_json::Value;

use sphere_core::error::AppError;
use sphere_oplog::{LogDetails, LogRecorder, RecordOutcome, RecordRequest};

use crate::output::{self, OutputFormat};

/// Arguments for the record command
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Action category, e.g. "ログイン" or "コース作成"
    pub action: String,

    /// Free-text details
    #[arg(short, long)]
    pub details: Option<String>,

    /// Parse `--details` as a JSON object instead of text
    #[arg(long, requires = "details")]
    pub json: bool,

    /// Client IP to record instead of resolving one
    #[arg(long)]
    pub ip: Option<String>,
}

impl RecordArgs {
    fn request(&self) -> Result<RecordRequest, AppError> {
        let mut request = RecordRequest::new(self.action.as_str());
        if let Some(details) = &self.details {
            let details = if self.json {
                let value: Value = serde_json::from_str(details).map_err(|e| {
                    AppError::validation(format!("--details is not valid JSON: {e}"))
                })?;
                LogDetails::from(value)
            } else {
                LogDetails::from(details.as_str())
            };
            request = request.details(details);
        }
        if let Some(ip) = &self.ip {
            request = request.ip_address(ip.as_str());
        }
        Ok(request)
    }
}

/// Execute the record command
pub async fn execute(
    args: &RecordArgs,
    recorder: &LogRecorder,
    format: OutputFormat,
) -> Result<(), AppError> {
    let outcome = recorder.record(args.request()?).await?;

    match &outcome {
        RecordOutcome::Skipped => {
            output::print_warning("Identical operation recorded moments ago; skipped");
        }
        RecordOutcome::Remote(entry) => {
            if format == OutputFormat::Table {
                output::print_success("Operation recorded");
            }
            output::print_entry(entry, format);
        }
        RecordOutcome::Local(entry) => {
            output::print_warning("Backend unavailable; operation kept in the local cache");
            output::print_entry(entry, format);
        }
    }

    Ok(())
}
