//! `sphere ip`: show the client IP that new entries will carry.

use clap::Args;
use serde_json::json;

use sphere_core::error::AppError;
use sphere_oplog::LogRecorder;
use sphere_oplog::entry::UNKNOWN_IP;

use crate::output::{self, OutputFormat};

/// Arguments for the ip command
#[derive(Debug, Args)]
pub struct IpArgs {
    /// Exit with an error when no address can be determined
    #[arg(long)]
    pub strict: bool,
}

/// Execute the ip command
pub async fn execute(
    args: &IpArgs,
    recorder: &LogRecorder,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ip = recorder.resolve_ip(None).await;
    if args.strict && ip == UNKNOWN_IP {
        return Err(AppError::not_found("Client IP could not be determined"));
    }

    match format {
        OutputFormat::Table => output::print_kv("IP address", &ip),
        OutputFormat::Json => println!("{}", json!({ "ip": ip })),
    }
    Ok(())
}
