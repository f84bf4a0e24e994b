//! `sphere clear`: delete every operation log.

use clap::Args;

use sphere_core::error::AppError;
use sphere_oplog::LogRecorder;

use crate::output;

/// Arguments for the clear command
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the clear command
pub async fn execute(args: &ClearArgs, recorder: &LogRecorder) -> Result<(), AppError> {
    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Delete ALL operation logs on the backend and in the local cache?")
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = recorder.clear_all().await;
    if !outcome.local {
        return Err(AppError::storage("Failed to clear the local operation log cache"));
    }
    if outcome.remote {
        output::print_success("Operation logs cleared");
    } else {
        output::print_warning("Local cache cleared; the backend could not be cleared");
    }
    Ok(())
}
