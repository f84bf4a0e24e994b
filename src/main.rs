//! Study Sphere operation log administration CLI.
//!
//! Loads configuration, initializes logging and dispatches to the
//! subcommands in [`commands`].

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use sphere_core::config::AppConfig;
use sphere_core::config::logging::LogFormat;
use sphere_core::error::AppError;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(config).await {
        tracing::error!(error = %e, "Command failed");
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from the base file, the environment overlay and
/// `SPHERE__*` variables.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    AppConfig::load_from(&cli.config, &cli.environment)
}

/// Initialize tracing. Logs go to stderr so command output stays parseable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
