//! CLI command definitions and dispatch.

pub mod clear;
pub mod export;
pub mod ip;
pub mod list;
pub mod record;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use sphere_core::config::AppConfig;
use sphere_core::error::AppError;
use sphere_core::traits::identity::IdentityProvider;
use sphere_core::types::actor::{Actor, UNKNOWN_ACTOR_NAME};
use sphere_oplog::LogRecorder;
use sphere_oplog::identity::StaticIdentity;

use crate::output::OutputFormat;

/// Study Sphere operation log administration
#[derive(Debug, Parser)]
#[command(name = "sphere", version, about, long_about = None)]
pub struct Cli {
    /// Path to the base configuration file
    #[arg(short, long, env = "SPHERE_CONFIG", default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>.toml`
    #[arg(long = "env", env = "SPHERE_ENV", default_value = "development")]
    pub environment: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Acting user
    #[command(flatten)]
    pub actor: ActorArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// The acting user recorded on new entries.
#[derive(Debug, Clone, Args)]
pub struct ActorArgs {
    /// Acting user id; anonymous when omitted
    #[arg(long, global = true, env = "SPHERE_ACTOR_ID")]
    pub actor_id: Option<String>,

    /// Acting user display name
    #[arg(long, global = true, env = "SPHERE_ACTOR_NAME")]
    pub actor_name: Option<String>,
}

impl ActorArgs {
    /// Identity provider for the configured actor.
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        match &self.actor_id {
            Some(id) => {
                let name = self.actor_name.as_deref().unwrap_or(UNKNOWN_ACTOR_NAME);
                Arc::new(StaticIdentity::new(Actor::new(id.as_str(), name)))
            }
            None => Arc::new(StaticIdentity::anonymous()),
        }
    }
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record an operation
    Record(record::RecordArgs),
    /// List operation logs
    List(list::ListArgs),
    /// Export operation logs as CSV
    Export(export::ExportArgs),
    /// Clear all operation logs
    Clear(clear::ClearArgs),
    /// Show the client IP recorded on new entries
    Ip(ip::IpArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let recorder = LogRecorder::from_config(&config, self.actor.identity()).await?;

        match &self.command {
            Commands::Record(args) => record::execute(args, &recorder, self.format).await,
            Commands::List(args) => list::execute(args, &recorder, self.format).await,
            Commands::Export(args) => export::execute(args, &recorder).await,
            Commands::Clear(args) => clear::execute(args, &recorder).await,
            Commands::Ip(args) => ip::execute(args, &recorder, self.format).await,
        }
    }
}
