//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default, so an empty configuration
//! source is valid.

pub mod api;
pub mod logging;
pub mod oplog;

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::logging::LoggingConfig;
use self::oplog::OplogConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// (base file + environment overlay + `SPHERE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Operation log recorder settings.
    #[serde(default)]
    pub oplog: OplogConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/default.toml` and the overlay for `env`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration from an explicit base file.
    ///
    /// Merges the base file with `config/{env}.toml` and environment
    /// variables prefixed with `SPHERE` (nested keys separated by `__`,
    /// e.g. `SPHERE__API__BASE_URL`). Missing files are skipped.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let base = base.trim_end_matches(".toml");
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SPHERE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
