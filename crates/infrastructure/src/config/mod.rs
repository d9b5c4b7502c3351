//! Application configuration
//!
//! Split into focused sections:
//! - `ssh`: transport settings (timeouts, key file, known hosts)
//! - `run`: experiments directory and scheduling
//! - `dispatch`: action command settings
//! - `logging`: log filter and format
//!
//! Sources, later ones winning: built-in defaults, the config file
//! (`disruption.toml` when present, or an explicit path), then
//! `DISRUPTION_<SECTION>__<KEY>` environment variables. Command-line flags are
//! applied on top by the binary.

mod run;

use std::path::Path;

use application::DispatcherConfig;
use serde::{Deserialize, Serialize};

pub use run::{DEFAULT_EXPERIMENTS_DIR, RunAppConfig};

use crate::adapters::SshConfig;
use crate::telemetry::LoggingConfig;

/// Default config file base name (extension resolved by the config crate)
pub const DEFAULT_CONFIG_FILE: &str = "disruption";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "DISRUPTION";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// SSH transport
    #[serde(default)]
    pub ssh: SshConfig,

    /// Run scheduling
    #[serde(default)]
    pub run: RunAppConfig,

    /// Action dispatch
    #[serde(default)]
    pub dispatch: DispatcherConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// With `path` set the file must exist; otherwise `disruption.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            // Start with defaults
            .set_default("run.experiments_path", DEFAULT_EXPERIMENTS_DIR)?
            .set_default("dispatch.latency_interface", "eth0")?
            .add_source(file)
            // Override with environment variables (e.g., DISRUPTION_SSH__CONNECT_TIMEOUT_SECS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
