//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the SSH remote shell
//! and the console run observer. Also hosts the scenario loader, layered
//! configuration and logging bootstrap.

pub mod adapters;
pub mod config;
pub mod loader;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, DEFAULT_EXPERIMENTS_DIR, RunAppConfig};
pub use loader::{LoadError, discover, load_dir, load_file, load_str};
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
