//! Logging initialization and configuration
//!
//! Console logging through `tracing-subscriber`: an `EnvFilter` plus a
//! `fmt` layer, rendered as text or JSON.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration for logging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g., "info", "application=debug,infrastructure=info")
    ///
    /// When unset the binary derives one from its verbosity flag.
    #[serde(default)]
    pub filter: Option<String>,

    /// Output format (default: text)
    #[serde(default)]
    pub format: LogFormat,
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Filter directive could not be parsed
    #[error("Invalid log filter '{filter}': {message}")]
    Filter {
        /// The rejected directive
        filter: String,
        /// Parser message
        message: String,
    },

    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Resolve the effective filter directive
///
/// `RUST_LOG` wins over the configured filter, which wins over `fallback`.
pub fn effective_filter(config: &LoggingConfig, fallback: &str) -> String {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Initialize the global subscriber; call once at startup
pub fn init_logging(config: &LoggingConfig, fallback: &str) -> Result<(), TelemetryError> {
    let directive = effective_filter(config, fallback);
    let filter = EnvFilter::try_new(&directive).map_err(|e| TelemetryError::Filter {
        filter: directive.clone(),
        message: e.to_string(),
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    debug!(filter = %directive, format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = LoggingConfig::default();
        assert!(config.filter.is_none());
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn config_deserialization() {
        let json = r#"{"filter": "debug", "format": "json"}"#;
        let parsed: LoggingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.filter.as_deref(), Some("debug"));
        assert_eq!(parsed.format, LogFormat::Json);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = LoggingConfig {
            filter: Some("application=notalevel".to_string()),
            format: LogFormat::Text,
        };
        // RUST_LOG may be set in the environment running the tests
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            let err = init_logging(&config, "info").unwrap_err();
            assert!(matches!(err, TelemetryError::Filter { .. }));
        }
    }

    #[test]
    fn configured_filter_beats_fallback() {
        let config = LoggingConfig {
            filter: Some("trace".to_string()),
            format: LogFormat::Text,
        };
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert_eq!(effective_filter(&config, "warn"), "trace");
            assert_eq!(effective_filter(&LoggingConfig::default(), "warn"), "warn");
        }
    }
}
