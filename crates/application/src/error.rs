//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
///
/// Expected outcomes (no match, non-zero exit of a best-effort command) are
/// plain return values; these variants are faults that abort a run.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error (unknown action, invalid pattern, validation)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Remote session could not be established or broke mid-stream
    #[error("Transport error on {host}: {message}")]
    Transport {
        /// Host the session was opened against
        host: String,
        /// Underlying cause
        message: String,
    },

    /// A mandatory disruptive command exited unsuccessfully
    #[error("Mandatory action {action} failed in scenario '{scenario}'")]
    ActionFailed {
        /// Scenario name
        scenario: String,
        /// Action label
        action: String,
    },

    /// Error raised while running a specific scenario action
    #[error("Scenario '{scenario}', action {action}: {source}")]
    Scenario {
        /// Scenario name
        scenario: String,
        /// Action label
        action: String,
        /// Underlying error
        #[source]
        source: Box<ApplicationError>,
    },

    /// The operator asked the run to stop
    #[error("Run aborted by operator")]
    Aborted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Create a transport error
    pub fn transport(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Attach scenario and action context
    #[must_use]
    pub fn in_scenario(self, scenario: impl Into<String>, action: impl Into<String>) -> Self {
        match self {
            // Already carries context, or is itself the scenario-level failure
            Self::Scenario { .. } | Self::ActionFailed { .. } | Self::Aborted => self,
            other => Self::Scenario {
                scenario: scenario.into(),
                action: action.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with scenario context stripped
    pub fn root(&self) -> &Self {
        match self {
            Self::Scenario { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error comes from the remote-shell transport
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), Self::Transport { .. })
    }
}
