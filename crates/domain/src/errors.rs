//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Action kind outside the closed registry
    #[error("Unexpected disruptive action '{name}' other than {}", .valid.join(", "))]
    UnknownAction {
        /// The offending action name as written in the scenario
        name: String,
        /// Every registered action name
        valid: Vec<&'static str>,
    },

    /// Log pattern is empty or not a valid regular expression
    #[error("Invalid log pattern: {0}")]
    InvalidPattern(String),

    /// Remote host address could not be parsed
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create an unknown action error listing the full registry
    pub fn unknown_action(name: impl Into<String>, valid: &[&'static str]) -> Self {
        Self::UnknownAction {
            name: name.into(),
            valid: valid.to_vec(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
