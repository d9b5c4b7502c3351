//! Scenario loading errors

use std::path::PathBuf;

use domain::DomainError;
use thiserror::Error;

/// Errors raised while reading scenario documents
#[derive(Debug, Error)]
pub enum LoadError {
    /// Experiments directory or file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML
    #[error("{origin}: invalid YAML: {source}")]
    Yaml {
        /// File name or other origin label
        origin: String,
        /// Underlying parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// A required key is absent
    #[error("{origin}: missing key '{key}' in {context}")]
    MissingKey {
        /// File name or other origin label
        origin: String,
        /// Name of the missing key
        key: String,
        /// Where in the document the key was expected
        context: String,
    },

    /// A value has the wrong shape
    #[error("{origin}: {context}: {message}")]
    Parse {
        /// File name or other origin label
        origin: String,
        /// Where in the document the value sits
        context: String,
        /// What is wrong with it
        message: String,
    },

    /// A value parsed but is not acceptable (unknown action, bad pattern, ...)
    #[error("{origin}: {context}: {source}")]
    Domain {
        /// File name or other origin label
        origin: String,
        /// Where in the document the value sits
        context: String,
        /// Domain validation failure
        #[source]
        source: DomainError,
    },
}

impl LoadError {
    /// The domain error behind this failure, if any
    pub const fn domain_error(&self) -> Option<&DomainError> {
        match self {
            Self::Domain { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether this failure names an action kind outside the registry
    pub const fn is_unknown_action(&self) -> bool {
        matches!(
            self.domain_error(),
            Some(DomainError::UnknownAction { .. })
        )
    }
}
