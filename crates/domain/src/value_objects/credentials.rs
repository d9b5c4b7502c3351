//! Credentials value object
//!
//! Opaque login material handed through to the remote-shell transport.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Username used when a scenario leaves it blank
pub const DEFAULT_USERNAME: &str = "root";

/// Username and optional password for a remote host
#[derive(Clone, Default)]
pub struct Credentials {
    username: Option<String>,
    password: Option<SecretString>,
}

impl Credentials {
    /// Create credentials with a username and no password
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: None,
        }
    }

    /// Set the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Build credentials from optional raw fields, treating blanks as absent
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|u| !u.trim().is_empty()),
            password: password
                .filter(|p| !p.is_empty())
                .map(SecretString::from),
        }
    }

    /// Username to log in with, falling back to [`DEFAULT_USERNAME`]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }

    /// Password, if one was provided
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username())
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
