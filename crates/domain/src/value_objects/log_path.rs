//! Remote log file path

use std::fmt;

/// Path of a log file on a remote host
///
/// Two paths are the same watch target when they are equal ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogPath(String);

impl LogPath {
    /// Wrap a path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded key used to remember which paths are already watched
    pub fn watch_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for LogPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for LogPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}
