//! Log pattern value object - a compiled, unanchored line matcher

use std::fmt;

use regex::Regex;

use crate::errors::DomainError;

/// Regular expression searched for in each new log line
#[derive(Debug, Clone)]
pub struct LogPattern {
    source: String,
    regex: Regex,
}

impl LogPattern {
    /// Compile a pattern
    ///
    /// An empty pattern compiles and matches every line; scenario loading
    /// rejects it through [`LogPattern::parse_non_empty`].
    pub fn new(pattern: &str) -> Result<Self, DomainError> {
        let regex = Regex::new(pattern)
            .map_err(|e| DomainError::InvalidPattern(format!("{pattern}: {e}")))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compile a pattern, rejecting the empty string
    pub fn parse_non_empty(pattern: &str) -> Result<Self, DomainError> {
        if pattern.is_empty() {
            return Err(DomainError::InvalidPattern(
                "pattern must not be empty".to_string(),
            ));
        }
        Self::new(pattern)
    }

    /// Search a single line (no anchoring, no cross-line matching)
    pub fn is_match(&self, line: &str) -> bool {
        self.source.is_empty() || self.regex.is_match(line)
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern is empty
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl fmt::Display for LogPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
