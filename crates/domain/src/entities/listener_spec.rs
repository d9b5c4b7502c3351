//! Listener specification - which remote log to watch and for what

use crate::value_objects::{LogPath, LogPattern, RemoteTarget};

/// What a scenario listens for before triggering its actions
#[derive(Debug, Clone)]
pub struct ListenerSpec {
    /// Pattern searched for in each new line
    pub pattern: LogPattern,
    /// Log file on the listener host
    pub log: LogPath,
    /// Host carrying the log file
    pub target: RemoteTarget,
}

impl ListenerSpec {
    /// Create a listener specification
    pub fn new(pattern: LogPattern, log: impl Into<LogPath>, target: RemoteTarget) -> Self {
        Self {
            pattern,
            log: log.into(),
            target,
        }
    }
}
