//! Disruptive actions and the closed action registry

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::DomainError;
use crate::value_objects::{LogPath, RemoteTarget};

/// The registered kinds of disruption
///
/// The registry is closed: new disruptions are added as variants, never
/// looked up by arbitrary name at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Restart a system service on the target host
    RestartService,
    /// Add a network delay to the target's primary interface, then remove it
    Latency,
}

impl ActionKind {
    /// Every registered kind, in registry order
    pub const ALL: [Self; 2] = [Self::RestartService, Self::Latency];

    /// Bumped whenever a variant is added
    pub const REGISTRY_VERSION: u32 = 2;

    /// Canonical scenario name of the kind
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RestartService => "restart_service",
            Self::Latency => "latency",
        }
    }

    /// Canonical names of every registered kind
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::name).collect()
    }

    /// Whether a failed primary command is fatal to the run
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        matches!(self, Self::RestartService)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = DomainError;

    /// Accepts `restart_service`, `RestartService`, `restart-service` and so on
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "restartservice" => Ok(Self::RestartService),
            "latency" => Ok(Self::Latency),
            _ => Err(DomainError::unknown_action(s, &Self::names())),
        }
    }
}

/// A disruptive action bound to a target host
#[derive(Debug, Clone)]
pub struct Action {
    /// Registered kind
    pub kind: ActionKind,
    /// Kind-specific arguments (service name, netem delay)
    pub params: String,
    /// Host the action runs on
    pub target: RemoteTarget,
    /// Time to hold a reversible disruption before rolling it back
    pub wait: Duration,
    /// Time the listener gate waits for the trigger pattern
    pub timeout: Duration,
    /// Log file watched for this action instead of the scenario's listener log
    pub log: Option<LogPath>,
}

impl Action {
    /// Create an action, validating the timeout
    pub fn new(
        kind: ActionKind,
        params: impl Into<String>,
        target: RemoteTarget,
        wait_secs: u64,
        timeout_secs: u64,
    ) -> Result<Self, DomainError> {
        if timeout_secs == 0 {
            return Err(DomainError::validation(
                "timeout must be greater than zero",
            ));
        }
        Ok(Self {
            kind,
            params: params.into(),
            target,
            wait: Duration::from_secs(wait_secs),
            timeout: Duration::from_secs(timeout_secs),
            log: None,
        })
    }

    /// Watch a different log file for this action's trigger
    #[must_use]
    pub fn with_log(mut self, log: impl Into<LogPath>) -> Self {
        self.log = Some(log.into());
        self
    }

    /// Human-readable label, e.g. `restart_service(httpd)`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}({})", self.kind, self.params)
    }
}
