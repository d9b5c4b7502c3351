//! Scenario entity - one listener gating an ordered list of actions

use std::collections::HashSet;

use crate::entities::{Action, ListenerSpec};
use crate::value_objects::LogPath;

/// A named disruption scenario
///
/// Names are not unique; two scenarios with the same name run independently.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Display name
    pub name: String,
    /// Listener shared by every action of the scenario
    pub listener: ListenerSpec,
    /// Actions, executed strictly in this order
    pub actions: Vec<Action>,
}

impl Scenario {
    /// Create a scenario
    pub fn new(name: impl Into<String>, listener: ListenerSpec, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            listener,
            actions,
        }
    }

    /// Log file gating the given action: its own override or the listener's log
    pub fn log_target<'a>(&'a self, action: &'a Action) -> &'a LogPath {
        action.log.as_ref().unwrap_or(&self.listener.log)
    }

    /// Indices of actions whose log target repeats an earlier action's
    ///
    /// A log is followed at most once per scenario, so these actions can
    /// never trigger.
    pub fn shadowed_actions(&self) -> Vec<usize> {
        let mut seen = HashSet::new();
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, action)| !seen.insert(self.log_target(action).watch_key()))
            .map(|(i, _)| i)
            .collect()
    }
}
