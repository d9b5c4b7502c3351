//! Run observer port - Progress notifications for a disruption run

#[cfg(test)]
use mockall::automock;

/// Why an action was not triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The pattern did not appear before the action's timeout
    NoMatch,
    /// The log was already watched earlier in the scenario
    AlreadyWatched,
}

impl SkipReason {
    /// Short description for console output
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::NoMatch => "pattern not seen before timeout",
            Self::AlreadyWatched => "log already watched in this scenario",
        }
    }
}

/// Event emitted while scenarios run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A scenario is about to start listening
    ScenarioStarted {
        /// Scenario name
        scenario: String,
    },
    /// The pattern matched and the action is being dispatched
    ActionTriggered {
        /// Scenario name
        scenario: String,
        /// Action label
        action: String,
    },
    /// The action was not dispatched
    ActionSkipped {
        /// Scenario name
        scenario: String,
        /// Action label
        action: String,
        /// Why it was skipped
        reason: SkipReason,
    },
    /// The dispatched action finished
    ActionCompleted {
        /// Scenario name
        scenario: String,
        /// Action label
        action: String,
        /// Whether the disruptive command succeeded
        succeeded: bool,
    },
}

/// Port for reporting run progress to the operator
#[cfg_attr(test, automock)]
pub trait RunObserverPort: Send + Sync {
    /// Called for every run event, in order
    fn on_event(&self, event: &RunEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserverPort for NoopObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_descriptions_differ() {
        assert_ne!(
            SkipReason::NoMatch.describe(),
            SkipReason::AlreadyWatched.describe()
        );
    }

    #[test]
    fn noop_observer_accepts_events() {
        let observer = NoopObserver;
        observer.on_event(&RunEvent::ScenarioStarted {
            scenario: "s".to_string(),
        });
    }

    #[test]
    fn mock_observer_records_calls() {
        let mut observer = MockRunObserverPort::new();
        observer
            .expect_on_event()
            .withf(|event| matches!(event, RunEvent::ScenarioStarted { scenario } if scenario == "s"))
            .times(1)
            .return_const(());
        observer.on_event(&RunEvent::ScenarioStarted {
            scenario: "s".to_string(),
        });
    }
}
