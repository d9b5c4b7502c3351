//! Console run observer
//!
//! Prints run progress for the operator, one line per event.

use std::fmt;
use std::io::{self, Write};

use application::ports::{RunEvent, RunObserverPort};
use parking_lot::Mutex;
use tracing::debug;

/// [`RunObserverPort`] writing human-readable progress lines
pub struct ConsoleObserver {
    out: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for ConsoleObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleObserver").finish_non_exhaustive()
    }
}

impl ConsoleObserver {
    /// Observer writing to the given sink
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Observer writing to standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Text printed for an event
    pub fn render(event: &RunEvent) -> String {
        match event {
            RunEvent::ScenarioStarted { scenario } => format!("Scenario: {scenario}"),
            RunEvent::ActionTriggered { action, .. } => format!("Triggering: {action}"),
            RunEvent::ActionSkipped { action, reason, .. } => {
                format!("Skipped: {action} ({})", reason.describe())
            },
            RunEvent::ActionCompleted {
                action, succeeded, ..
            } => {
                let status = if *succeeded { "succeeded" } else { "FAILED" };
                format!("Completed: {action} {status}")
            },
        }
    }
}

impl RunObserverPort for ConsoleObserver {
    fn on_event(&self, event: &RunEvent) {
        let line = Self::render(event);
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            debug!(error = %e, "Failed to write progress line");
        }
    }
}
