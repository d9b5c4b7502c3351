//! Scenario orchestrator service
//!
//! Runs scenarios in order. Each action waits for its trigger on the
//! scenario's listener and, on a match, is handed to the dispatcher.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{Action, Scenario};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::ApplicationError;
use crate::ports::{RemoteShellPort, RunEvent, RunObserverPort, SkipReason};
use crate::services::{ActionDispatcher, LogListener, TailOutcome, abort};

/// Process exit code for a completed run
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for an aborted run
pub const EXIT_FAILURE: i32 = 1;

/// Configuration for how scenarios are scheduled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Run every scenario concurrently instead of one after another
    #[serde(default)]
    pub parallel_scenarios: bool,
}

/// Counters for one scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    /// Scenario name
    pub name: String,
    /// Actions whose trigger matched
    pub triggered: usize,
    /// Actions skipped (no match or log already watched)
    pub skipped: usize,
    /// Triggered actions whose command succeeded
    pub succeeded: usize,
    /// Triggered actions whose command failed without aborting the run
    pub failed: usize,
}

impl ScenarioSummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the last scenario finished
    pub finished_at: DateTime<Utc>,
    /// Per-scenario counters, in declaration order
    pub scenarios: Vec<ScenarioSummary>,
}

impl RunReport {
    /// Total triggered actions
    #[must_use]
    pub fn triggered(&self) -> usize {
        self.scenarios.iter().map(|s| s.triggered).sum()
    }

    /// Total skipped actions
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.scenarios.iter().map(|s| s.skipped).sum()
    }

    /// Total failed (non-mandatory) actions
    #[must_use]
    pub fn failed(&self) -> usize {
        self.scenarios.iter().map(|s| s.failed).sum()
    }
}

/// Map a run result to a process exit code
#[must_use]
pub const fn exit_code(result: &Result<RunReport, ApplicationError>) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

/// Drives scenarios through listening and dispatching
pub struct ScenarioOrchestrator {
    shell: Arc<dyn RemoteShellPort>,
    dispatcher: ActionDispatcher,
    observer: Arc<dyn RunObserverPort>,
    config: OrchestratorConfig,
    abort: Option<watch::Receiver<bool>>,
}

impl fmt::Debug for ScenarioOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioOrchestrator")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .field("abortable", &self.abort.is_some())
            .finish_non_exhaustive()
    }
}

impl ScenarioOrchestrator {
    /// Create an orchestrator
    pub fn new(
        shell: Arc<dyn RemoteShellPort>,
        dispatcher: ActionDispatcher,
        observer: Arc<dyn RunObserverPort>,
    ) -> Self {
        Self {
            shell,
            dispatcher,
            observer,
            config: OrchestratorConfig::default(),
            abort: None,
        }
    }

    /// Use a custom scheduling configuration
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop waiting for triggers once the signal reads `true`
    ///
    /// A dispatch already in progress finishes, including its rollback.
    #[must_use]
    pub fn with_abort_signal(mut self, abort: watch::Receiver<bool>) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Run all scenarios
    ///
    /// Stops at the first transport error, failed mandatory action or abort.
    #[instrument(skip_all, fields(scenarios = scenarios.len(), parallel = self.config.parallel_scenarios))]
    pub async fn run(&self, scenarios: &[Scenario]) -> Result<RunReport, ApplicationError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting disruption run");

        let summaries = if self.config.parallel_scenarios {
            try_join_all(scenarios.iter().map(|s| self.run_scenario(s))).await?
        } else {
            let mut summaries = Vec::with_capacity(scenarios.len());
            for scenario in scenarios {
                summaries.push(self.run_scenario(scenario).await?);
            }
            summaries
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            scenarios: summaries,
        };
        info!(
            %run_id,
            triggered = report.triggered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Disruption run finished"
        );
        Ok(report)
    }

    /// Run one scenario's actions in declaration order
    #[instrument(skip_all, fields(scenario = %scenario.name))]
    pub async fn run_scenario(
        &self,
        scenario: &Scenario,
    ) -> Result<ScenarioSummary, ApplicationError> {
        info!(actions = scenario.actions.len(), "Scenario started");
        self.observer.on_event(&RunEvent::ScenarioStarted {
            scenario: scenario.name.clone(),
        });

        let listener = LogListener::new(&scenario.listener, Arc::clone(&self.shell));
        let mut summary = ScenarioSummary::new(&scenario.name);

        for action in &scenario.actions {
            let label = action.label();
            self.run_action(scenario, action, &label, &listener, &mut summary)
                .await
                .map_err(|e| e.in_scenario(&scenario.name, &label))?;
        }
        Ok(summary)
    }

    async fn run_action(
        &self,
        scenario: &Scenario,
        action: &Action,
        label: &str,
        listener: &LogListener,
        summary: &mut ScenarioSummary,
    ) -> Result<(), ApplicationError> {
        let log = scenario.log_target(action);
        let outcome = tokio::select! {
            biased;
            () = abort::requested(self.abort.as_ref()) => {
                warn!(action = label, "Abort requested, no further triggers");
                return Err(ApplicationError::Aborted);
            },
            outcome = listener.tail(log, &scenario.listener.pattern, action.timeout) => outcome?,
        };

        let reason = match outcome {
            TailOutcome::Matched => None,
            TailOutcome::TimedOut => Some(SkipReason::NoMatch),
            TailOutcome::AlreadyWatched => Some(SkipReason::AlreadyWatched),
        };
        if let Some(reason) = reason {
            info!(action = label, reason = reason.describe(), "Action skipped");
            summary.skipped += 1;
            self.observer.on_event(&RunEvent::ActionSkipped {
                scenario: scenario.name.clone(),
                action: label.to_string(),
                reason,
            });
            return Ok(());
        }

        summary.triggered += 1;
        self.observer.on_event(&RunEvent::ActionTriggered {
            scenario: scenario.name.clone(),
            action: label.to_string(),
        });

        let succeeded = self.dispatcher.dispatch(action).await?;
        self.observer.on_event(&RunEvent::ActionCompleted {
            scenario: scenario.name.clone(),
            action: label.to_string(),
            succeeded,
        });

        if succeeded {
            summary.succeeded += 1;
        } else if action.kind.is_mandatory() {
            error!(action = label, "Mandatory action failed, aborting run");
            return Err(ApplicationError::ActionFailed {
                scenario: scenario.name.clone(),
                action: label.to_string(),
            });
        } else {
            warn!(action = label, "Action failed, continuing");
            summary.failed += 1;
        }
        Ok(())
    }
}
