//! Application services - Use case implementations

mod abort;
mod action_dispatcher;
mod log_listener;
mod scenario_orchestrator;

pub use action_dispatcher::{
    ActionDispatcher, CommandPlan, DEFAULT_LATENCY_INTERFACE, DispatcherConfig,
};
pub use log_listener::{LogListener, TailOutcome, tail_command};
pub use scenario_orchestrator::{
    EXIT_FAILURE, EXIT_SUCCESS, OrchestratorConfig, RunReport, ScenarioOrchestrator,
    ScenarioSummary, exit_code,
};
