//! Action dispatcher service
//!
//! Translates a domain [`Action`] into remote shell commands and runs them on
//! the action's target host. Reversible actions are held for their `wait`
//! period and then rolled back.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{Action, ActionKind, DomainError, RemoteTarget};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::RemoteShellPort;
use crate::services::abort;

/// Default network interface for injected latency
pub const DEFAULT_LATENCY_INTERFACE: &str = "eth0";

/// Configuration for the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Interface the netem qdisc is attached to (default: eth0)
    #[serde(default = "default_latency_interface")]
    pub latency_interface: String,
}

fn default_latency_interface() -> String {
    DEFAULT_LATENCY_INTERFACE.to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            latency_interface: default_latency_interface(),
        }
    }
}

/// Shell commands realising one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Disruptive command
    pub primary: String,
    /// Undo command for reversible actions
    pub rollback: Option<String>,
}

impl CommandPlan {
    /// Build the commands for `action`
    ///
    /// Parameters are split with shell rules and re-quoted, so a value can
    /// never smuggle a second command onto the remote shell.
    pub fn for_action(action: &Action, interface: &str) -> Result<Self, ApplicationError> {
        let params = normalize_params(&action.params)?;
        let plan = match action.kind {
            ActionKind::RestartService => Self {
                primary: format!("systemctl restart {params}"),
                rollback: None,
            },
            ActionKind::Latency => {
                let netem = format!(
                    "dev {} root netem delay {params}",
                    shell_words::quote(interface)
                );
                Self {
                    primary: format!("tc qdisc add {netem}"),
                    rollback: Some(format!("tc qdisc del {netem}")),
                }
            },
        };
        Ok(plan)
    }
}

fn normalize_params(raw: &str) -> Result<String, ApplicationError> {
    let words = shell_words::split(raw)
        .map_err(|e| DomainError::validation(format!("params '{raw}': {e}")))?;
    if words.is_empty() {
        return Err(DomainError::validation("params must not be empty").into());
    }
    Ok(shell_words::join(words))
}

/// Executes disruptive actions against remote hosts
///
/// Every remote command runs on its own session.
pub struct ActionDispatcher {
    shell: Arc<dyn RemoteShellPort>,
    config: DispatcherConfig,
    abort: Option<watch::Receiver<bool>>,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("config", &self.config)
            .field("abortable", &self.abort.is_some())
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    /// Create a dispatcher with default configuration
    pub fn new(shell: Arc<dyn RemoteShellPort>) -> Self {
        Self {
            shell,
            config: DispatcherConfig::default(),
            abort: None,
        }
    }

    /// Use a custom configuration
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Cut hold periods short once the signal flips to `true`
    ///
    /// Rollback still runs after an abort.
    #[must_use]
    pub fn with_abort_signal(mut self, abort: watch::Receiver<bool>) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Run `action` on its target host
    ///
    /// Returns whether the disruptive command succeeded. A failed rollback is
    /// logged but does not change the result. Transport failures are errors.
    #[instrument(skip_all, fields(action = %action.kind, host = %action.target))]
    pub async fn dispatch(&self, action: &Action) -> Result<bool, ApplicationError> {
        let plan = CommandPlan::for_action(action, &self.config.latency_interface)?;
        info!(command = %plan.primary, "Triggering disruptive command");

        match &plan.rollback {
            None => self.run(&action.target, &plan.primary).await,
            Some(rollback) => {
                self.run_reversible(&action.target, &plan.primary, rollback, action.wait)
                    .await
            },
        }
    }

    async fn run_reversible(
        &self,
        target: &RemoteTarget,
        primary: &str,
        rollback: &str,
        wait: Duration,
    ) -> Result<bool, ApplicationError> {
        let result = self.run(target, primary).await;
        match &result {
            Ok(true) => self.hold(wait).await,
            Ok(false) => {
                warn!("Disruptive command failed, rolling back after hold anyway");
                self.hold(wait).await;
            },
            Err(e) => warn!(error = %e, "Disruptive command could not be run, attempting rollback"),
        }
        self.rollback(target, rollback).await;
        result
    }

    async fn run(&self, target: &RemoteTarget, command: &str) -> Result<bool, ApplicationError> {
        let output = self.shell.execute(target, command).await?;
        if output.success() {
            debug!(command, "Remote command succeeded");
        } else {
            warn!(
                command,
                exit_status = output.exit_status,
                stderr = %output.stderr.trim(),
                "Remote command failed"
            );
        }
        Ok(output.success())
    }

    async fn hold(&self, wait: Duration) {
        if wait.is_zero() {
            return;
        }
        info!(wait_secs = wait.as_secs(), "Holding disruption");
        tokio::select! {
            () = tokio::time::sleep(wait) => {},
            () = abort::requested(self.abort.as_ref()) => {
                warn!("Abort requested, ending hold early");
            },
        }
    }

    async fn rollback(&self, target: &RemoteTarget, command: &str) {
        info!(command, "Rolling back");
        match self.shell.execute(target, command).await {
            Ok(output) if output.success() => info!("Rollback succeeded"),
            Ok(output) => warn!(
                exit_status = output.exit_status,
                stderr = %output.stderr.trim(),
                "Rollback was not successful"
            ),
            Err(e) => warn!(error = %e, "Rollback could not be run"),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::Credentials;
    use mockall::Sequence;
    use tokio::time::Instant;

    use super::*;
    use crate::ports::{CommandOutput, MockRemoteShellPort};

    fn target() -> RemoteTarget {
        RemoteTarget::new("h2", Credentials::default())
    }

    fn restart(params: &str) -> Action {
        Action::new(ActionKind::RestartService, params, target(), 0, 5).unwrap()
    }

    fn latency(params: &str, wait: u64) -> Action {
        Action::new(ActionKind::Latency, params, target(), wait, 5).unwrap()
    }

    fn ok(status: i32) -> Result<CommandOutput, ApplicationError> {
        Ok(CommandOutput::new(status))
    }

    #[test]
    fn default_config_uses_eth0() {
        assert_eq!(DispatcherConfig::default().latency_interface, "eth0");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: DispatcherConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.latency_interface, "eth0");

        let config: DispatcherConfig =
            serde_json::from_str(r#"{"latency_interface": "ens3"}"#).unwrap();
        assert_eq!(config.latency_interface, "ens3");
    }

    #[test]
    fn restart_plan_has_no_rollback() {
        let plan = CommandPlan::for_action(&restart("httpd"), "eth0").unwrap();
        assert_eq!(plan.primary, "systemctl restart httpd");
        assert!(plan.rollback.is_none());
    }

    #[test]
    fn latency_plan_adds_and_deletes_netem() {
        let plan = CommandPlan::for_action(&latency("100ms", 1), "eth0").unwrap();
        assert_eq!(plan.primary, "tc qdisc add dev eth0 root netem delay 100ms");
        assert_eq!(
            plan.rollback.as_deref(),
            Some("tc qdisc del dev eth0 root netem delay 100ms")
        );
    }

    #[test]
    fn params_are_normalized_and_quoted() {
        let plan = CommandPlan::for_action(&latency("100ms   20ms", 1), "eth0").unwrap();
        assert_eq!(plan.primary, "tc qdisc add dev eth0 root netem delay 100ms 20ms");

        let plan = CommandPlan::for_action(&restart("httpd; rm -rf /"), "eth0").unwrap();
        assert_eq!(plan.primary, "systemctl restart 'httpd;' rm -rf /");
    }

    #[test]
    fn malformed_params_are_rejected() {
        let err = CommandPlan::for_action(&restart("\"unterminated"), "eth0").unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(_)));

        let err = CommandPlan::for_action(&restart("   "), "eth0").unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(_)));
    }

    #[tokio::test]
    async fn restart_success() {
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd == "systemctl restart httpd")
            .times(1)
            .returning(|_, _| ok(0));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        assert!(dispatcher.dispatch(&restart("httpd")).await.unwrap());
    }

    #[tokio::test]
    async fn restart_non_zero_exit_is_false() {
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .times(1)
            .returning(|_, _| Ok(CommandOutput::new(5).with_stderr("Unit not found")));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        assert!(!dispatcher.dispatch(&restart("nope")).await.unwrap());
    }

    #[tokio::test]
    async fn restart_transport_failure_is_error() {
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .times(1)
            .returning(|target, _| Err(ApplicationError::transport(target.to_string(), "refused")));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        let err = dispatcher.dispatch(&restart("httpd")).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn malformed_params_never_reach_the_host() {
        let mut shell = MockRemoteShellPort::new();
        shell.expect_execute().never();

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        assert!(dispatcher.dispatch(&restart("'open")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn latency_holds_then_rolls_back() {
        let mut seq = Sequence::new();
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd == "tc qdisc add dev eth0 root netem delay 100ms")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(0));
        shell
            .expect_execute()
            .withf(|_, cmd| cmd == "tc qdisc del dev eth0 root netem delay 100ms")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(0));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        let started = Instant::now();
        assert!(dispatcher.dispatch(&latency("100ms", 3)).await.unwrap());
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_failed_add_still_rolls_back() {
        let mut seq = Sequence::new();
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc add"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::new(2).with_stderr("RTNETLINK answers: File exists")));
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc del"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(0));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        let started = Instant::now();
        assert!(!dispatcher.dispatch(&latency("100ms", 2)).await.unwrap());
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_transport_failure_skips_hold_and_still_rolls_back() {
        let mut seq = Sequence::new();
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc add"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ApplicationError::transport("h2:22", "reset")));
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc del"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ApplicationError::transport("h2:22", "reset")));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        let started = Instant::now();
        let err = dispatcher.dispatch(&latency("100ms", 30)).await.unwrap_err();
        assert!(err.is_transport());
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_rollback_keeps_primary_result() {
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc add"))
            .returning(|_, _| ok(0));
        shell
            .expect_execute()
            .withf(|_, cmd| cmd.starts_with("tc qdisc del"))
            .returning(|_, _| ok(2));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        assert!(dispatcher.dispatch(&latency("50ms", 1)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_wait_rolls_back_immediately() {
        let mut shell = MockRemoteShellPort::new();
        shell.expect_execute().times(2).returning(|_, _| ok(0));

        let dispatcher = ActionDispatcher::new(Arc::new(shell));
        let started = Instant::now();
        assert!(dispatcher.dispatch(&latency("50ms", 0)).await.unwrap());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interface_is_used() {
        let mut shell = MockRemoteShellPort::new();
        shell
            .expect_execute()
            .withf(|_, cmd| cmd == "tc qdisc add dev ens3 root netem delay 10ms")
            .times(1)
            .returning(|_, _| ok(0));
        shell
            .expect_execute()
            .withf(|_, cmd| cmd == "tc qdisc del dev ens3 root netem delay 10ms")
            .times(1)
            .returning(|_, _| ok(0));

        let dispatcher = ActionDispatcher::new(Arc::new(shell)).with_config(DispatcherConfig {
            latency_interface: "ens3".to_string(),
        });
        assert!(dispatcher.dispatch(&latency("10ms", 1)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_signal_ends_hold_early() {
        let mut shell = MockRemoteShellPort::new();
        shell.expect_execute().times(2).returning(|_, _| ok(0));

        let (abort_tx, abort_rx) = watch::channel(false);
        let dispatcher = ActionDispatcher::new(Arc::new(shell)).with_abort_signal(abort_rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = abort_tx.send(true);
        });

        let started = Instant::now();
        assert!(dispatcher.dispatch(&latency("10ms", 60)).await.unwrap());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_abort_source_does_not_end_hold() {
        let mut shell = MockRemoteShellPort::new();
        shell.expect_execute().times(2).returning(|_, _| ok(0));

        let (abort_tx, abort_rx) = watch::channel(false);
        drop(abort_tx);
        let dispatcher = ActionDispatcher::new(Arc::new(shell)).with_abort_signal(abort_rx);

        let started = Instant::now();
        assert!(dispatcher.dispatch(&latency("10ms", 4)).await.unwrap());
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[test]
    fn debug_output() {
        let dispatcher = ActionDispatcher::new(Arc::new(MockRemoteShellPort::new()));
        let debug = format!("{dispatcher:?}");
        assert!(debug.contains("ActionDispatcher"));
        assert!(debug.contains("eth0"));
    }
}
