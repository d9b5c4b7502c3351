//! Disruption generator CLI
//!
//! Loads experiment scenarios, waits for their trigger patterns in remote
//! logs and fires the configured disruptive actions over SSH.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use application::{
    ActionDispatcher, RemoteShellPort, RunObserverPort, ScenarioOrchestrator, exit_code,
};
use clap::Parser;
use infrastructure::{AppConfig, ConsoleObserver, SshShellAdapter, init_logging, load_dir};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::{Cli, log_filter_from_verbosity};

const BANNER: [&str; 2] = [
    "!!! DISRUPTION AS A SERVICE !!!",
    "!!!    USE WITH CAUTION     !!!",
];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    for line in BANNER {
        println!("{line}");
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    init_logging(&config.logging, log_filter_from_verbosity(cli.verbose))
        .context("Failed to initialize logging")?;

    let experiments = &config.run.experiments_path;
    let scenarios = match load_dir(experiments) {
        Ok(scenarios) => scenarios,
        Err(e) => {
            eprintln!("Failed to load experiments: {e}");
            return Ok(ExitCode::FAILURE);
        },
    };
    info!(
        path = %experiments.display(),
        scenarios = scenarios.len(),
        "Experiments loaded"
    );

    let (abort_tx, abort_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, rolling back and stopping");
            let _ = abort_tx.send(true);
        }
    });

    let shell: Arc<dyn RemoteShellPort> = Arc::new(SshShellAdapter::new(config.ssh.clone()));
    let dispatcher = ActionDispatcher::new(Arc::clone(&shell))
        .with_config(config.dispatch.clone())
        .with_abort_signal(abort_rx.clone());
    let observer: Arc<dyn RunObserverPort> = Arc::new(ConsoleObserver::stdout());
    let orchestrator = ScenarioOrchestrator::new(shell, dispatcher, observer)
        .with_config(config.run.orchestrator())
        .with_abort_signal(abort_rx);

    let result = orchestrator.run(&scenarios).await;
    match &result {
        Ok(report) => info!(
            run_id = %report.run_id,
            triggered = report.triggered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Run complete"
        ),
        Err(e) if e.is_transport() => eprintln!("SSH connection failed: {e}"),
        Err(e) => eprintln!("{e}"),
    }

    Ok(ExitCode::from(u8::try_from(exit_code(&result)).unwrap_or(1)))
}
