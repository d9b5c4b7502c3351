//! Command-line arguments

use std::path::{Path, PathBuf};

use clap::Parser;
use infrastructure::AppConfig;

/// Disruption generator
#[derive(Debug, Parser)]
#[command(name = "disruption-generator")]
#[command(author, version, about = "Trigger disruptive actions when remote logs match", long_about = None)]
pub struct Cli {
    /// Path to experiments yamls
    #[arg(short = 'e', long)]
    pub experiments_path: Option<PathBuf>,

    /// File with SSH private key used for every session
    #[arg(short = 'k', long, value_parser = existing_file)]
    pub ssh_host_key: Option<PathBuf>,

    /// Configuration file (defaults to disruption.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run scenarios concurrently instead of one after another
    #[arg(short, long)]
    pub parallel: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Let explicit flags win over file and environment configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.experiments_path {
            config.run.experiments_path.clone_from(path);
        }
        if let Some(key) = &self.ssh_host_key {
            config.ssh.private_key_path = Some(key.clone());
        }
        if self.parallel {
            config.run.parallel_scenarios = true;
        }
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(format!("no such file: {value}"))
    }
}

/// Log filter used when neither `RUST_LOG` nor the config sets one
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
