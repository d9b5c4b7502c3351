//! Run scheduling configuration.

use std::path::PathBuf;

use application::OrchestratorConfig;
use serde::{Deserialize, Serialize};

/// Directory searched for scenario documents when none is given
pub const DEFAULT_EXPERIMENTS_DIR: &str = "experiments";

/// How and from where scenarios are run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAppConfig {
    /// Directory holding scenario documents (default: experiments)
    #[serde(default = "default_experiments_path")]
    pub experiments_path: PathBuf,

    /// Run scenarios concurrently
    #[serde(default)]
    pub parallel_scenarios: bool,
}

fn default_experiments_path() -> PathBuf {
    PathBuf::from(DEFAULT_EXPERIMENTS_DIR)
}

impl Default for RunAppConfig {
    fn default() -> Self {
        Self {
            experiments_path: default_experiments_path(),
            parallel_scenarios: false,
        }
    }
}

impl RunAppConfig {
    /// Scheduling settings for the orchestrator
    #[must_use]
    pub const fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            parallel_scenarios: self.parallel_scenarios,
        }
    }
}
