//! Tool settings
//!
//! Optional TOML file for values that would otherwise be repeated on every
//! invocation:
//!
//! ```toml
//! jobs = 4
//!
//! [engine]
//! command = "python3"
//! args = ["/opt/ctc/bridge.py"]
//!
//! [exploration]
//! policy = "timeout"
//! timeout_secs = 7
//!
//! [output]
//! parent = "/var/tmp/ctc"
//! ```
//!
//! Command line flags override file values.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ctc_engine::{ExplorationPolicy, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::error::{RunError, RunResult};

/// Exploration policy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Stop once more than one state is runnable
    #[default]
    SingleFork,
    /// Stop once the time budget is spent
    Timeout,
}

impl FromStr for PolicyKind {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-fork" => Ok(Self::SingleFork),
            "timeout" => Ok(Self::Timeout),
            other => Err(RunError::invalid_input(format!(
                "unknown exploration policy '{other}', expected 'single-fork' or 'timeout'"
            ))),
        }
    }
}

/// External engine bridge command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Program to spawn
    pub command: Option<String>,
    /// Arguments passed to it
    pub args: Vec<String>,
}

/// Exploration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorationSettings {
    pub policy: PolicyKind,
    /// Budget for the timeout policy
    pub timeout_secs: u64,
}

impl Default for ExplorationSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::SingleFork,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Directory the run directory is created in
    pub parent: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            parent: PathBuf::from("."),
        }
    }
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Targets processed in parallel in batch mode
    pub jobs: usize,
    pub engine: EngineSettings,
    pub exploration: ExplorationSettings,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs: 1,
            engine: EngineSettings::default(),
            exploration: ExplorationSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a TOML file
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `InvalidInput` if it does not
    /// parse or holds unusable values.
    pub fn load(path: impl AsRef<Path>) -> RunResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RunError::io_error(path, e))?;
        let settings = Self::from_toml(&text)
            .map_err(|e| RunError::invalid_input(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings text
    ///
    /// # Errors
    /// Returns `InvalidInput` on parse failure or unusable values.
    pub fn from_toml(text: &str) -> RunResult<Self> {
        let settings: Self =
            toml::from_str(text).map_err(|e| RunError::invalid_input(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `InvalidInput` for zero jobs or a zero timeout budget.
    pub fn validate(&self) -> RunResult<()> {
        if self.jobs == 0 {
            return Err(RunError::invalid_input("jobs must be at least 1"));
        }
        if self.exploration.policy == PolicyKind::Timeout && self.exploration.timeout_secs == 0 {
            return Err(RunError::invalid_input(
                "timeout policy needs a budget of at least 1 second",
            ));
        }
        Ok(())
    }

    /// Exploration policy described by these settings
    #[must_use]
    pub fn policy(&self) -> ExplorationPolicy {
        match self.exploration.policy {
            PolicyKind::SingleFork => ExplorationPolicy::SingleFork,
            PolicyKind::Timeout => {
                ExplorationPolicy::timeout(Duration::from_secs(self.exploration.timeout_secs))
            }
        }
    }
}
