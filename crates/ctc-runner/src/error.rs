//! Run-level error type
//!
//! Wraps the per-stage errors so a run reports a single kind, and tells the
//! caller whether the failure happened before the engine was touched.

use std::path::PathBuf;

use ctc_config::ConfigError;
use ctc_engine::{BindError, EngineError};
use ctc_testcase::FormatError;

/// Errors that abort one target
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Loading or validating the configuration failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration could not be bound
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The engine failed before any outcome was produced
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Writing a test case failed
    #[error("failed to write test case: {0}")]
    Format(#[from] FormatError),

    /// Output directory or sidecar IO failed
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file or command line value is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RunError {
    /// Create IO error with the path it concerns
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Failure detected before any engine interaction
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Bind(_))
    }
}

/// Result type alias for run operations
pub type RunResult<T> = Result<T, RunError>;
