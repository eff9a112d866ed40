//! Error types for configuration loading
//!
//! Three families, matching how a run reacts to them:
//! - Missing inputs (document or executable not on disk)
//! - Structurally broken documents
//! - Well-formed documents that declare something the engine cannot accept

use std::path::PathBuf;

/// Configuration-time error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document or the target executable does not exist
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What was being looked up ("configuration document", "target executable")
        what: &'static str,
        /// The path that did not resolve
        path: PathBuf,
    },

    /// The document is structurally invalid
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// The document declares inputs that cannot be bound
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// The document exists but could not be read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create not-found error for a path
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Create malformed-document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error is a missing file rather than a bad document
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
