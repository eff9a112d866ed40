//! Error types for binding, exploration and collection

/// Errors reported by an engine or the bridge to it
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The bridge process could not be started
    #[error("failed to spawn engine bridge '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO on the bridge pipes failed
    #[error("engine bridge io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge sent something that is not a valid reply
    #[error("engine protocol error: {0}")]
    Protocol(String),

    /// The bridge closed its output
    #[error("engine bridge closed the connection")]
    Closed,

    /// The engine refused a request
    #[error("engine rejected request: {0}")]
    Rejected(String),

    /// No satisfying assignment exists for a symbolic value
    #[error("no concrete solution for '{0}'")]
    Unsatisfiable(String),

    /// A handle does not name a live project or state
    #[error("unknown engine handle: {0}")]
    UnknownHandle(u64),
}

impl EngineError {
    /// The engine answered but has no value for this state
    ///
    /// Everything else means the engine or the bridge to it is gone.
    #[must_use]
    pub fn is_outcome_scoped(&self) -> bool {
        matches!(self, Self::Unsatisfiable(_) | Self::Rejected(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Protocol(value.to_string())
    }
}

/// Errors while turning a configuration into engine bindings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// Argument indices are not dense from 0
    #[error("incomplete argument list: argv_{missing} not declared")]
    IncompleteBinding { missing: usize },
}

/// Errors while extracting concrete values from one state
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The engine produced no concrete value for a declared input
    #[error("unresolved input '{name}': {source}")]
    UnresolvedInput {
        name: String,
        #[source]
        source: EngineError,
    },

    /// The engine failed while being queried
    #[error(transparent)]
    Engine(EngineError),
}

impl CollectError {
    /// Create unresolved-input error
    pub fn unresolved(name: impl Into<String>, source: EngineError) -> Self {
        Self::UnresolvedInput {
            name: name.into(),
            source,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
