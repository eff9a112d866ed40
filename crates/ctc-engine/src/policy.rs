//! Exploration termination policies
//!
//! Bound the otherwise unbounded exploration step. Policies are plain data
//! so they can cross a process boundary to an external engine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock budget for [`ExplorationPolicy::Timeout`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

/// Snapshot of exploration progress handed to a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorationProgress {
    /// States currently runnable
    pub active: usize,
    /// Wall-clock time since exploration started
    pub elapsed: Duration,
}

/// When to stop stepping the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplorationPolicy {
    /// Stop as soon as more than one state is runnable
    SingleFork,
    /// Stop once the budget has elapsed
    Timeout {
        #[serde(with = "millis")]
        budget: Duration,
    },
}

impl ExplorationPolicy {
    /// Timeout policy with the given budget
    #[inline]
    #[must_use]
    pub fn timeout(budget: Duration) -> Self {
        Self::Timeout { budget }
    }

    /// Check whether exploration should stop
    #[must_use]
    pub fn should_stop(&self, progress: ExplorationProgress) -> bool {
        match self {
            Self::SingleFork => progress.active > 1,
            Self::Timeout { budget } => progress.elapsed > *budget,
        }
    }
}

impl Default for ExplorationPolicy {
    fn default() -> Self {
        Self::SingleFork
    }
}

impl fmt::Display for ExplorationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleFork => write!(f, "single-fork"),
            Self::Timeout { budget } => write!(f, "timeout({}s)", budget.as_secs_f64()),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
