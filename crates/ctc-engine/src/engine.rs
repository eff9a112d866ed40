//! Engine capability interface
//!
//! The symbolic execution engine is an external collaborator. This trait is
//! the whole surface the pipeline uses: load a target, build an entry state,
//! explore under a policy, then query each resulting state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binding::{Binding, SimFile, SymbolicBytes};
use crate::error::EngineResult;
use crate::policy::ExplorationPolicy;

/// Engine-side file descriptor of an opened file-like object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDescriptor(pub u32);

/// States left when exploration stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exploration<S> {
    /// States whose path ended
    pub terminated: Vec<S>,
    /// States still runnable when the policy fired
    pub runnable: Vec<S>,
}

impl<S> Exploration<S> {
    /// Total number of states
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.terminated.len() + self.runnable.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every state as an outcome, terminated first
    pub fn into_outcome_states(self) -> impl Iterator<Item = S> {
        self.terminated.into_iter().chain(self.runnable)
    }
}

/// Symbolic execution engine
///
/// Implementations own their projects and states; the pipeline only holds
/// the associated handle types.
pub trait Engine {
    /// A loaded target program
    type Project;
    /// One execution state
    type State;

    /// Load the target executable
    fn load(&mut self, executable: &Path) -> EngineResult<Self::Project>;

    /// Build the entry state with the given argv and file table
    fn entry_state(
        &mut self,
        project: &Self::Project,
        args: &[Binding],
        files: &[SimFile],
    ) -> EngineResult<Self::State>;

    /// Step from `state` until the policy fires or nothing is runnable
    fn explore(
        &mut self,
        state: Self::State,
        policy: &ExplorationPolicy,
    ) -> EngineResult<Exploration<Self::State>>;

    /// One concrete value satisfying the state's constraints
    fn solve_concrete(
        &mut self,
        state: &Self::State,
        symbol: &SymbolicBytes,
    ) -> EngineResult<Vec<u8>>;

    /// Descriptor under which the state opened `path`, if it did
    fn lookup_fd(&mut self, state: &Self::State, path: &str)
        -> EngineResult<Option<FileDescriptor>>;

    /// Concrete content behind a descriptor
    fn dump_by_descriptor(
        &mut self,
        state: &Self::State,
        fd: FileDescriptor,
    ) -> EngineResult<Vec<u8>>;

    /// Concrete content of a file addressed by path
    fn dump_by_path(&mut self, state: &Self::State, path: &str) -> EngineResult<Vec<u8>>;
}
