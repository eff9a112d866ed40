//! Testing utilities for CTC workspace
//!
//! Shared test helpers: a deterministic in-memory engine and configuration
//! document fixtures.

#![allow(missing_docs)]

use ctc_engine::{
    Binding, Engine, EngineError, EngineResult, Exploration, ExplorationPolicy,
    ExplorationProgress, FileDescriptor, SimFile, SymbolicBytes,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Content written to sidecar fixtures
pub const SIDECAR_CONTENT: &[u8] = b"serialized guest configuration\0\x01\x02";

/// One pre-scripted execution state
#[derive(Debug, Clone, Default)]
pub struct ScriptedState {
    solutions: HashMap<String, Vec<u8>>,
    descriptors: HashMap<String, (FileDescriptor, Vec<u8>)>,
    by_path: HashMap<String, Vec<u8>>,
}

impl ScriptedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solution for a symbolic vector
    pub fn solve(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.solutions.insert(name.to_string(), value.into());
        self
    }

    /// File the state opened under a descriptor
    pub fn open_file(mut self, path: &str, fd: u32, content: impl Into<Vec<u8>>) -> Self {
        self.descriptors
            .insert(path.to_string(), (FileDescriptor(fd), content.into()));
        self
    }

    /// File content only reachable by path
    pub fn file_by_path(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.by_path.insert(path.to_string(), content.into());
        self
    }
}

/// Deterministic engine replaying scripted states
///
/// Records what the pipeline handed it so tests can assert on bindings.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    terminated: Vec<ScriptedState>,
    runnable: Vec<ScriptedState>,
    states: Vec<ScriptedState>,
    load_error: Option<String>,
    pub calls: usize,
    pub loaded: Vec<PathBuf>,
    pub entry_args: Vec<Binding>,
    pub entry_files: Vec<SimFile>,
    pub policies: Vec<ExplorationPolicy>,
    /// Whether the last policy fired on the scripted runnable set
    pub policy_fired: bool,
    pub by_path_dumps: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// State reported as terminated
    pub fn with_terminated(mut self, state: ScriptedState) -> Self {
        self.terminated.push(state);
        self
    }

    /// State reported as still runnable
    pub fn with_runnable(mut self, state: ScriptedState) -> Self {
        self.runnable.push(state);
        self
    }

    /// Make `load` fail
    pub fn failing_load(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    fn state(&self, handle: usize) -> EngineResult<&ScriptedState> {
        self.states
            .get(handle)
            .ok_or(EngineError::UnknownHandle(handle as u64))
    }
}

impl Engine for ScriptedEngine {
    type Project = PathBuf;
    type State = usize;

    fn load(&mut self, executable: &Path) -> EngineResult<PathBuf> {
        self.calls += 1;
        if let Some(message) = &self.load_error {
            return Err(EngineError::Rejected(message.clone()));
        }
        self.loaded.push(executable.to_path_buf());
        Ok(executable.to_path_buf())
    }

    fn entry_state(
        &mut self,
        _project: &PathBuf,
        args: &[Binding],
        files: &[SimFile],
    ) -> EngineResult<usize> {
        self.calls += 1;
        self.entry_args = args.to_vec();
        self.entry_files = files.to_vec();
        Ok(usize::MAX)
    }

    fn explore(
        &mut self,
        _state: usize,
        policy: &ExplorationPolicy,
    ) -> EngineResult<Exploration<usize>> {
        self.calls += 1;
        self.policies.push(*policy);
        self.policy_fired = policy.should_stop(ExplorationProgress {
            active: self.runnable.len(),
            elapsed: Duration::ZERO,
        });

        let terminated_count = self.terminated.len();
        self.states = self.terminated.drain(..).chain(self.runnable.drain(..)).collect();
        Ok(Exploration {
            terminated: (0..terminated_count).collect(),
            runnable: (terminated_count..self.states.len()).collect(),
        })
    }

    fn solve_concrete(&mut self, state: &usize, symbol: &SymbolicBytes) -> EngineResult<Vec<u8>> {
        self.calls += 1;
        self.state(*state)?
            .solutions
            .get(symbol.name())
            .cloned()
            .ok_or_else(|| EngineError::Unsatisfiable(symbol.name().to_string()))
    }

    fn lookup_fd(&mut self, state: &usize, path: &str) -> EngineResult<Option<FileDescriptor>> {
        self.calls += 1;
        Ok(self.state(*state)?.descriptors.get(path).map(|(fd, _)| *fd))
    }

    fn dump_by_descriptor(&mut self, state: &usize, fd: FileDescriptor) -> EngineResult<Vec<u8>> {
        self.calls += 1;
        self.state(*state)?
            .descriptors
            .values()
            .find(|(candidate, _)| *candidate == fd)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| EngineError::Rejected(format!("bad descriptor {}", fd.0)))
    }

    fn dump_by_path(&mut self, state: &usize, path: &str) -> EngineResult<Vec<u8>> {
        self.calls += 1;
        self.by_path_dumps += 1;
        self.state(*state)?
            .by_path
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::Rejected(format!("no such file: {path}")))
    }
}

/// Create an empty file standing in for the target executable
pub fn fake_executable(dir: &Path) -> PathBuf {
    let path = dir.join("target-program");
    fs::write(&path, b"\x7fELF").unwrap();
    path
}

/// Configuration document around `body`
pub fn config_document(executable: &Path, body: &str) -> String {
    format!(
        "<crete>\n  <exec>{}</exec>\n  {body}\n</crete>\n",
        executable.display()
    )
}

/// Write a document, optionally with its `.serialized` sidecar
pub fn write_document(dir: &Path, file_name: &str, xml: &str, with_sidecar: bool) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, xml).unwrap();
    if with_sidecar {
        fs::write(dir.join(format!("{file_name}.serialized")), SIDECAR_CONTENT).unwrap();
    }
    path
}
