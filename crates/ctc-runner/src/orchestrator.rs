//! Run Orchestrator
//!
//! Drives one target through Load → Bind → Explore → Collect → Encode.
//! Nothing is written until exploration has succeeded, so a target that
//! fails to load or bind leaves no output behind.

use std::path::{Path, PathBuf};

use ctc_config::Configuration;
use ctc_engine::{bind, collect, CollectError, Engine, ExplorationPolicy, Outcome};

use crate::encoder::write_test_case;
use crate::error::RunResult;
use crate::layout::{RunContext, TargetLayout};

/// Outcomes harvested from one exploration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Harvest {
    /// Collected outcomes, terminated states first
    pub outcomes: Vec<Outcome>,
    /// States dropped because an input could not be resolved
    pub skipped: usize,
}

/// Summary of one processed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub document: PathBuf,
    pub output_dir: PathBuf,
    /// Test cases written, in sequence order
    pub test_cases: Vec<PathBuf>,
    pub skipped: usize,
    pub sidecar_copied: bool,
}

/// Runs targets on one engine
#[derive(Debug)]
pub struct Orchestrator<E: Engine> {
    engine: E,
    policy: ExplorationPolicy,
}

impl<E: Engine> Orchestrator<E> {
    /// Create orchestrator
    #[inline]
    #[must_use]
    pub fn new(engine: E, policy: ExplorationPolicy) -> Self {
        Self { engine, policy }
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ExplorationPolicy {
        &self.policy
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    #[must_use]
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Explore the target and collect every outcome
    ///
    /// States whose inputs cannot all be resolved are skipped and counted.
    ///
    /// # Errors
    /// Returns `Bind` if the configuration cannot be bound, `Engine` if
    /// loading, entry or exploration fails or the engine dies while states
    /// are queried.
    pub fn run(&mut self, config: &Configuration) -> RunResult<Harvest> {
        let bound = bind(config)?;

        let project = self.engine.load(config.executable())?;
        let entry = self
            .engine
            .entry_state(&project, &bound.args, &bound.file_table())?;

        tracing::info!("Exploring under {} policy", self.policy);
        let exploration = self.engine.explore(entry, &self.policy)?;
        tracing::info!(
            "Exploration finished: {} terminated, {} runnable",
            exploration.terminated.len(),
            exploration.runnable.len()
        );

        let mut harvest = Harvest {
            outcomes: Vec::with_capacity(exploration.len()),
            skipped: 0,
        };
        for state in exploration.into_outcome_states() {
            match collect(&mut self.engine, &state, config, &bound) {
                Ok(outcome) => harvest.outcomes.push(outcome),
                Err(e @ CollectError::UnresolvedInput { .. }) => {
                    tracing::warn!("Skipping outcome: {e}");
                    harvest.skipped += 1;
                }
                Err(CollectError::Engine(e)) => return Err(e.into()),
            }
        }
        Ok(harvest)
    }

    /// Run a loaded configuration and write its test cases
    ///
    /// Test cases are numbered from 1 over the outcomes actually written.
    ///
    /// # Errors
    /// Everything [`Orchestrator::run`] reports, plus `Io`/`Format` while
    /// writing output.
    pub fn process(
        &mut self,
        ctx: &RunContext,
        document: &Path,
        config: &Configuration,
    ) -> RunResult<TargetReport> {
        let harvest = self.run(config)?;
        let layout = TargetLayout::prepare(ctx, document)?;

        let mut test_cases = Vec::with_capacity(harvest.outcomes.len());
        for (i, outcome) in harvest.outcomes.iter().enumerate() {
            let path = layout.test_case_path(i + 1);
            write_test_case(&path, outcome)?;
            test_cases.push(path);
        }

        tracing::info!(
            "{}: {} test case(s) written, {} skipped",
            document.display(),
            test_cases.len(),
            harvest.skipped
        );
        Ok(TargetReport {
            document: document.to_path_buf(),
            output_dir: layout.dir().to_path_buf(),
            test_cases,
            skipped: harvest.skipped,
            sidecar_copied: layout.sidecar_copied(),
        })
    }

    /// Load a document from disk, then [`Orchestrator::process`] it
    ///
    /// # Errors
    /// Returns `Config` if the document does not load.
    pub fn process_document(&mut self, ctx: &RunContext, document: &Path) -> RunResult<TargetReport> {
        let config = ctc_config::load_file(document)?;
        self.process(ctx, document, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use ctc_config::InputDecl;
    use ctc_engine::{
        Binding, EngineError, EngineResult, Exploration, FileDescriptor, SimFile, SymbolicBytes,
    };
    use pretty_assertions::assert_eq;

    /// Engine whose every state solves each symbol to its name's bytes
    #[derive(Debug, Default)]
    struct EchoEngine {
        states: usize,
        fail_on: Option<usize>,
        closed_on: Option<usize>,
        explored_with: Option<ExplorationPolicy>,
    }

    impl Engine for EchoEngine {
        type Project = ();
        type State = usize;

        fn load(&mut self, _executable: &Path) -> EngineResult<()> {
            Ok(())
        }

        fn entry_state(&mut self, _: &(), _: &[Binding], _: &[SimFile]) -> EngineResult<usize> {
            Ok(0)
        }

        fn explore(
            &mut self,
            _state: usize,
            policy: &ExplorationPolicy,
        ) -> EngineResult<Exploration<usize>> {
            self.explored_with = Some(*policy);
            Ok(Exploration {
                terminated: (0..self.states).collect(),
                runnable: Vec::new(),
            })
        }

        fn solve_concrete(&mut self, state: &usize, symbol: &SymbolicBytes) -> EngineResult<Vec<u8>> {
            if self.closed_on == Some(*state) {
                return Err(EngineError::Closed);
            }
            if self.fail_on == Some(*state) {
                return Err(EngineError::Unsatisfiable(symbol.name().to_string()));
            }
            Ok(symbol.name().as_bytes().to_vec())
        }

        fn lookup_fd(&mut self, _: &usize, _: &str) -> EngineResult<Option<FileDescriptor>> {
            Ok(None)
        }

        fn dump_by_descriptor(&mut self, _: &usize, _: FileDescriptor) -> EngineResult<Vec<u8>> {
            Ok(Vec::new())
        }

        fn dump_by_path(&mut self, _: &usize, _: &str) -> EngineResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn config() -> Configuration {
        let mut config = Configuration::new("/bin/target");
        config
            .add_argument(InputDecl::symbolic_argument(1, 8, b""))
            .unwrap();
        config
    }

    #[test]
    fn run_collects_every_state() {
        let engine = EchoEngine {
            states: 3,
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::new(engine, ExplorationPolicy::SingleFork);

        let harvest = orchestrator.run(&config()).unwrap();

        assert_eq!(harvest.outcomes.len(), 3);
        assert_eq!(harvest.skipped, 0);
        assert_eq!(harvest.outcomes[0].values[0].value, b"argv_1");
    }

    #[test]
    fn policy_is_passed_through() {
        let policy = ExplorationPolicy::timeout(std::time::Duration::from_secs(2));
        let mut orchestrator = Orchestrator::new(EchoEngine::default(), policy);

        orchestrator.run(&config()).unwrap();

        assert_eq!(orchestrator.into_engine().explored_with, Some(policy));
    }

    #[test]
    fn unresolved_state_is_skipped() {
        let engine = EchoEngine {
            states: 3,
            fail_on: Some(1),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::new(engine, ExplorationPolicy::SingleFork);

        let harvest = orchestrator.run(&config()).unwrap();

        assert_eq!(harvest.outcomes.len(), 2);
        assert_eq!(harvest.skipped, 1);
    }

    #[test]
    fn engine_failure_while_collecting_aborts() {
        let engine = EchoEngine {
            states: 3,
            closed_on: Some(1),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::new(engine, ExplorationPolicy::SingleFork);

        let err = orchestrator.run(&config()).unwrap_err();

        assert!(matches!(err, RunError::Engine(EngineError::Closed)));
    }

    #[test]
    fn process_numbers_written_outcomes_densely() {
        let out = tempfile::tempdir().unwrap();
        let ctx = RunContext::at(out.path()).unwrap();
        let engine = EchoEngine {
            states: 3,
            fail_on: Some(0),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::new(engine, ExplorationPolicy::SingleFork);

        let report = orchestrator
            .process(&ctx, Path::new("/in/target.xml"), &config())
            .unwrap();

        let names: Vec<_> = report
            .test_cases
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["1.bin", "2.bin"]);
        assert_eq!(report.skipped, 1);
        assert!(report.test_cases.iter().all(|p| p.is_file()));
    }
}
