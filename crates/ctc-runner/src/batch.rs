//! Batch mode
//!
//! Processes every configuration document of a directory. A failing
//! document is reported and the batch moves on; no document can abort the
//! others. With more than one job, documents are spread over a rayon pool,
//! each getting its own engine from the factory.

use std::fs;
use std::path::{Path, PathBuf};

use ctc_engine::{Engine, ExplorationPolicy};
use rayon::prelude::*;

use crate::error::{RunError, RunResult};
use crate::layout::{sidecar_path, RunContext, SIDECAR_SUFFIX};
use crate::orchestrator::{Orchestrator, TargetReport};

/// Documents found in a batch directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Documents with a sidecar, sorted by name
    pub documents: Vec<PathBuf>,
    /// Documents without a sidecar
    pub skipped: Vec<PathBuf>,
}

/// Find the `*.xml` documents of `dir`
///
/// Documents without a `.serialized` sidecar are skipped with a warning.
///
/// # Errors
/// Returns `InvalidInput` if `dir` is not a directory, `Io` if it cannot be
/// listed.
pub fn discover(dir: &Path) -> RunResult<Discovery> {
    if !dir.is_dir() {
        return Err(RunError::invalid_input(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| RunError::io_error(dir, e))? {
        let path = entry.map_err(|e| RunError::io_error(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            candidates.push(path);
        }
    }
    candidates.sort();

    let mut discovery = Discovery::default();
    for path in candidates {
        if sidecar_path(&path).is_file() {
            discovery.documents.push(path);
        } else {
            tracing::warn!(
                "'{}' does not have a corresponding '{SIDECAR_SUFFIX}' file, skipping",
                path.display()
            );
            discovery.skipped.push(path);
        }
    }
    tracing::info!(
        "Found {} document(s) in {}, {} skipped",
        discovery.documents.len(),
        dir.display(),
        discovery.skipped.len()
    );
    Ok(discovery)
}

/// Result of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<TargetReport>,
    pub failed: Vec<(PathBuf, RunError)>,
    /// Documents never attempted
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    #[inline]
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Test cases written across all documents
    #[must_use]
    pub fn test_cases_written(&self) -> usize {
        self.succeeded.iter().map(|r| r.test_cases.len()).sum()
    }
}

/// Batch runner
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    policy: ExplorationPolicy,
    jobs: usize,
}

impl BatchRunner {
    /// Create runner; `jobs` below 1 is treated as 1
    #[must_use]
    pub fn new(policy: ExplorationPolicy, jobs: usize) -> Self {
        Self {
            policy,
            jobs: jobs.max(1),
        }
    }

    /// Process every discovered document
    ///
    /// `factory` is called once per document that loads successfully.
    pub fn run<E, F>(&self, ctx: &RunContext, discovery: Discovery, factory: F) -> BatchReport
    where
        E: Engine,
        F: Fn() -> RunResult<E> + Sync,
    {
        let results: Vec<(PathBuf, RunResult<TargetReport>)> = if self.jobs > 1 {
            self.run_parallel(ctx, &discovery.documents, &factory)
        } else {
            discovery
                .documents
                .iter()
                .map(|doc| (doc.clone(), self.process_one(ctx, doc, &factory)))
                .collect()
        };

        let mut report = BatchReport {
            skipped: discovery.skipped,
            ..BatchReport::default()
        };
        for (document, result) in results {
            match result {
                Ok(target) => report.succeeded.push(target),
                Err(e) => {
                    tracing::error!("{}: {e}", document.display());
                    report.failed.push((document, e));
                }
            }
        }
        report
    }

    fn run_parallel<E, F>(
        &self,
        ctx: &RunContext,
        documents: &[PathBuf],
        factory: &F,
    ) -> Vec<(PathBuf, RunResult<TargetReport>)>
    where
        E: Engine,
        F: Fn() -> RunResult<E> + Sync,
    {
        let process = || -> Vec<(PathBuf, RunResult<TargetReport>)> {
            documents
                .par_iter()
                .map(|doc| (doc.clone(), self.process_one(ctx, doc, factory)))
                .collect()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => {
                tracing::debug!("Processing batch on {} threads", self.jobs);
                pool.install(process)
            }
            Err(e) => {
                tracing::warn!("Could not build a {}-thread pool ({e}), using the global pool", self.jobs);
                process()
            }
        }
    }

    fn process_one<E, F>(&self, ctx: &RunContext, document: &Path, factory: &F) -> RunResult<TargetReport>
    where
        E: Engine,
        F: Fn() -> RunResult<E>,
    {
        tracing::info!("Processing {}", document.display());
        let config = ctc_config::load_file(document)?;
        let mut orchestrator = Orchestrator::new(factory()?, self.policy);
        orchestrator.process(ctx, document, &config)
    }
}
