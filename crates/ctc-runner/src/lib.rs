//! CTC Runner
//!
//! Ties the workspace together: runs a target through its engine, encodes
//! every outcome as a test case and lays the results out on disk.
//!
//! # Core Concepts
//!
//! - [`Orchestrator`]: one engine, one policy, one target at a time
//! - [`RunContext`]: the run directory every writer is handed explicitly
//! - [`BatchRunner`]: a directory of documents, failures isolated per document
//! - [`Settings`]: TOML defaults for the `ctc` binary
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ctc_config::load_file("target.xml")?;
//! let engine = ctc_engine::ProcessEngine::spawn("python3", &["bridge.py".into()])?;
//! let ctx = RunContext::create(".")?;
//! let mut orchestrator = Orchestrator::new(engine, ExplorationPolicy::SingleFork);
//! let report = orchestrator.process(&ctx, Path::new("target.xml"), &config)?;
//! println!("{} test cases", report.test_cases.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod batch;
mod encoder;
mod error;
mod layout;
pub mod logging;
mod orchestrator;
mod settings;

pub use batch::{discover, BatchReport, BatchRunner, Discovery};
pub use encoder::{encode, write_test_case};
pub use error::{RunError, RunResult};
pub use layout::{sidecar_path, RunContext, TargetLayout, RUN_DIR_PREFIX, SIDECAR_SUFFIX};
pub use orchestrator::{Harvest, Orchestrator, TargetReport};
pub use settings::{EngineSettings, ExplorationSettings, OutputSettings, PolicyKind, Settings};
