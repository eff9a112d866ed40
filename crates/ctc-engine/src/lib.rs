//! CTC Engine Layer
//!
//! Everything between a loaded [`ctc_config::Configuration`] and the
//! concrete values of each explored path:
//!
//! 1. **Bind**: [`bind`] turns declarations into argv and a file table
//! 2. **Explore**: an [`Engine`] runs the target under an [`ExplorationPolicy`]
//! 3. **Collect**: [`collect`] solves every concolic input per state
//!
//! The engine itself is external. [`ProcessEngine`] talks to one running
//! in a child process.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod binder;
mod binding;
mod collector;
mod engine;
mod error;
mod policy;
mod process;

pub use binder::bind;
pub use binding::{Binding, BoundInputs, SimFile, SymbolicBytes};
pub use collector::{collect, CollectedValue, Outcome};
pub use engine::{Engine, Exploration, FileDescriptor};
pub use error::{BindError, CollectError, EngineError, EngineResult};
pub use policy::{ExplorationPolicy, ExplorationProgress, DEFAULT_TIMEOUT};
pub use process::{BridgeHandle, ProcessEngine};
