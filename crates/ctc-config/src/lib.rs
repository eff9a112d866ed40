//! CTC Configuration
//!
//! Declarative description of a target's inputs and the loader that builds
//! it from an XML document.
//!
//! # Core Concepts
//!
//! - [`Configuration`]: executable, ordered arguments, files, optional stdin
//! - [`InputDecl`]: one input, concrete or concolic, with a byte width
//! - [`load`] / [`load_file`]: parse and validate a document
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ctc_config::load_file("target.xml")?;
//! for arg in config.symbolic_arguments() {
//!     println!("{} is {} bytes wide", arg.name(), arg.size());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod loader;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_file};
pub use model::{argument_name, Configuration, InputDecl, InputKind, STDIN_NAME, STDIN_PATH};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
