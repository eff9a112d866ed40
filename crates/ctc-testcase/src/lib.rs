//! CTC Test-Case Records
//!
//! The binary record a replay tool consumes: a count followed by
//! length-prefixed name/value pairs, all little-endian.
//!
//! - [`TestCase`]: ordered name/value pairs, encode/decode
//! - [`TestCaseWriter`]: streaming writer that patches the count last
//! - [`normalize_to_width`]: truncate-or-pad policy for file-like values

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod normalize;
mod record;

pub use error::{FormatError, FormatResult};
pub use normalize::normalize_to_width;
pub use record::{TestCase, TestCaseElement, TestCaseWriter};

/// File extension of a written record
pub const RECORD_EXTENSION: &str = "bin";
