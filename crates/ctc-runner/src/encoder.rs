//! Test Case Encoder
//!
//! Turns a collected [`Outcome`] into a test-case record. File and stdin
//! values are forced to their declared width; argument values are written
//! exactly as solved.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ctc_config::InputKind;
use ctc_engine::{CollectedValue, Outcome};
use ctc_testcase::{normalize_to_width, TestCase, TestCaseElement};

use crate::error::{RunError, RunResult};

/// Value as it is recorded
fn recorded_value(value: &CollectedValue) -> Vec<u8> {
    match value.kind {
        InputKind::File | InputKind::StandardInput => {
            normalize_to_width(&value.value, value.declared_size)
        }
        InputKind::Argument => value.value.clone(),
    }
}

/// Build the record of one outcome, elements in outcome order
#[must_use]
pub fn encode(outcome: &Outcome) -> TestCase {
    outcome
        .values
        .iter()
        .map(|v| TestCaseElement::new(v.element_name.clone(), recorded_value(v)))
        .collect()
}

/// Write the record of one outcome to `path`
///
/// Returns the number of elements written.
///
/// # Errors
/// Returns `Io` if the file cannot be created, `Format` if writing fails.
pub fn write_test_case(path: &Path, outcome: &Outcome) -> RunResult<usize> {
    let record = encode(outcome);
    let file = File::create(path).map_err(|e| RunError::io_error(path, e))?;
    record.write_to(BufWriter::new(file))?;
    let count = record.len();

    tracing::debug!("Wrote {} ({count} elements)", path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value(kind: InputKind, name: &str, size: usize, bytes: &[u8]) -> CollectedValue {
        CollectedValue {
            kind,
            element_name: name.to_string(),
            declared_size: size,
            value: bytes.to_vec(),
        }
    }

    fn outcome() -> Outcome {
        Outcome {
            values: vec![
                value(InputKind::Argument, "argv_1", 4, b"abcdef"),
                value(InputKind::File, "data.bin", 6, b"0123456789"),
                value(InputKind::StandardInput, "crete-stdin", 4, b"x"),
            ],
        }
    }

    #[test]
    fn files_are_normalized_arguments_are_not() {
        let record = encode(&outcome());

        assert_eq!(record.get("argv_1"), Some(&b"abcdef"[..]));
        assert_eq!(record.get("data.bin"), Some(&b"012345"[..]));
        assert_eq!(record.get("crete-stdin"), Some(&b"x\0\0\0"[..]));
    }

    #[test]
    fn written_file_decodes_to_encoded_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.bin");

        let count = write_test_case(&path, &outcome()).unwrap();

        assert_eq!(count, 3);
        let decoded = TestCase::decode(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(decoded, encode(&outcome()));
    }

    #[test]
    fn file_bytes_match_record_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.bin");

        write_test_case(&path, &outcome()).unwrap();

        let expected = encode(&outcome()).encode().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn empty_outcome_writes_zero_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.bin");

        write_test_case(&path, &Outcome::default()).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), 0i32.to_le_bytes());
    }
}
