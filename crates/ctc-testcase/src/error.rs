//! Error types for test-case records

/// Errors while writing or reading a test-case record
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Underlying reader/writer failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record ended before a declared field was complete
    #[error("truncated record: expected {expected} bytes of {field}, found {found}")]
    Truncated {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A length or count field holds a negative value
    #[error("negative {field}: {value}")]
    NegativeLength { field: &'static str, value: i32 },

    /// A length does not fit the 32-bit signed wire field
    #[error("{field} of {len} bytes exceeds the 32-bit wire limit")]
    LengthOverflow { field: &'static str, len: usize },

    /// Element name is not valid UTF-8
    #[error("element name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),

    /// Bytes remain after the last declared element
    #[error("{0} trailing bytes after the last element")]
    TrailingBytes(usize),
}

/// Result type alias for record operations
pub type FormatResult<T> = Result<T, FormatError>;
