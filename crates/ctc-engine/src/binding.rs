//! Engine-facing input bindings

use std::fmt;

/// A named, unconstrained byte vector the engine solves for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicBytes {
    name: String,
    width: usize,
}

impl SymbolicBytes {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }

    /// Name of the input this vector stands for
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in bytes
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// One positional argument as handed to the engine
#[derive(Clone, PartialEq, Eq)]
pub enum Binding {
    /// Known bytes, passed through unchanged
    Concrete(Vec<u8>),
    /// Unknown bytes, solved per outcome
    Symbolic(SymbolicBytes),
}

impl Binding {
    #[inline]
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    /// The symbolic vector, if any
    #[inline]
    #[must_use]
    pub fn as_symbolic(&self) -> Option<&SymbolicBytes> {
        match self {
            Self::Symbolic(sym) => Some(sym),
            Self::Concrete(_) => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(bytes) => {
                write!(f, "Concrete({:?})", String::from_utf8_lossy(bytes))
            }
            Self::Symbolic(sym) => write!(f, "Symbolic({}, {} bytes)", sym.name, sym.width),
        }
    }
}

/// A file-like object exposed to the target
///
/// Content is `size` bytes of unconstrained symbolic data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimFile {
    path: String,
    content: SymbolicBytes,
}

impl SimFile {
    /// Create a symbolic file; `name` identifies the declaring input
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>, size: usize) -> Self {
        Self {
            path: path.into(),
            content: SymbolicBytes::new(name, size),
        }
    }

    /// Path the target opens
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.width
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> &SymbolicBytes {
        &self.content
    }
}

/// Everything the engine needs to build an entry state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInputs {
    /// argv, in order, including appended file paths
    pub args: Vec<Binding>,
    /// Declared files, in declaration order
    pub files: Vec<SimFile>,
    /// Standard input exposed as a file
    pub stdin: Option<SimFile>,
}

impl BoundInputs {
    /// Files and stdin as one table, stdin last
    #[must_use]
    pub fn file_table(&self) -> Vec<SimFile> {
        self.files.iter().chain(self.stdin.iter()).cloned().collect()
    }

    /// Symbolic argument vectors in argv order
    pub fn symbolic_args(&self) -> impl Iterator<Item = &SymbolicBytes> {
        self.args.iter().filter_map(Binding::as_symbolic)
    }
}
