//! Configuration Model
//!
//! One target's declared inputs: the executable, its positional arguments,
//! the files it reads and an optional standard input. Every input is either
//! concrete (value known up front, arguments only) or concolic (solved for
//! after execution).

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Element name used for standard input in bindings and test cases
pub const STDIN_NAME: &str = "crete-stdin";

/// Path under which standard input is exposed to the engine
pub const STDIN_PATH: &str = "/dev/stdin";

/// Name of the argument at argv position `index`
#[inline]
#[must_use]
pub fn argument_name(index: usize) -> String {
    format!("argv_{index}")
}

/// Which namespace an input lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Positional command-line argument
    Argument,
    /// File read by the target
    File,
    /// The target's standard input
    StandardInput,
}

/// One declared input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDecl {
    kind: InputKind,
    name: String,
    size: usize,
    concolic: bool,
    literal_value: Option<Vec<u8>>,
    index: Option<usize>,
}

impl InputDecl {
    /// Concrete argument at argv position `index`
    ///
    /// `size` is widened to the literal's length when smaller.
    #[must_use]
    pub fn concrete_argument(index: usize, value: impl Into<Vec<u8>>, size: usize) -> Self {
        let value = value.into();
        Self {
            kind: InputKind::Argument,
            name: argument_name(index),
            size: size.max(value.len()),
            concolic: false,
            literal_value: Some(value),
            index: Some(index),
        }
    }

    /// Symbolic argument at argv position `index`
    ///
    /// `default_value` only contributes a minimum width.
    #[must_use]
    pub fn symbolic_argument(index: usize, size: usize, default_value: &[u8]) -> Self {
        Self {
            kind: InputKind::Argument,
            name: argument_name(index),
            size: size.max(default_value.len()),
            concolic: true,
            literal_value: None,
            index: Some(index),
        }
    }

    /// Symbolic file of exactly `size` bytes
    #[must_use]
    pub fn file(path: impl Into<String>, size: usize) -> Self {
        Self {
            kind: InputKind::File,
            name: path.into(),
            size,
            concolic: true,
            literal_value: None,
            index: None,
        }
    }

    /// Symbolic standard input of exactly `size` bytes
    #[must_use]
    pub fn stdin(size: usize) -> Self {
        Self {
            kind: InputKind::StandardInput,
            name: STDIN_NAME.to_string(),
            size,
            concolic: true,
            literal_value: None,
            index: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Identifier, unique within the input's kind
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reserved width in bytes
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn is_concolic(&self) -> bool {
        self.concolic
    }

    /// Literal bytes of a concrete argument
    #[inline]
    #[must_use]
    pub fn literal_value(&self) -> Option<&[u8]> {
        self.literal_value.as_deref()
    }

    /// argv position, for arguments only
    #[inline]
    #[must_use]
    pub fn argument_index(&self) -> Option<usize> {
        self.index
    }

    /// Name written into test-case records
    ///
    /// Files are recorded under their base name; everything else under
    /// [`InputDecl::name`].
    #[must_use]
    pub fn element_name(&self) -> &str {
        match self.kind {
            InputKind::File => Path::new(&self.name)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&self.name),
            InputKind::Argument | InputKind::StandardInput => &self.name,
        }
    }
}

/// Declared inputs of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    executable: PathBuf,
    arguments: Vec<InputDecl>,
    files: Vec<InputDecl>,
    stdin: Option<InputDecl>,
}

impl Configuration {
    /// Create a configuration whose argument 0 is the executable path
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let argv0 = executable.to_string_lossy().into_owned().into_bytes();
        Self {
            arguments: vec![InputDecl::concrete_argument(0, argv0, 0)],
            executable,
            files: Vec::new(),
            stdin: None,
        }
    }

    /// Add a declared argument, keeping the list ordered by index
    ///
    /// # Errors
    /// Returns `Validation` if the index is 0, already taken, or the input is
    /// not an argument.
    pub fn add_argument(&mut self, decl: InputDecl) -> ConfigResult<()> {
        let index = match (decl.kind, decl.index) {
            (InputKind::Argument, Some(index)) => index,
            _ => {
                return Err(ConfigError::validation(format!(
                    "'{}' is not an argument declaration",
                    decl.name
                )))
            }
        };
        if index == 0 {
            return Err(ConfigError::validation(
                "argument index 0 is reserved for the target executable",
            ));
        }
        match self
            .arguments
            .binary_search_by_key(&index, |a| a.index.unwrap_or(0))
        {
            Ok(_) => Err(ConfigError::validation(format!(
                "argument index {index} declared more than once"
            ))),
            Err(pos) => {
                self.arguments.insert(pos, decl);
                Ok(())
            }
        }
    }

    /// Add a declared file, keeping declaration order
    ///
    /// # Errors
    /// Returns `Validation` on a duplicate path or a non-file input.
    pub fn add_file(&mut self, decl: InputDecl) -> ConfigResult<()> {
        if decl.kind != InputKind::File {
            return Err(ConfigError::validation(format!(
                "'{}' is not a file declaration",
                decl.name
            )));
        }
        if self.files.iter().any(|f| f.name == decl.name) {
            return Err(ConfigError::validation(format!(
                "file '{}' declared more than once",
                decl.name
            )));
        }
        self.files.push(decl);
        Ok(())
    }

    /// Set the standard input declaration
    ///
    /// # Errors
    /// Returns `Validation` if stdin is already declared.
    pub fn set_stdin(&mut self, decl: InputDecl) -> ConfigResult<()> {
        if decl.kind != InputKind::StandardInput {
            return Err(ConfigError::validation(format!(
                "'{}' is not a stdin declaration",
                decl.name
            )));
        }
        if self.stdin.is_some() {
            return Err(ConfigError::validation("more than one stdin declared"));
        }
        self.stdin = Some(decl);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments ordered by argv position, argument 0 first
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[InputDecl] {
        &self.arguments
    }

    /// Files in declaration order
    #[inline]
    #[must_use]
    pub fn files(&self) -> &[InputDecl] {
        &self.files
    }

    #[inline]
    #[must_use]
    pub fn stdin(&self) -> Option<&InputDecl> {
        self.stdin.as_ref()
    }

    /// Symbolic arguments in argv order
    pub fn symbolic_arguments(&self) -> impl Iterator<Item = &InputDecl> {
        self.arguments.iter().filter(|a| a.concolic)
    }

    /// Number of inputs that must be solved for after execution
    #[must_use]
    pub fn concolic_input_count(&self) -> usize {
        self.symbolic_arguments().count() + self.files.len() + usize::from(self.stdin.is_some())
    }
}
