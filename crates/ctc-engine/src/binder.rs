//! Execution Binder
//!
//! Turns a [`Configuration`] into the argv and file table an engine builds
//! its entry state from.

use ctc_config::{Configuration, InputDecl, STDIN_PATH};

use crate::binding::{Binding, BoundInputs, SimFile, SymbolicBytes};
use crate::error::BindError;

/// Bind every declared input
///
/// Each declared file path is also appended to argv after the declared
/// arguments, so targets that take their input files as arguments see them.
/// This changes argv length with the number of files.
///
/// # Errors
/// Returns `IncompleteBinding` if argument indices are not dense from 0.
pub fn bind(config: &Configuration) -> Result<BoundInputs, BindError> {
    let mut args = Vec::with_capacity(config.arguments().len() + config.files().len());

    for (position, decl) in config.arguments().iter().enumerate() {
        if decl.argument_index() != Some(position) {
            return Err(BindError::IncompleteBinding { missing: position });
        }
        args.push(bind_argument(decl));
    }

    let files: Vec<SimFile> = config
        .files()
        .iter()
        .map(|decl| SimFile::new(decl.name(), decl.name(), decl.size()))
        .collect();

    for file in &files {
        tracing::debug!("appending file path '{}' to argv", file.path());
        args.push(Binding::Concrete(file.path().as_bytes().to_vec()));
    }

    let stdin = config
        .stdin()
        .map(|decl| SimFile::new(STDIN_PATH, decl.name(), decl.size()));

    for arg in &args {
        tracing::debug!("argument binding: {arg:?}");
    }

    Ok(BoundInputs { args, files, stdin })
}

fn bind_argument(decl: &InputDecl) -> Binding {
    match decl.literal_value() {
        Some(bytes) if !decl.is_concolic() => Binding::Concrete(bytes.to_vec()),
        _ => Binding::Symbolic(SymbolicBytes::new(decl.name(), decl.size())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> Configuration {
        let mut config = Configuration::new("/bin/target");
        config
            .add_argument(InputDecl::concrete_argument(1, "-n", 0))
            .unwrap();
        config
            .add_argument(InputDecl::symbolic_argument(2, 8, b""))
            .unwrap();
        config
    }

    #[test]
    fn binds_concrete_and_symbolic_arguments() {
        let bound = bind(&config()).unwrap();

        assert_eq!(
            bound.args,
            vec![
                Binding::Concrete(b"/bin/target".to_vec()),
                Binding::Concrete(b"-n".to_vec()),
                Binding::Symbolic(SymbolicBytes::new("argv_2", 8)),
            ]
        );
        assert!(bound.files.is_empty());
        assert!(bound.stdin.is_none());
    }

    #[test]
    fn concrete_literal_is_not_padded() {
        let mut config = Configuration::new("/bin/target");
        config
            .add_argument(InputDecl::concrete_argument(1, "ab", 10))
            .unwrap();
        let bound = bind(&config).unwrap();
        assert_eq!(bound.args[1], Binding::Concrete(b"ab".to_vec()));
    }

    #[test]
    fn file_paths_are_appended_to_argv() {
        let mut config = config();
        config.add_file(InputDecl::file("/tmp/a.txt", 6)).unwrap();
        config.add_file(InputDecl::file("/tmp/b.txt", 3)).unwrap();

        let bound = bind(&config).unwrap();

        assert_eq!(bound.args.len(), 5);
        assert_eq!(bound.args[3], Binding::Concrete(b"/tmp/a.txt".to_vec()));
        assert_eq!(bound.args[4], Binding::Concrete(b"/tmp/b.txt".to_vec()));
        assert_eq!(bound.files[0].path(), "/tmp/a.txt");
        assert_eq!(bound.files[0].size(), 6);
        assert_eq!(bound.files[1].content().name(), "/tmp/b.txt");
    }

    #[test]
    fn stdin_exposed_as_dev_stdin() {
        let mut config = config();
        config.set_stdin(InputDecl::stdin(12)).unwrap();

        let bound = bind(&config).unwrap();
        let stdin = bound.stdin.unwrap();
        assert_eq!(stdin.path(), "/dev/stdin");
        assert_eq!(stdin.size(), 12);
        assert_eq!(stdin.content().name(), "crete-stdin");
    }

    #[test]
    fn gap_in_argument_indices_rejected() {
        let mut config = Configuration::new("/bin/target");
        config
            .add_argument(InputDecl::symbolic_argument(1, 4, b""))
            .unwrap();
        config
            .add_argument(InputDecl::symbolic_argument(3, 4, b""))
            .unwrap();

        assert_eq!(
            bind(&config).unwrap_err(),
            BindError::IncompleteBinding { missing: 2 }
        );
    }

    #[test]
    fn symbolic_args_iterate_in_argv_order() {
        let mut config = Configuration::new("/bin/target");
        config.add_argument(InputDecl::symbolic_argument(2, 4, b"")).unwrap();
        config.add_argument(InputDecl::symbolic_argument(1, 2, b"")).unwrap();

        let bound = bind(&config).unwrap();
        let names: Vec<_> = bound.symbolic_args().map(SymbolicBytes::name).collect();
        assert_eq!(names, ["argv_1", "argv_2"]);
    }
}
