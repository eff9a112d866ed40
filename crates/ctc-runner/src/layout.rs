//! Output directory layout
//!
//! ```text
//! concolic-out-2024-05-01_12-30-00/
//!     target.xml/
//!         guest-data/crete-guest-config.serialized
//!         test-case-parsed/1.bin
//!         test-case-parsed/2.bin
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ctc_testcase::RECORD_EXTENSION;

use crate::error::{RunError, RunResult};

/// Prefix of every run directory name
pub const RUN_DIR_PREFIX: &str = "concolic-out-";

/// Suffix appended to a document path to name its sidecar
pub const SIDECAR_SUFFIX: &str = ".serialized";

const GUEST_DATA_DIR: &str = "guest-data";
const GUEST_CONFIG_FILE: &str = "crete-guest-config.serialized";
const TEST_CASE_DIR: &str = "test-case-parsed";

/// Sidecar path of a configuration document
#[must_use]
pub fn sidecar_path(document: &Path) -> PathBuf {
    let mut path = OsString::from(document.as_os_str());
    path.push(SIDECAR_SUFFIX);
    PathBuf::from(path)
}

/// Root directory of one invocation
///
/// Passed explicitly to everything that writes output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    root: PathBuf,
}

impl RunContext {
    /// Create a timestamped run directory under `parent`
    ///
    /// # Errors
    /// Returns `Io` if the directory cannot be created.
    pub fn create(parent: impl AsRef<Path>) -> RunResult<Self> {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        Self::at(parent.as_ref().join(format!("{RUN_DIR_PREFIX}{stamp}")))
    }

    /// Use `root` as the run directory
    ///
    /// # Errors
    /// Returns `Io` if the directory cannot be created.
    pub fn at(root: impl Into<PathBuf>) -> RunResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| RunError::io_error(&root, e))?;
        tracing::info!("Output directory: {}", root.display());
        Ok(Self { root })
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output directory of one document, named after its base name
    #[must_use]
    pub fn target_dir(&self, document: &Path) -> PathBuf {
        match document.file_name() {
            Some(name) => self.root.join(name),
            None => self.root.join("target"),
        }
    }
}

/// Per-document output directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    dir: PathBuf,
    test_cases: PathBuf,
    sidecar_copied: bool,
}

impl TargetLayout {
    /// Create the document's directories and copy its sidecar
    ///
    /// A missing sidecar is logged and otherwise ignored.
    ///
    /// # Errors
    /// Returns `Io` if a directory cannot be created or the sidecar copy
    /// fails.
    pub fn prepare(ctx: &RunContext, document: &Path) -> RunResult<Self> {
        let dir = ctx.target_dir(document);
        let guest_data = dir.join(GUEST_DATA_DIR);
        let test_cases = dir.join(TEST_CASE_DIR);
        for path in [&guest_data, &test_cases] {
            fs::create_dir_all(path).map_err(|e| RunError::io_error(path, e))?;
        }

        let sidecar = sidecar_path(document);
        let sidecar_copied = if sidecar.is_file() {
            let dest = guest_data.join(GUEST_CONFIG_FILE);
            fs::copy(&sidecar, &dest).map_err(|e| RunError::io_error(&dest, e))?;
            true
        } else {
            tracing::warn!(
                "'{}' does not have a corresponding '{SIDECAR_SUFFIX}' file",
                document.display()
            );
            false
        };

        Ok(Self {
            dir,
            test_cases,
            sidecar_copied,
        })
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    #[must_use]
    pub fn test_case_dir(&self) -> &Path {
        &self.test_cases
    }

    #[inline]
    #[must_use]
    pub fn sidecar_copied(&self) -> bool {
        self.sidecar_copied
    }

    /// Path of the `sequence`th test case
    #[must_use]
    pub fn test_case_path(&self, sequence: usize) -> PathBuf {
        self.test_cases
            .join(format!("{sequence}.{RECORD_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sidecar_suffix_is_appended() {
        assert_eq!(
            sidecar_path(Path::new("/in/target.xml")),
            PathBuf::from("/in/target.xml.serialized")
        );
    }

    #[test]
    fn run_dir_is_timestamped() {
        let parent = tempfile::tempdir().unwrap();
        let ctx = RunContext::create(parent.path()).unwrap();

        let name = ctx.root().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(RUN_DIR_PREFIX));
        // YYYY-mm-dd_HH-MM-SS
        assert_eq!(name.len(), RUN_DIR_PREFIX.len() + 19);
        assert!(ctx.root().is_dir());
    }

    #[test]
    fn prepare_copies_sidecar() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let document = input.path().join("target.xml");
        fs::write(&document, "<crete/>").unwrap();
        fs::write(sidecar_path(&document), b"guest\0config").unwrap();

        let ctx = RunContext::at(output.path().join("run")).unwrap();
        let layout = TargetLayout::prepare(&ctx, &document).unwrap();

        assert!(layout.sidecar_copied());
        assert_eq!(layout.dir(), ctx.root().join("target.xml"));
        let copied = fs::read(layout.dir().join("guest-data/crete-guest-config.serialized")).unwrap();
        assert_eq!(copied, b"guest\0config");
        assert!(layout.test_case_dir().is_dir());
        assert_eq!(
            layout.test_case_path(3),
            ctx.root().join("target.xml/test-case-parsed/3.bin")
        );
    }

    #[test]
    fn missing_sidecar_is_tolerated() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let document = input.path().join("lonely.xml");
        fs::write(&document, "<crete/>").unwrap();

        let ctx = RunContext::at(output.path()).unwrap();
        let layout = TargetLayout::prepare(&ctx, &document).unwrap();

        assert!(!layout.sidecar_copied());
        assert!(layout.dir().join("guest-data").is_dir());
    }
}
