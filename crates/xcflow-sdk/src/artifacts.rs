//! Artifact tree layout and ownership.
//!
//! Every run owns a single output directory, recreated empty by the clean
//! phase. All build, test-report, and packaging outputs live under it:
//!
//! ```text
//! <artifacts>/
//!   <Configuration>-<sdk>/          install root per build variant
//!   <Configuration>-<sdk>-dSYMs.zip debug-symbol archive
//!   UnitTests-install/              test-target install root (deleted after tests)
//!   UnitTestsReports/               collected test reports
//!   <project>.ipa                   signed package
//!   run-meta.json                   run metadata
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{Configuration, FlowError, Sdk};

/// The per-run output directory.
///
/// No cross-run state is retained: [`ArtifactTree::reset`] deletes and
/// recreates the root so the tree is always empty when the first phase starts.
#[derive(Debug, Clone)]
pub struct ArtifactTree {
    root: PathBuf,
}

impl ArtifactTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deletes and recreates the artifact root.
    ///
    /// Failure here (permission denied, root is a file) is fatal for the run.
    pub fn reset(&self) -> Result<(), FlowError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Install root for one build variant: `<artifacts>/<Configuration>-<sdk>`.
    pub fn install_dir(&self, configuration: Configuration, sdk: Sdk) -> PathBuf {
        self.root
            .join(format!("{}-{}", configuration.as_str(), sdk.as_str()))
    }

    /// Destination of the debug-symbol archive for one build variant.
    pub fn dsym_archive(&self, configuration: Configuration, sdk: Sdk) -> PathBuf {
        self.root.join(format!(
            "{}-{}-dSYMs.zip",
            configuration.as_str(),
            sdk.as_str()
        ))
    }

    /// Dedicated install root for the unit-test build, removed once reports
    /// have been collected.
    pub fn test_install_dir(&self) -> PathBuf {
        self.root.join("UnitTests-install")
    }

    /// Directory the test phase copies report files into.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("UnitTestsReports")
    }

    /// Path of the signed package produced by the package phase.
    pub fn ipa_path(&self, project_name: &str) -> PathBuf {
        self.root.join(format!("{project_name}.ipa"))
    }
}

/// Run-level lock guarding the artifact tree.
///
/// The lock file lives next to the artifact root (not inside it, which the
/// clean phase wipes) and is removed when the guard drops. A second run
/// against the same tree fails fast with [`FlowError::Locked`] instead of
/// racing on the clean phase.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquires the lock for an artifact root, creating the lock file.
    pub fn acquire(tree: &ArtifactTree) -> Result<Self, FlowError> {
        let path = Self::lock_path(tree.root());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(FlowError::Locked(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn lock_path(root: &Path) -> PathBuf {
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifacts");
        match root.parent() {
            Some(parent) => parent.join(format!(".{name}.lock")),
            None => root.join(".run.lock"),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
