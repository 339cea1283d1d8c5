//! Build phase: `xcodebuild clean install` plus debug-symbol archival.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::artifacts::ArtifactTree;
use crate::toolchain::{self, Xcodebuild};
use crate::types::{BuildRequest, FlowError};

/// Outputs of one build-phase run.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Install root the toolchain wrote the built products into.
    pub install_dir: PathBuf,
    /// Debug-symbol archive, when archival ran and found dSYM bundles.
    pub dsym_archive: Option<PathBuf>,
}

/// Runs one planned build against the artifact tree.
///
/// The install root defaults to `<artifacts>/<Configuration>-<sdk>` unless
/// the request overrides it. Unless archival is disabled, every `*.dSYM`
/// bundle found in the install root is compressed into a single
/// `<Configuration>-<sdk>-dSYMs.zip` at the top of the artifact tree.
pub fn run(
    toolchain: &Xcodebuild,
    tree: &ArtifactTree,
    req: &BuildRequest,
) -> Result<BuildOutput, FlowError> {
    let install_dir = req
        .install_root
        .clone()
        .unwrap_or_else(|| tree.install_dir(req.configuration, req.sdk));

    println!(
        "Building {} ({} / {})...",
        req.target,
        req.configuration.as_str(),
        req.sdk.as_str()
    );
    toolchain.clean_install(req, &install_dir)?;

    let dsym_archive = if req.archive_dsyms {
        archive_dsyms(&install_dir, &tree.dsym_archive(req.configuration, req.sdk))?
    } else {
        None
    };

    Ok(BuildOutput {
        install_dir,
        dsym_archive,
    })
}

/// Compresses all dSYM bundles under `install_dir` into `dest`.
///
/// Returns `None` when the install root holds no dSYM bundles, which is
/// normal for targets built with symbol generation disabled.
fn archive_dsyms(install_dir: &Path, dest: &Path) -> Result<Option<PathBuf>, FlowError> {
    let bundles = find_dsym_bundles(install_dir)?;
    if bundles.is_empty() {
        return Ok(None);
    }

    if dest.exists() {
        fs::remove_file(dest)?;
    }

    // Relative names with zip running inside the install root keep archive
    // entries free of absolute host paths.
    let mut cmd = Command::new("zip");
    cmd.arg("-qr").arg(dest).args(&bundles).current_dir(install_dir);
    toolchain::run_command(cmd, "zip dSYM archive")?;

    Ok(Some(dest.to_path_buf()))
}

fn find_dsym_bundles(install_dir: &Path) -> Result<Vec<PathBuf>, FlowError> {
    let mut bundles = Vec::new();
    let mut stack = vec![install_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some("dSYM") {
                // Names relative to the install root, for zip's working dir.
                if let Ok(rel) = path.strip_prefix(install_dir) {
                    bundles.push(rel.to_path_buf());
                }
            } else {
                stack.push(path);
            }
        }
    }
    bundles.sort();
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_nested_dsym_bundles() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Applications/App.app.dSYM")).unwrap();
        fs::create_dir_all(dir.path().join("Applications/App.app")).unwrap();
        fs::create_dir_all(dir.path().join("Frameworks/Core.framework.dSYM")).unwrap();

        let bundles = find_dsym_bundles(dir.path()).unwrap();
        assert_eq!(
            bundles,
            vec![
                PathBuf::from("Applications/App.app.dSYM"),
                PathBuf::from("Frameworks/Core.framework.dSYM"),
            ]
        );
    }

    #[test]
    fn empty_install_root_skips_archive() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("Debug-iphonesimulator-dSYMs.zip");
        let result = archive_dsyms(dir.path(), &dest).unwrap();
        assert!(result.is_none());
        assert!(!dest.exists());
    }
}
