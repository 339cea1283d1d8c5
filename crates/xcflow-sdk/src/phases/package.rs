//! Package phase: produce a signed `.ipa` from the built release app.

use std::path::PathBuf;
use std::process::Command;

use crate::artifacts::ArtifactTree;
use crate::toolchain;
use crate::types::{Channel, FlowError};

/// Inputs for one package-phase run.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub channel: Channel,
    /// Name of the resulting archive, `<project>.ipa`.
    pub project_name: String,
    /// Pre-built release application bundle.
    pub app_path: PathBuf,
    /// Resolved provisioning profile to embed; required for signed channels.
    pub profile: Option<PathBuf>,
    /// Code-signing identity.
    pub identity: String,
}

/// Packages the release app into `<artifacts>/<project>.ipa`.
///
/// Local builds have nothing to ship, so the phase is a no-op for
/// [`Channel::Local`] and returns `None` without touching the tree.
pub fn run(tree: &ArtifactTree, opts: &PackageOptions) -> Result<Option<PathBuf>, FlowError> {
    if opts.channel == Channel::Local {
        println!("Skipping package phase: local channel produces no .ipa");
        return Ok(None);
    }

    if !opts.app_path.exists() {
        return Err(FlowError::Config(format!(
            "release app bundle not found at {:?}; run the build phase for the {} channel first",
            opts.app_path,
            opts.channel.as_str()
        )));
    }
    let profile = opts.profile.as_ref().ok_or_else(|| {
        FlowError::Config(format!(
            "no provisioning profile resolved for channel {}",
            opts.channel.as_str()
        ))
    })?;
    if !profile.exists() {
        return Err(FlowError::Config(format!(
            "provisioning profile not found at {:?}",
            profile
        )));
    }

    let ipa_path = tree.ipa_path(&opts.project_name);
    println!("Packaging {:?}...", ipa_path);

    let mut cmd = Command::new("xcrun");
    cmd.args(["-sdk", "iphoneos", "PackageApplication", "-v"])
        .arg(&opts.app_path)
        .arg("-o")
        .arg(&ipa_path)
        .arg("--embed")
        .arg(profile)
        .arg("--sign")
        .arg(&opts.identity);
    toolchain::run_command(cmd, "xcrun PackageApplication")?;

    println!("✓ IPA created: {:?}", ipa_path);
    Ok(Some(ipa_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(channel: Channel, dir: &TempDir) -> PackageOptions {
        PackageOptions {
            channel,
            project_name: "MyApp".into(),
            app_path: dir.path().join("Release-iphoneos/Applications/MyApp.app"),
            profile: Some(dir.path().join("com.example.app.mobileprovision")),
            identity: "iPhone Distribution".into(),
        }
    }

    #[test]
    fn local_channel_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let tree = ArtifactTree::new(dir.path().join("build"));
        tree.reset().unwrap();

        let result = run(&tree, &options(Channel::Local, &dir)).unwrap();
        assert!(result.is_none());
        assert!(!tree.ipa_path("MyApp").exists());
    }

    #[test]
    fn missing_app_bundle_aborts() {
        let dir = TempDir::new().unwrap();
        let tree = ArtifactTree::new(dir.path().join("build"));
        tree.reset().unwrap();

        let err = run(&tree, &options(Channel::Enterprise, &dir)).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
        assert!(err.to_string().contains("release app bundle not found"));
    }

    #[test]
    fn missing_profile_aborts() {
        let dir = TempDir::new().unwrap();
        let tree = ArtifactTree::new(dir.path().join("build"));
        tree.reset().unwrap();

        let opts = options(Channel::Distribution, &dir);
        fs::create_dir_all(&opts.app_path).unwrap();

        let err = run(&tree, &opts).unwrap_err();
        assert!(err.to_string().contains("provisioning profile not found"));
    }
}
