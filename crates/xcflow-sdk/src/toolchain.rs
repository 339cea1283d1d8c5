//! Thin wrapper over the Xcode command-line toolchain.
//!
//! Every phase ultimately shells out through this module. Commands are run
//! with captured output; a non-zero exit becomes a [`FlowError::Tool`]
//! carrying the tool's stdout and stderr, which aborts the whole run.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::{BuildRequest, FlowError, Sdk};

/// `xcodebuild` invocation builder for one project.
pub struct Xcodebuild {
    verbose: bool,
}

impl Xcodebuild {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enables echoing of toolchain commands before they run.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Runs `xcodebuild clean install` for one planned build.
    ///
    /// `install_root` is the resolved DSTROOT; the caller defaults it from
    /// the artifact tree when the request carries no override.
    pub fn clean_install(&self, req: &BuildRequest, install_root: &Path) -> Result<(), FlowError> {
        let cmd = self.install_command(req, install_root);
        self.run(cmd, "xcodebuild clean install")
    }

    fn install_command(&self, req: &BuildRequest, install_root: &Path) -> Command {
        let mut cmd = Command::new("xcodebuild");
        cmd.arg("-project")
            .arg(&req.project)
            .arg("-target")
            .arg(&req.target)
            .arg("-configuration")
            .arg(req.configuration.as_str())
            .arg("-sdk")
            .arg(req.sdk.as_str());
        if let Some(xcconfig) = &req.xcconfig {
            cmd.arg("-xcconfig").arg(xcconfig);
        }
        cmd.arg("clean").arg("install");
        cmd.arg(format!("DSTROOT={}", install_root.display()));
        if let Some(bundle_id) = &req.bundle_id {
            cmd.arg(format!("PRODUCT_BUNDLE_IDENTIFIER={bundle_id}"));
        }
        cmd
    }

    /// Resolves the SDK root path, e.g. the simulator runtime used to run
    /// unit-test bundles outside of Xcode.
    pub fn sdk_path(&self, sdk: Sdk) -> Result<PathBuf, FlowError> {
        let mut cmd = Command::new("xcodebuild");
        cmd.args(["-version", "-sdk", sdk.as_str(), "Path"]);
        let stdout = self.capture(cmd, "xcodebuild -version -sdk")?;
        let path = stdout.trim();
        if path.is_empty() {
            return Err(FlowError::Tool(format!(
                "xcodebuild reported no path for SDK {}",
                sdk.as_str()
            )));
        }
        Ok(PathBuf::from(path))
    }

    fn run(&self, cmd: Command, description: &str) -> Result<(), FlowError> {
        if self.verbose {
            println!("  Running: {:?}", cmd);
        }
        run_command(cmd, description)
    }

    fn capture(&self, cmd: Command, description: &str) -> Result<String, FlowError> {
        if self.verbose {
            println!("  Running: {:?}", cmd);
        }
        capture_stdout(cmd, description)
    }
}

impl Default for Xcodebuild {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs an external command with consistent error handling.
///
/// Captures both stdout and stderr on failure and formats them into an
/// actionable error message.
pub fn run_command(mut cmd: Command, description: &str) -> Result<(), FlowError> {
    let output = cmd.output().map_err(|e| {
        FlowError::Tool(format!(
            "Failed to start {}: {}. Ensure the tool is installed and on PATH.",
            description, e
        ))
    })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FlowError::Tool(format!(
            "{} failed.\n\nExit status: {}\n\nStdout:\n{}\n\nStderr:\n{}",
            description, output.status, stdout, stderr
        )));
    }
    Ok(())
}

/// Runs an external command and returns its stdout as a string.
pub fn capture_stdout(mut cmd: Command, description: &str) -> Result<String, FlowError> {
    let output = cmd.output().map_err(|e| {
        FlowError::Tool(format!(
            "Failed to start {}: {}. Ensure the tool is installed and on PATH.",
            description, e
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FlowError::Tool(format!(
            "{} failed: {}",
            description, stderr
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
