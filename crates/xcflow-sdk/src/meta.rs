//! Run metadata for artifact correlation and traceability.
//!
//! A `run-meta.json` written at the artifact root ties a CI output tree back
//! to the commit, channel, and toolchain environment that produced it.

use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::artifacts::ArtifactTree;
use crate::types::{Channel, FlowError};

/// Metadata describing one orchestrator run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunMeta {
    /// Project name from the configuration file.
    pub project: String,
    /// Channel the run was invoked for.
    pub channel: String,
    /// Phases that executed, in order.
    pub phases: Vec<String>,
    /// Git commit hash (if in a git repository).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// Git branch name (if available).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Whether the git working directory was dirty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
    /// Run timestamp in RFC3339 format.
    pub run_time: String,
    /// Run timestamp as Unix epoch seconds.
    pub run_time_unix: i64,
    /// Host OS the run executed on.
    pub host_os: String,
    /// xcflow version.
    pub tool_version: String,
}

impl RunMeta {
    /// Captures metadata for a finished run.
    pub fn capture(project: &str, channel: Channel, phases: &[&str]) -> Self {
        let now = OffsetDateTime::now_utc();
        let run_time = now
            .format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());

        Self {
            project: project.to_string(),
            channel: channel.as_str().to_string(),
            phases: phases.iter().map(|p| p.to_string()).collect(),
            commit_hash: git_commit(),
            branch: git_branch(),
            dirty: git_dirty(),
            run_time,
            run_time_unix: now.unix_timestamp(),
            host_os: std::env::consts::OS.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Writes the metadata as `run-meta.json` at the artifact root.
    pub fn write(&self, tree: &ArtifactTree) -> Result<(), FlowError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(tree.root().join("run-meta.json"), contents)?;
        Ok(())
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn git_commit() -> Option<String> {
    git_output(&["rev-parse", "--short", "HEAD"])
}

fn git_branch() -> Option<String> {
    git_output(&["rev-parse", "--abbrev-ref", "HEAD"]).filter(|b| b != "HEAD")
}

fn git_dirty() -> Option<bool> {
    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()?;
    if output.status.success() {
        Some(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn capture_records_channel_and_phases() {
        let meta = RunMeta::capture("MyApp", Channel::Enterprise, &["build", "package"]);
        assert_eq!(meta.project, "MyApp");
        assert_eq!(meta.channel, "enterprise");
        assert_eq!(meta.phases, vec!["build", "package"]);
        assert!(!meta.tool_version.is_empty());
        assert!(meta.run_time_unix > 0);
        // RFC3339 shape, roughly YYYY-MM-DDTHH:MM:SSZ
        assert!(meta.run_time.contains('T'));
    }

    #[test]
    fn write_produces_json_at_root() {
        let dir = TempDir::new().unwrap();
        let tree = ArtifactTree::new(dir.path().join("build"));
        tree.reset().unwrap();

        let meta = RunMeta::capture("MyApp", Channel::Local, &["build"]);
        meta.write(&tree).unwrap();

        let raw = std::fs::read_to_string(tree.root().join("run-meta.json")).unwrap();
        let parsed: RunMeta = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.channel, "local");
    }
}
