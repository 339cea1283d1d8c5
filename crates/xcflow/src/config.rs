//! Configuration file support for xcflow.
//!
//! Per-project settings live in `xcflow.toml`, discovered upward from the
//! working directory. The file is a required precondition: the orchestrator
//! refuses to run without the project name and both bundle identifiers.
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! name = "MyApp"
//! # path = "MyApp.xcodeproj"
//! # target = "MyApp"
//! # test_target = "MyAppTests"
//!
//! [bundle]
//! appstore = "com.example.myapp"
//! enterprise = "com.example.myapp.inhouse"
//!
//! [signing]
//! identity = "iPhone Distribution"
//! # profiles_dir = "/Users/ci/Library/MobileDevice/Provisioning Profiles"
//!
//! [overlays]
//! # enterprise = "config/enterprise.xcconfig"
//! # distribution = "config/distribution.xcconfig"
//!
//! [test]
//! # daemon_helper = "scripts/launch-test-daemon.sh"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use xcflow_sdk::{BundleIds, Channel, Overlays};

/// The configuration file name searched for in the working directory and its
/// parents.
pub const CONFIG_FILE_NAME: &str = "xcflow.toml";

/// Root configuration structure for `xcflow.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub project: ProjectSection,
    pub bundle: BundleSection,
    #[serde(default)]
    pub signing: SigningSection,
    #[serde(default)]
    pub overlays: OverlaySection,
    #[serde(default)]
    pub test: TestSection,
}

/// Project identity and Xcode target names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Project name; also names the `.ipa` archive.
    pub name: String,
    /// Path to the `.xcodeproj` bundle, relative to the config file.
    /// Defaults to `<name>.xcodeproj`.
    pub path: Option<PathBuf>,
    /// Xcode target to build. Defaults to the project name.
    pub target: Option<String>,
    /// Xcode target producing the unit-test bundle.
    /// Defaults to `<name>Tests`.
    pub test_target: Option<String>,
}

/// Bundle identifiers for the two signed channels. Both are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSection {
    pub appstore: String,
    pub enterprise: String,
}

/// Code-signing inputs for the package phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningSection {
    /// Signing identity passed to the packaging utility.
    /// Defaults to "iPhone Distribution".
    pub identity: Option<String>,
    /// Directory holding `<bundle id>.mobileprovision` files.
    /// Defaults to `~/Library/MobileDevice/Provisioning Profiles`.
    pub profiles_dir: Option<PathBuf>,
}

/// Per-channel xcconfig overlay files, relative to the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySection {
    pub enterprise: Option<PathBuf>,
    pub distribution: Option<PathBuf>,
}

/// Test-phase collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSection {
    /// Helper script spawned for the duration of the test run.
    pub daemon_helper: Option<PathBuf>,
}

impl FlowConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        let config: FlowConfig =
            toml::from_str(&contents).with_context(|| format!("parsing config file {:?}", path))?;
        Ok(config)
    }

    /// Finds and loads `xcflow.toml` starting from `start_dir`, walking up
    /// the directory tree until a config file is found, a `.git` directory
    /// marks the repository root, or the filesystem root is reached.
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Path to the `.xcodeproj` bundle, resolved against the config root.
    pub fn project_path(&self, config_root: &Path) -> PathBuf {
        let rel = self
            .project
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.xcodeproj", self.project.name)));
        config_root.join(rel)
    }

    pub fn target(&self) -> &str {
        self.project.target.as_deref().unwrap_or(&self.project.name)
    }

    pub fn test_target(&self) -> String {
        self.project
            .test_target
            .clone()
            .unwrap_or_else(|| format!("{}Tests", self.project.name))
    }

    pub fn bundle_ids(&self) -> BundleIds {
        BundleIds {
            appstore: self.bundle.appstore.clone(),
            enterprise: self.bundle.enterprise.clone(),
        }
    }

    /// Overlay paths resolved against the config root.
    pub fn overlays(&self, config_root: &Path) -> Overlays {
        Overlays {
            enterprise: self.overlays.enterprise.as_ref().map(|p| config_root.join(p)),
            distribution: self
                .overlays
                .distribution
                .as_ref()
                .map(|p| config_root.join(p)),
        }
    }

    pub fn signing_identity(&self) -> &str {
        self.signing
            .identity
            .as_deref()
            .unwrap_or("iPhone Distribution")
    }

    /// Provisioning profile for a signed channel, resolved by path convention
    /// from the profiles directory and the channel's bundle identifier.
    ///
    /// The local channel ships nothing, so it resolves no profile.
    pub fn profile_path(&self, channel: Channel) -> Result<Option<PathBuf>> {
        let Some(bundle_id) = self.bundle_ids().for_channel(channel).map(str::to_string) else {
            return Ok(None);
        };
        let dir = match &self.signing.profiles_dir {
            Some(dir) => dir.clone(),
            None => {
                let home = std::env::var("HOME").context("resolving HOME for profiles dir")?;
                PathBuf::from(home).join("Library/MobileDevice/Provisioning Profiles")
            }
        };
        Ok(Some(dir.join(format!("{bundle_id}.mobileprovision"))))
    }

    /// Daemon helper path resolved against the config root.
    pub fn daemon_helper(&self, config_root: &Path) -> Option<PathBuf> {
        self.test
            .daemon_helper
            .as_ref()
            .map(|p| config_root.join(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[project]
name = "MyApp"

[bundle]
appstore = "com.example.myapp"
enterprise = "com.example.myapp.inhouse"
"#;

    #[test]
    fn minimal_config_defaults() {
        let config: FlowConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.project.name, "MyApp");
        assert_eq!(config.target(), "MyApp");
        assert_eq!(config.test_target(), "MyAppTests");
        assert_eq!(config.signing_identity(), "iPhone Distribution");
        assert_eq!(
            config.project_path(Path::new("/repo")),
            Path::new("/repo/MyApp.xcodeproj")
        );
        assert!(config.overlays(Path::new("/repo")).enterprise.is_none());
    }

    #[test]
    fn missing_bundle_section_is_malformed() {
        let result: Result<FlowConfig, _> = toml::from_str("[project]\nname = \"MyApp\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn full_config_round_trip() {
        let toml_content = r#"
[project]
name = "MyApp"
path = "ios/MyApp.xcodeproj"
target = "MyApp-CI"
test_target = "UnitTests"

[bundle]
appstore = "com.example.myapp"
enterprise = "com.example.myapp.inhouse"

[signing]
identity = "iPhone Distribution: Example Corp"
profiles_dir = "/opt/profiles"

[overlays]
enterprise = "config/enterprise.xcconfig"
distribution = "config/distribution.xcconfig"

[test]
daemon_helper = "scripts/launch-test-daemon.sh"
"#;
        let config: FlowConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.target(), "MyApp-CI");
        assert_eq!(config.test_target(), "UnitTests");
        assert_eq!(
            config.project_path(Path::new("/repo")),
            Path::new("/repo/ios/MyApp.xcodeproj")
        );
        assert_eq!(
            config.overlays(Path::new("/repo")).distribution.as_deref(),
            Some(Path::new("/repo/config/distribution.xcconfig"))
        );
        assert_eq!(
            config.profile_path(Channel::Enterprise).unwrap().unwrap(),
            Path::new("/opt/profiles/com.example.myapp.inhouse.mobileprovision")
        );
        assert_eq!(
            config.profile_path(Channel::Distribution).unwrap().unwrap(),
            Path::new("/opt/profiles/com.example.myapp.mobileprovision")
        );
        assert!(config.profile_path(Channel::Local).unwrap().is_none());
        assert_eq!(
            config.daemon_helper(Path::new("/repo")).as_deref(),
            Some(Path::new("/repo/scripts/launch-test-daemon.sh"))
        );
    }

    #[test]
    fn discover_finds_config_in_parent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), MINIMAL).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = FlowConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.project.name, "MyApp");
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn discover_stops_at_repo_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let result = FlowConfig::discover_from(dir.path()).unwrap();
        assert!(result.is_none());
    }
}
