//! Core types for xcflow-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`FlowError`] - Error types for orchestration and toolchain operations
//! - [`Channel`] - Release channel selection (local, distribution, enterprise)
//! - [`Configuration`] / [`Sdk`] - Xcode build configuration and SDK axes
//! - [`BuildRequest`] - One planned `xcodebuild clean install` invocation

use std::path::{Path, PathBuf};

/// Error types for xcflow-sdk operations.
///
/// Every external toolchain invocation that returns non-zero surfaces as
/// [`FlowError::Tool`] and aborts the run; there is no recoverable category.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// An external toolchain invocation failed or could not be started.
    ///
    /// The message carries the tool's captured stdout and stderr so CI logs
    /// show what the tool actually printed.
    #[error("toolchain error: {0}")]
    Tool(String),

    /// An I/O error occurred while managing the artifact tree or reports.
    #[error("I/O error: {0}. Check file paths and permissions")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration, such as an unresolved provisioning
    /// profile or a missing app bundle.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization failed while writing run metadata.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another run holds the artifact-tree lock.
    ///
    /// Two simultaneous runs against the same artifact tree would race on the
    /// clean phase, so the second one fails fast instead.
    #[error("another run holds the lock at {0:?}; remove it if no other run is active")]
    Locked(PathBuf),
}

/// Release channel driving build variant selection.
///
/// The channel is an explicit CLI parameter, validated at parse time, and is
/// the only input that selects the configuration/SDK/overlay/bundle-id
/// quadruple for the build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Developer build: debug configuration against the simulator SDK.
    Local,
    /// App Store build: release configuration against the device SDK.
    Distribution,
    /// In-house build: release configuration against the device SDK with the
    /// enterprise bundle identifier.
    Enterprise,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Local => "local",
            Channel::Distribution => "distribution",
            Channel::Enterprise => "enterprise",
        }
    }
}

/// Xcode build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    /// Returns the configuration name as passed to `xcodebuild -configuration`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
        }
    }
}

/// Xcode SDK selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sdk {
    /// iOS simulator SDK (`iphonesimulator`).
    Simulator,
    /// Physical device SDK (`iphoneos`).
    Device,
}

impl Sdk {
    /// Returns the SDK name as passed to `xcodebuild -sdk`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sdk::Simulator => "iphonesimulator",
            Sdk::Device => "iphoneos",
        }
    }
}

/// Bundle identifiers for the two signed channels.
#[derive(Debug, Clone)]
pub struct BundleIds {
    /// App Store bundle identifier (distribution channel).
    pub appstore: String,
    /// Enterprise bundle identifier (in-house channel).
    pub enterprise: String,
}

impl BundleIds {
    /// Returns the bundle identifier a signed channel ships under, or `None`
    /// for local builds which keep the project's own identifier.
    pub fn for_channel(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Local => None,
            Channel::Distribution => Some(&self.appstore),
            Channel::Enterprise => Some(&self.enterprise),
        }
    }
}

/// Optional xcconfig overlay files applied per channel.
#[derive(Debug, Clone, Default)]
pub struct Overlays {
    pub enterprise: Option<PathBuf>,
    pub distribution: Option<PathBuf>,
}

/// Describes one `xcodebuild clean install` invocation.
///
/// Constructed per build-phase run; immutable once planned.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Path to the `.xcodeproj` bundle.
    pub project: PathBuf,
    /// Xcode target to build.
    pub target: String,
    pub configuration: Configuration,
    pub sdk: Sdk,
    /// Compress `*.dSYM` bundles from the install root after the build.
    pub archive_dsyms: bool,
    /// Bundle identifier override, passed as `PRODUCT_BUNDLE_IDENTIFIER`.
    ///
    /// Passed as a build setting rather than edited into the project's
    /// Info.plist, so the source tree is never mutated and concurrent runs
    /// cannot interfere through it.
    pub bundle_id: Option<String>,
    /// Install root override; defaults to `<artifacts>/<Configuration>-<sdk>`.
    pub install_root: Option<PathBuf>,
    /// xcconfig overlay applied via `xcodebuild -xcconfig`.
    pub xcconfig: Option<PathBuf>,
}

impl BuildRequest {
    /// Plans the build for a channel.
    ///
    /// This is the whole variant-selection logic of the build phase:
    ///
    /// | channel      | configuration | sdk             | overlay      | bundle id  |
    /// |--------------|---------------|-----------------|--------------|------------|
    /// | enterprise   | Release       | iphoneos        | enterprise   | enterprise |
    /// | distribution | Release       | iphoneos        | distribution | appstore   |
    /// | local        | Debug         | iphonesimulator | none         | none       |
    pub fn for_channel(
        channel: Channel,
        project: &Path,
        target: &str,
        bundles: &BundleIds,
        overlays: &Overlays,
    ) -> Self {
        let (configuration, sdk) = match channel {
            Channel::Local => (Configuration::Debug, Sdk::Simulator),
            Channel::Distribution | Channel::Enterprise => (Configuration::Release, Sdk::Device),
        };
        let xcconfig = match channel {
            Channel::Local => None,
            Channel::Distribution => overlays.distribution.clone(),
            Channel::Enterprise => overlays.enterprise.clone(),
        };
        Self {
            project: project.to_path_buf(),
            target: target.to_string(),
            configuration,
            sdk,
            archive_dsyms: true,
            bundle_id: bundles.for_channel(channel).map(str::to_string),
            install_root: None,
            xcconfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundles() -> BundleIds {
        BundleIds {
            appstore: "com.example.app".into(),
            enterprise: "com.example.app.inhouse".into(),
        }
    }

    fn overlays() -> Overlays {
        Overlays {
            enterprise: Some(PathBuf::from("config/enterprise.xcconfig")),
            distribution: Some(PathBuf::from("config/distribution.xcconfig")),
        }
    }

    #[test]
    fn enterprise_channel_quadruple() {
        let req = BuildRequest::for_channel(
            Channel::Enterprise,
            Path::new("App.xcodeproj"),
            "App",
            &bundles(),
            &overlays(),
        );
        assert_eq!(req.configuration, Configuration::Release);
        assert_eq!(req.sdk, Sdk::Device);
        assert_eq!(req.bundle_id.as_deref(), Some("com.example.app.inhouse"));
        assert_eq!(
            req.xcconfig.as_deref(),
            Some(Path::new("config/enterprise.xcconfig"))
        );
        assert!(req.archive_dsyms);
    }

    #[test]
    fn distribution_channel_quadruple() {
        let req = BuildRequest::for_channel(
            Channel::Distribution,
            Path::new("App.xcodeproj"),
            "App",
            &bundles(),
            &overlays(),
        );
        assert_eq!(req.configuration, Configuration::Release);
        assert_eq!(req.sdk, Sdk::Device);
        assert_eq!(req.bundle_id.as_deref(), Some("com.example.app"));
        assert_eq!(
            req.xcconfig.as_deref(),
            Some(Path::new("config/distribution.xcconfig"))
        );
    }

    #[test]
    fn local_channel_quadruple() {
        let req = BuildRequest::for_channel(
            Channel::Local,
            Path::new("App.xcodeproj"),
            "App",
            &bundles(),
            &overlays(),
        );
        assert_eq!(req.configuration, Configuration::Debug);
        assert_eq!(req.sdk, Sdk::Simulator);
        assert!(req.bundle_id.is_none());
        assert!(req.xcconfig.is_none());
    }

    #[test]
    fn sdk_and_configuration_names() {
        assert_eq!(Configuration::Debug.as_str(), "Debug");
        assert_eq!(Configuration::Release.as_str(), "Release");
        assert_eq!(Sdk::Simulator.as_str(), "iphonesimulator");
        assert_eq!(Sdk::Device.as_str(), "iphoneos");
    }
}
