//! CI build orchestration library for Xcode projects
//!
//! `xcflow-sdk` implements the phases behind the `xcflow` CLI: clean the
//! artifact tree, build a project variant with `xcodebuild`, run its unit
//! tests against the simulator runtime, and package a signed `.ipa`. The
//! external toolchain is consumed as a black box; this crate only sequences
//! it, with an abort-on-first-error policy throughout.
//!
//! # Example: Programmatic Usage
//!
//! ```no_run
//! use std::path::Path;
//! use xcflow_sdk::{ArtifactTree, BuildRequest, BundleIds, Channel, Overlays, Xcodebuild};
//!
//! fn main() -> Result<(), xcflow_sdk::FlowError> {
//!     let tree = ArtifactTree::new("build");
//!     tree.reset()?;
//!
//!     let bundles = BundleIds {
//!         appstore: "com.example.app".into(),
//!         enterprise: "com.example.app.inhouse".into(),
//!     };
//!     let req = BuildRequest::for_channel(
//!         Channel::Distribution,
//!         Path::new("App.xcodeproj"),
//!         "App",
//!         &bundles,
//!         &Overlays::default(),
//!     );
//!     let output = xcflow_sdk::phases::build::run(&Xcodebuild::new(), &tree, &req)?;
//!     println!("installed into {:?}", output.install_dir);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **artifacts**: per-run output tree, reset discipline, run lock
//! - **toolchain**: `xcodebuild`/`xcrun` invocation wrappers
//! - **phases**: build, test, and package contracts
//! - **meta**: run metadata written alongside the artifacts

pub mod artifacts;
pub mod meta;
pub mod phases;
pub mod toolchain;
pub mod types;

// Re-export key types for convenience
pub use artifacts::{ArtifactTree, RunLock};
pub use meta::RunMeta;
pub use phases::{BuildOutput, DaemonGuard, PackageOptions, TestOptions};
pub use toolchain::Xcodebuild;
pub use types::{BuildRequest, BundleIds, Channel, Configuration, FlowError, Overlays, Sdk};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
