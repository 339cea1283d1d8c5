//! The three orchestrated phases: build, test, package.
//!
//! The clean phase lives on [`crate::artifacts::ArtifactTree`] since it is
//! pure artifact-tree management with no toolchain involvement.

pub mod build;
pub mod package;

pub use build::BuildOutput;
pub use package::PackageOptions;
pub use test::{DaemonGuard, TestOptions};
