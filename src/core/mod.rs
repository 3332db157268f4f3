//! Core data structures for packup.
//!
//! This module contains the foundational types used throughout packup:
//! - Package manifests and the export map
//! - Runtimes, module formats and compiler targets

pub mod manifest;
pub mod package;
pub mod target;

pub use manifest::{Export, ManifestError, PackageManifest, MANIFEST_NAME};
pub use package::Package;
pub use target::{Format, Runtime, Targets};
