//! Package - a manifest together with its location.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use semver::Version;

use crate::core::manifest::{PackageManifest, MANIFEST_NAME};

/// A package on disk with its validated manifest.
#[derive(Debug, Clone)]
pub struct Package {
    /// The parsed manifest
    manifest: PackageManifest,

    /// Root directory of the package
    root: PathBuf,
}

impl Package {
    /// Create a new package from a manifest and root directory.
    pub fn new(manifest: PackageManifest, root: PathBuf) -> Self {
        Package { manifest, root }
    }

    /// Load a package from a manifest file.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = PackageManifest::load(manifest_path)?;
        let root = manifest_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Self::new(manifest, root))
    }

    /// Load the package rooted at `dir`.
    pub fn at(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_NAME);
        if !manifest_path.is_file() {
            bail!(
                "could not find `{}` in `{}`\n\
                 help: run packup from the package root or pass `--dir`",
                MANIFEST_NAME,
                dir.display()
            );
        }
        Self::load(&manifest_path)
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Get the package version.
    pub fn version(&self) -> &Version {
        &self.manifest.version
    }

    /// Get the manifest.
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    /// Get the package root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }
}
