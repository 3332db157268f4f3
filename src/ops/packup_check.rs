//! Implementation of `packup check`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::manifest::{parse_exports, ExtensionMap};
use crate::core::Package;
use crate::util::fs::resolve;

/// Result of checking a package's declared outputs.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Every declared output, in manifest order
    pub outputs: Vec<String>,

    /// Declared outputs that do not exist on disk
    pub missing: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check that every output declared by the export map exists.
pub fn check(pkg: &Package) -> Result<CheckReport> {
    let root = package_root(pkg)?;
    let exports = parse_exports(pkg.manifest(), &ExtensionMap::default())?;

    let mut report = CheckReport::default();

    for (_, export) in &exports {
        for output in export.output_paths() {
            if report.outputs.iter().any(|o| o == output) {
                continue;
            }
            report.outputs.push(output.to_string());

            let path = resolve(&root, output);
            if !path.exists() {
                tracing::debug!("missing output: {}", path.display());
                report.missing.push(output.to_string());
            }
        }
    }

    Ok(report)
}

/// Absolute, normalized package root.
pub(crate) fn package_root(pkg: &Package) -> Result<PathBuf> {
    Ok(resolve(&std::env::current_dir()?, pkg.root()))
}
