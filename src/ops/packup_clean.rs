//! Implementation of `packup clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::context::{dist_path, ExportMap};
use crate::core::manifest::{parse_exports, ExtensionMap};
use crate::core::Package;
use crate::ops::packup_check::package_root;
use crate::util::config::BuildConfig;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the package's dist directory, returning its path.
pub fn clean(pkg: &Package, config: &BuildConfig) -> Result<PathBuf> {
    let root = package_root(pkg)?;
    let exports: ExportMap = parse_exports(pkg.manifest(), &ExtensionMap::default())?
        .into_iter()
        .collect();

    let dist = dist_path(&root, &exports, config.dist.as_deref())?;
    remove_dir_all_if_exists(&dist)?;

    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_inferred_dist() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "my-lib", "version": "1.0.0",
                "main": "./dist/cjs/index.js", "module": "./dist/esm/index.mjs"}"#,
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("dist/cjs")).unwrap();
        fs::write(tmp.path().join("dist/cjs/index.js"), "").unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();

        let dist = clean(&Package::at(tmp.path()).unwrap(), &BuildConfig::default()).unwrap();

        assert!(dist.ends_with("dist"));
        assert!(!tmp.path().join("dist").exists());
        assert!(tmp.path().join("src").exists());
    }

    #[test]
    fn test_clean_refuses_package_root() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "my-lib", "version": "1.0.0", "main": "./index.js"}"#,
        )
        .unwrap();

        let err = clean(&Package::at(tmp.path()).unwrap(), &BuildConfig::default()).unwrap_err();

        assert!(err.to_string().contains("not the root package directory"));
        assert!(tmp.path().join("package.json").exists());
    }
}
