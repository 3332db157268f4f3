//! Configuration file support for packup.
//!
//! packup supports two configuration file locations:
//! - Global: `~/.config/packup/config.toml` - User-wide defaults
//! - Project: `packup.toml` next to `package.json` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::target::Runtime;

/// Project config file name.
pub const PROJECT_CONFIG_NAME: &str = "packup.toml";

/// Default name of the declaration compiler's build config.
pub const DEFAULT_TSCONFIG_NAME: &str = "tsconfig.build.json";

/// packup configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// External tool overrides
    pub tools: ToolsConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Minify bundles (default: false)
    pub minify: Option<bool>,

    /// Emit source maps (default: true)
    pub sourcemap: Option<bool>,

    /// Keep the module structure instead of a single file per entry (default: false)
    pub preserve_modules: Option<bool>,

    /// Runtime for exports that are not classified by name
    pub runtime: Option<Runtime>,

    /// Extra module names the bundler must leave external
    pub externals: Vec<String>,

    /// Name of the declaration build config to look for
    pub tsconfig: Option<String>,

    /// Explicit dist directory, relative to the package root
    pub dist: Option<PathBuf>,

    /// Parallel declaration jobs (None = auto-detect)
    pub jobs: Option<usize>,
}

impl BuildConfig {
    pub fn minify(&self) -> bool {
        self.minify.unwrap_or(false)
    }

    pub fn sourcemap(&self) -> bool {
        self.sourcemap.unwrap_or(true)
    }

    pub fn preserve_modules(&self) -> bool {
        self.preserve_modules.unwrap_or(false)
    }

    pub fn tsconfig_name(&self) -> &str {
        self.tsconfig.as_deref().unwrap_or(DEFAULT_TSCONFIG_NAME)
    }
}

/// Program overrides for the external collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Type-checker used for declaration emission (default: tsc)
    pub tsc: Option<PathBuf>,

    /// Bundler used for JS output (default: vite)
    pub bundler: Option<PathBuf>,

    /// Browserslist query expander (default: browserslist)
    pub browserslist: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let build = other.build;
        if build.minify.is_some() {
            self.build.minify = build.minify;
        }
        if build.sourcemap.is_some() {
            self.build.sourcemap = build.sourcemap;
        }
        if build.preserve_modules.is_some() {
            self.build.preserve_modules = build.preserve_modules;
        }
        if build.runtime.is_some() {
            self.build.runtime = build.runtime;
        }
        if !build.externals.is_empty() {
            self.build.externals = build.externals;
        }
        if build.tsconfig.is_some() {
            self.build.tsconfig = build.tsconfig;
        }
        if build.dist.is_some() {
            self.build.dist = build.dist;
        }
        if build.jobs.is_some() {
            self.build.jobs = build.jobs;
        }

        let tools = other.tools;
        if tools.tsc.is_some() {
            self.tools.tsc = tools.tsc;
        }
        if tools.bundler.is_some() {
            self.tools.bundler = tools.bundler;
        }
        if tools.browserslist.is_some() {
            self.tools.browserslist = tools.browserslist;
        }
    }
}

/// Get the global packup config directory (~/.config/packup).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "packup").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the global config path.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_NAME)
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (packup.toml)
/// 2. Global config (~/.config/packup/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.build.minify());
        assert!(config.build.sourcemap());
        assert!(!config.build.preserve_modules());
        assert_eq!(config.build.tsconfig_name(), "tsconfig.build.json");
        assert!(config.tools.tsc.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("packup.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
minify = true
sourcemap = false
runtime = "node"
externals = ["fs-extra"]
tsconfig = "tsconfig.types.json"

[tools]
bundler = "./node_modules/.bin/vite"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert!(config.build.minify());
        assert!(!config.build.sourcemap());
        assert_eq!(config.build.runtime, Some(Runtime::Node));
        assert_eq!(config.build.externals, vec!["fs-extra".to_string()]);
        assert_eq!(config.build.tsconfig_name(), "tsconfig.types.json");
        assert_eq!(
            config.tools.bundler,
            Some(PathBuf::from("./node_modules/.bin/vite"))
        );
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.build.minify = Some(true);
        base.build.jobs = Some(4);

        let mut override_cfg = Config::default();
        override_cfg.build.minify = Some(false);

        base.merge(override_cfg);

        assert_eq!(base.build.minify, Some(false));
        assert_eq!(base.build.jobs, Some(4));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("packup.toml");

        std::fs::write(&global, "[build]\nminify = true\nsourcemap = false\n").unwrap();
        std::fs::write(&project, "[build]\nsourcemap = true\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert!(config.build.minify());
        assert!(config.build.sourcemap());
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("packup.toml");
        std::fs::write(&project, "[build\nminify = ").unwrap();

        let config = load_config(None, &project);
        assert_eq!(config.build, BuildConfig::default());
    }
}
