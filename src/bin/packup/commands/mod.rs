//! Command implementations

pub mod build;
pub mod check;
pub mod clean;
pub mod completions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use packup::core::Package;
use packup::util::config::{global_config_path, load_config, project_config_path, Config};
use packup::util::fs::resolve;
use packup::util::Shell;

/// State shared by the package commands.
pub struct Session {
    pub shell: Arc<Shell>,

    /// Absolute package directory
    pub dir: PathBuf,
}

impl Session {
    pub fn new(shell: Arc<Shell>, dir: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let dir = match dir {
            Some(dir) => resolve(&cwd, dir),
            None => cwd,
        };

        Ok(Session { shell, dir })
    }

    /// Load the package in the session directory.
    pub fn package(&self) -> Result<Package> {
        Package::at(&self.dir)
    }

    /// Load configuration (global + project).
    pub fn config(&self) -> Config {
        load_config(
            global_config_path().as_deref(),
            &project_config_path(&self.dir),
        )
    }
}
