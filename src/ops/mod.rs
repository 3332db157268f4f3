//! High-level operations.
//!
//! This module contains the implementation of packup commands.

pub mod packup_build;
pub mod packup_check;
pub mod packup_clean;

pub use packup_build::{build, build_with, load_context, BuildOptions, BuildResult};
pub use packup_check::{check, CheckReport};
pub use packup_clean::clean;
