//! packup - a build orchestrator for JavaScript and TypeScript packages
//!
//! This crate reads a package's `package.json`, infers its output layout,
//! plans type declaration and bundle tasks, and drives the external
//! compiler and bundler that produce them.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and fakes for packup unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides fake implementations of the external
/// collaborators (target translation, declaration compiler, bundler).
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildContext, Task};
pub use core::{Package, PackageManifest};
pub use util::config::Config;
