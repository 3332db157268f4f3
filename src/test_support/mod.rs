//! Test utilities and fakes for packup unit tests.
//!
//! The fakes stand in for the external tools (browserslist, tsc, vite) so
//! planning and handler logic can be tested without node installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use packup::test_support::{context, FakeBundler};
//!
//! #[test]
//! fn test_example() {
//!     let ctx = context("/pkg", r#"{"name": "t", "version": "1.0.0", "main": "./dist/index.js"}"#);
//!     let bundler = FakeBundler::default();
//!     // Run a handler with `&bundler`, then inspect `bundler.configs()`...
//! }
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::builder::context::BuildContext;
use crate::builder::targets::{to_compiler_targets, TargetTranslator};
use crate::builder::tasks::dts::DeclarationOutput;
use crate::builder::tasks::{BundleConfig, Bundler, DeclarationCompiler, DeclarationRequest};
use crate::core::manifest::{ExtensionMap, PackageManifest};
use crate::util::config::BuildConfig;
use crate::util::shell::{Reporter, Shell};

/// Parse a manifest that is known to be valid.
pub fn manifest(json: &str) -> PackageManifest {
    PackageManifest::from_str(json).unwrap()
}

/// Build a context for `json` rooted at `cwd` with default settings.
pub fn context(cwd: &str, json: &str) -> BuildContext {
    BuildContext::new(
        Path::new(cwd),
        ExtensionMap::default(),
        manifest(json),
        BuildConfig::default(),
        &FakeTranslator::default(),
    )
    .unwrap()
}

/// A reporter that prints nothing.
pub fn reporter() -> Reporter {
    Arc::new(Shell::quiet()).reporter()
}

/// Translator that only understands explicit `<browser> <version>` queries.
///
/// Every call is recorded.
#[derive(Debug, Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeTranslator {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl TargetTranslator for FakeTranslator {
    fn translate(&self, queries: &[String]) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(queries.to_vec());
        Ok(to_compiler_targets(queries))
    }
}

/// Compiler that records requests and returns a canned output.
#[derive(Debug, Default)]
pub struct FakeCompiler {
    requests: Mutex<Vec<DeclarationRequest>>,
    output: DeclarationOutput,
}

impl FakeCompiler {
    pub fn with_output(output: DeclarationOutput) -> Self {
        FakeCompiler {
            requests: Mutex::new(Vec::new()),
            output,
        }
    }

    pub fn requests(&self) -> Vec<DeclarationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl DeclarationCompiler for FakeCompiler {
    fn emit(&self, request: &DeclarationRequest) -> Result<DeclarationOutput> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.output.clone())
    }
}

/// Bundler that records configurations, optionally failing every call.
#[derive(Debug, Default)]
pub struct FakeBundler {
    configs: Mutex<Vec<BundleConfig>>,
    error: Option<String>,
}

impl FakeBundler {
    pub fn failing(message: &str) -> Self {
        FakeBundler {
            configs: Mutex::new(Vec::new()),
            error: Some(message.to_string()),
        }
    }

    pub fn configs(&self) -> Vec<BundleConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl Bundler for FakeBundler {
    fn bundle(&self, config: &BundleConfig) -> Result<()> {
        self.configs.lock().unwrap().push(config.clone());
        if let Some(message) = &self.error {
            bail!("{}", message);
        }
        Ok(())
    }
}
