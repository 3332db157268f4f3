//! Implementation of `packup build`.

use std::sync::Arc;

use anyhow::Result;

use crate::builder::plan::{plan, Task};
use crate::builder::tasks::{Bundler, DeclarationCompiler, Handlers, TscCompiler, ViteBundler};
use crate::builder::{BrowserslistTranslator, BuildContext, BuildExecutor, TargetTranslator};
use crate::core::manifest::ExtensionMap;
use crate::core::Package;
use crate::util::config::{BuildConfig, Config};
use crate::util::shell::Shell;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Minify bundles (None = use config)
    pub minify: Option<bool>,

    /// Emit source maps (None = use config)
    pub sourcemap: Option<bool>,

    /// Print the task list as JSON instead of building
    pub emit_plan: bool,

    /// Number of parallel declaration jobs
    pub jobs: Option<usize>,
}

impl BuildOptions {
    /// Apply command-line overrides on top of the configured build settings.
    pub fn apply(&self, config: &BuildConfig) -> BuildConfig {
        let mut config = config.clone();
        if self.minify.is_some() {
            config.minify = self.minify;
        }
        if self.sourcemap.is_some() {
            config.sourcemap = self.sourcemap;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        config
    }
}

/// Build result.
#[derive(Debug)]
pub struct BuildResult {
    /// Planned (and, unless only planning, executed) tasks
    pub tasks: Vec<Task>,

    /// Whether the tasks were executed
    pub executed: bool,
}

/// Create the build context for `pkg`.
pub fn load_context(
    pkg: &Package,
    config: BuildConfig,
    translator: &dyn TargetTranslator,
) -> Result<BuildContext> {
    BuildContext::new(
        pkg.root(),
        ExtensionMap::default(),
        pkg.manifest().clone(),
        config,
        translator,
    )
}

/// Build the package with the default external tools.
pub fn build(
    pkg: &Package,
    config: &Config,
    opts: &BuildOptions,
    shell: Arc<Shell>,
) -> Result<BuildResult> {
    let translator = BrowserslistTranslator::new(pkg.root(), config.tools.browserslist.clone());
    let compiler = TscCompiler::new(config.tools.tsc.clone());
    let bundler = ViteBundler::new(config.tools.bundler.clone());

    build_with(
        pkg,
        &opts.apply(&config.build),
        opts.emit_plan,
        &translator,
        &compiler,
        &bundler,
        shell,
    )
}

/// Build the package with explicit collaborators.
pub fn build_with(
    pkg: &Package,
    config: &BuildConfig,
    emit_plan: bool,
    translator: &dyn TargetTranslator,
    compiler: &dyn DeclarationCompiler,
    bundler: &dyn Bundler,
    shell: Arc<Shell>,
) -> Result<BuildResult> {
    let ctx = load_context(pkg, config.clone(), translator)?;
    let tasks = plan(&ctx);

    tracing::debug!("planned {} task(s) for {}", tasks.len(), pkg.name());

    if emit_plan {
        let plan_json = serde_json::to_string_pretty(&tasks)?;
        println!("{}", plan_json);

        return Ok(BuildResult {
            tasks,
            executed: false,
        });
    }

    BuildExecutor::new(&ctx, shell, Handlers::new(compiler, bundler)).execute(&tasks)?;

    Ok(BuildResult {
        tasks,
        executed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeBundler, FakeCompiler, FakeTranslator};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_package(dir: &std::path::Path) -> Package {
        fs::write(
            dir.join("package.json"),
            r#"{
                "name": "my-lib",
                "version": "0.1.0",
                "source": "./src/index.ts",
                "types": "./dist/index.d.ts",
                "main": "./dist/index.js",
                "module": "./dist/index.mjs",
                "exports": {
                    ".": {
                        "types": "./dist/index.d.ts",
                        "source": "./src/index.ts",
                        "import": "./dist/index.mjs",
                        "require": "./dist/index.js",
                        "default": "./dist/index.js"
                    },
                    "./package.json": "./package.json"
                }
            }"#,
        )
        .unwrap();
        Package::at(dir).unwrap()
    }

    #[test]
    fn test_build() {
        let tmp = TempDir::new().unwrap();
        let pkg = create_test_package(tmp.path());
        let bundler = FakeBundler::default();

        let result = build_with(
            &pkg,
            &BuildConfig::default(),
            false,
            &FakeTranslator::default(),
            &FakeCompiler::default(),
            &bundler,
            Arc::new(Shell::quiet()),
        )
        .unwrap();

        assert!(result.executed);
        assert_eq!(result.tasks.len(), 3);
        assert_eq!(bundler.configs().len(), 2);
    }

    #[test]
    fn test_emit_plan_does_not_build() {
        let tmp = TempDir::new().unwrap();
        let pkg = create_test_package(tmp.path());
        let bundler = FakeBundler::default();

        let result = build_with(
            &pkg,
            &BuildConfig::default(),
            true,
            &FakeTranslator::default(),
            &FakeCompiler::default(),
            &bundler,
            Arc::new(Shell::quiet()),
        )
        .unwrap();

        assert!(!result.executed);
        assert!(bundler.configs().is_empty());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = BuildConfig {
            minify: Some(false),
            sourcemap: Some(true),
            jobs: Some(2),
            ..Default::default()
        };
        let opts = BuildOptions {
            minify: Some(true),
            sourcemap: None,
            ..Default::default()
        };

        let merged = opts.apply(&config);
        assert!(merged.minify());
        assert!(merged.sourcemap());
        assert_eq!(merged.jobs, Some(2));
    }
}
