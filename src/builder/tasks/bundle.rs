//! JavaScript bundle emission.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::context::BuildContext;
use crate::builder::plan::JsBundleTask;
use crate::builder::tasks::{TaskError, TaskHandler};
use crate::core::target::{Format, Runtime};
use crate::util::fs::{relative_path, resolve, to_slash, write_string};
use crate::util::process::{resolve_tool, ProcessBuilder};
use crate::util::shell::{Paint, Reporter};

/// Directory chunks are written to, relative to the dist directory.
pub const CHUNKS_DIR: &str = "_chunks";

/// Fully resolved bundler configuration for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    /// Package root
    pub root: String,
    /// Dist directory
    pub out_dir: String,
    pub empty_out_dir: bool,
    pub format: Format,
    pub runtime: Runtime,
    /// Compiler targets for the task's runtime
    pub target: Vec<String>,
    /// Source entry files
    pub entries: Vec<String>,
    /// Output file name relative to `out_dir`
    pub file_name: String,
    /// Chunk name pattern relative to `out_dir`
    pub chunk_file_names: String,
    /// Modules left as runtime imports
    pub external: Vec<String>,
    pub minify: bool,
    pub sourcemap: bool,
    pub preserve_modules: bool,
}

impl BundleConfig {
    /// Resolve the bundler configuration for `task`.
    pub fn new(ctx: &BuildContext, task: &JsBundleTask) -> Self {
        let ext = ctx.extensions().for_format(task.format);

        BundleConfig {
            root: to_slash(&ctx.cwd),
            out_dir: to_slash(&ctx.dist_path),
            empty_out_dir: false,
            format: task.format,
            runtime: task.runtime,
            target: ctx.targets.for_runtime(task.runtime).to_vec(),
            entries: task
                .entries
                .iter()
                .filter_map(|e| e.entry.clone())
                .collect(),
            file_name: output_file_name(ctx, &task.output, ext),
            chunk_file_names: format!("{}/[name]-[hash]{}", CHUNKS_DIR, ext),
            external: ctx.external.iter().cloned().collect(),
            minify: ctx.config.minify(),
            sourcemap: ctx.config.sourcemap(),
            preserve_modules: ctx.config.preserve_modules(),
        }
    }
}

/// Output path relative to the dist directory, with its extension replaced.
fn output_file_name(ctx: &BuildContext, output: &str, ext: &str) -> String {
    let output = resolve(&ctx.cwd, output);
    let relative = relative_path(&ctx.dist_path, &output);
    format!("{}{}", to_slash(&relative.with_extension("")), ext)
}

/// Bundles JS for one resolved configuration.
pub trait Bundler: Send + Sync {
    fn bundle(&self, config: &BundleConfig) -> Result<()>;
}

/// Handler for [`JsBundleTask`].
pub struct BundleHandler<'a> {
    bundler: &'a dyn Bundler,
}

impl<'a> BundleHandler<'a> {
    pub fn new(bundler: &'a dyn Bundler) -> Self {
        BundleHandler { bundler }
    }
}

impl TaskHandler<JsBundleTask> for BundleHandler<'_> {
    fn print(&self, ctx: &BuildContext, task: &JsBundleTask, reporter: &Reporter) {
        let shell = reporter.shell();
        let targets = ctx.targets.for_runtime(task.runtime).join(", ");

        let mut lines = vec![
            "Building javascript files:".to_string(),
            format!("    format: {}", shell.paint(Paint::Green, task.format)),
            format!("    target: {}", shell.paint(Paint::Gray, targets)),
            format!("    output: {}", shell.paint(Paint::Cyan, &task.output)),
        ];
        for entry in &task.entries {
            let source = entry.entry.as_deref().unwrap_or("(none)");
            lines.push(format!(
                "    entry: {} {}",
                entry.path,
                shell.paint(Paint::Gray, format!("({})", source))
            ));
        }
        lines.push(String::new());

        shell.print_block(&lines);
    }

    fn execute(
        &self,
        ctx: &BuildContext,
        task: &JsBundleTask,
        reporter: &Reporter,
    ) -> Result<(), TaskError> {
        reporter.start(format!("Building javascript files ({})", task.format));

        let config = BundleConfig::new(ctx, task);
        tracing::debug!(
            "bundling {} ({}) into {}",
            task.output,
            task.format,
            config.file_name
        );

        self.bundler
            .bundle(&config)
            .map_err(|err| TaskError::Bundle {
                output: task.output.clone(),
                message: format!("{:#}", err),
            })
    }

    fn success(&self, _ctx: &BuildContext, task: &JsBundleTask, reporter: &Reporter) {
        reporter.succeed(format!("javascript files ({})", task.format));
    }

    fn fail(&self, _ctx: &BuildContext, task: &JsBundleTask, reporter: &Reporter, _err: &TaskError) {
        reporter.fail(format!("failed to build javascript files ({})", task.format));
    }
}

/// Environment variable the Vite config loader reads its settings from.
const CONFIG_ENV: &str = "PACKUP_BUNDLE_CONFIG";

const VITE_CONFIG_LOADER: &str = r#"import { readFileSync } from 'node:fs';

const config = JSON.parse(readFileSync(process.env.PACKUP_BUNDLE_CONFIG, 'utf8'));

const isExternal = (id) =>
  config.external.some((name) => id === name || id.startsWith(`${name}/`));

export default {
  root: config.root,
  logLevel: 'warn',
  clearScreen: false,
  build: {
    outDir: config.outDir,
    emptyOutDir: config.emptyOutDir,
    minify: config.minify,
    sourcemap: config.sourcemap,
    target: config.target,
    lib: {
      entry: config.entries,
      formats: [config.format],
      fileName: () => config.fileName,
    },
    rollupOptions: {
      external: isExternal,
      output: {
        chunkFileNames: config.chunkFileNames,
        preserveModules: config.preserveModules,
      },
    },
  },
};
"#;

/// Bundling through the Vite CLI in library mode.
#[derive(Debug, Clone, Default)]
pub struct ViteBundler {
    program: Option<PathBuf>,
}

impl ViteBundler {
    pub fn new(program: Option<PathBuf>) -> Self {
        ViteBundler { program }
    }
}

impl Bundler for ViteBundler {
    fn bundle(&self, config: &BundleConfig) -> Result<()> {
        let root = PathBuf::from(&config.root);
        let program = resolve_tool(&root, self.program.as_deref(), "vite")?;

        let scratch = tempfile::Builder::new()
            .prefix("packup-vite-")
            .tempdir()
            .context("failed to create temporary directory")?;
        let loader = scratch.path().join("vite.config.mjs");
        let settings = scratch.path().join("bundle.json");

        write_string(&loader, VITE_CONFIG_LOADER)?;
        write_string(
            &settings,
            &serde_json::to_string_pretty(config).context("failed to serialize bundle config")?,
        )?;

        ProcessBuilder::new(program)
            .arg("build")
            .arg("--config")
            .arg(&loader)
            .env(CONFIG_ENV, settings.to_string_lossy())
            .cwd(&root)
            .exec_and_check()?;

        Ok(())
    }
}
