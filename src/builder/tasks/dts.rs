//! Type declaration emission.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use crate::builder::context::BuildContext;
use crate::builder::plan::{DeclEntry, DtsTask};
use crate::builder::tasks::{TaskError, TaskHandler};
use crate::util::fs::{find_upwards, read_to_string, resolve, to_slash};
use crate::util::process::{resolve_tool, ProcessBuilder};
use crate::util::shell::{Paint, Reporter};

/// One declaration build handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationRequest {
    /// Package root
    pub cwd: PathBuf,
    /// Build config the compiler extends
    pub tsconfig: PathBuf,
    /// Where `.d.ts` files are written
    pub declaration_dir: PathBuf,
}

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Message,
    Suggestion,
}

/// A diagnostic reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerDiagnostic {
    pub severity: Severity,
    /// `file(line,col)` location, if any
    pub location: Option<String>,
    pub code: u32,
    pub message: String,
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: TS{}: {}", location, self.code, self.message),
            None => write!(f, "TS{}: {}", self.code, self.message),
        }
    }
}

/// What the compiler reported for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationOutput {
    /// The compiler did not write any output
    pub emit_skipped: bool,
    pub diagnostics: Vec<CompilerDiagnostic>,
}

/// Emits `.d.ts` files for a TypeScript project.
pub trait DeclarationCompiler: Send + Sync {
    fn emit(&self, request: &DeclarationRequest) -> Result<DeclarationOutput>;
}

/// Handler for [`DtsTask`].
pub struct DtsHandler<'a> {
    compiler: &'a dyn DeclarationCompiler,
}

impl<'a> DtsHandler<'a> {
    pub fn new(compiler: &'a dyn DeclarationCompiler) -> Self {
        DtsHandler { compiler }
    }

    fn build_entry(&self, ctx: &BuildContext, entry: &DeclEntry) -> Result<(), TaskError> {
        let base = match &entry.source_path {
            Some(source) => {
                let source = resolve(&ctx.cwd, source);
                source
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| ctx.cwd.clone())
            }
            None => ctx.cwd.clone(),
        };

        let Some(tsconfig) = find_upwards(&base, ctx.config.tsconfig_name()) else {
            tracing::warn!(
                "you've added a types entry but no config was found for {}, skipping",
                entry.target_path
            );
            return Ok(());
        };

        tracing::debug!(
            "building declarations for `{}` with {}",
            entry.import_id,
            tsconfig.display()
        );

        let declaration_dir = read_out_dir(&tsconfig)?;
        let request = DeclarationRequest {
            cwd: ctx.cwd.clone(),
            tsconfig,
            declaration_dir,
        };

        let output = self
            .compiler
            .emit(&request)
            .map_err(|err| TaskError::Tool {
                tool: "tsc",
                message: format!("{:#}", err),
            })?;

        let mut errors = 0;
        for diagnostic in &output.diagnostics {
            match diagnostic.severity {
                Severity::Error => {
                    errors += 1;
                    tracing::error!("{}", diagnostic);
                }
                Severity::Warning => tracing::warn!("{}", diagnostic),
                Severity::Message | Severity::Suggestion => tracing::info!("{}", diagnostic),
            }
        }

        if output.emit_skipped && errors > 0 {
            return Err(TaskError::Compilation {
                import_id: entry.import_id.clone(),
                errors,
            });
        }

        Ok(())
    }
}

impl TaskHandler<DtsTask> for DtsHandler<'_> {
    fn print(&self, _ctx: &BuildContext, task: &DtsTask, reporter: &Reporter) {
        let shell = reporter.shell();
        let mut lines = vec!["Building Types entries:".to_string()];

        for entry in &task.entries {
            lines.push(format!("    import: {}", shell.paint(Paint::Green, &entry.import_id)));
            if let Some(source) = &entry.source_path {
                lines.push(format!("    source: {}", shell.paint(Paint::Cyan, source)));
            }
            lines.push(format!("    types: {}", shell.paint(Paint::Cyan, &entry.target_path)));
            lines.push(String::new());
        }

        shell.print_block(&lines);
    }

    fn execute(
        &self,
        ctx: &BuildContext,
        task: &DtsTask,
        reporter: &Reporter,
    ) -> Result<(), TaskError> {
        reporter.start("Building type files");

        let results: Vec<Result<(), TaskError>> = task
            .entries
            .par_iter()
            .map(|entry| self.build_entry(ctx, entry))
            .collect();

        for result in results {
            result?;
        }

        Ok(())
    }

    fn success(&self, _ctx: &BuildContext, _task: &DtsTask, reporter: &Reporter) {
        reporter.succeed("types");
    }

    fn fail(&self, _ctx: &BuildContext, _task: &DtsTask, reporter: &Reporter, _err: &TaskError) {
        reporter.fail("failed to build type files");
    }
}

/// Read `compilerOptions.outDir`, following relative `extends`.
///
/// The result is resolved against the directory of the config that sets it.
fn read_out_dir(tsconfig: &Path) -> Result<PathBuf, TaskError> {
    let config_error = |path: &Path, message: String| TaskError::Config {
        path: path.display().to_string(),
        message,
    };

    let mut current = tsconfig.to_path_buf();
    let mut seen: Vec<PathBuf> = Vec::new();

    loop {
        if seen.contains(&current) {
            return Err(config_error(tsconfig, "circular `extends`".to_string()));
        }
        seen.push(current.clone());

        let contents = read_to_string(&current).map_err(|e| config_error(&current, format!("{:#}", e)))?;
        let value: Value =
            json5::from_str(&contents).map_err(|e| config_error(&current, e.to_string()))?;

        let dir = current.parent().unwrap_or(Path::new("."));

        if let Some(out_dir) = value.pointer("/compilerOptions/outDir").and_then(Value::as_str) {
            return Ok(resolve(dir, out_dir));
        }

        match value.get("extends").and_then(Value::as_str) {
            Some(parent) if parent.starts_with('.') => {
                let mut next = resolve(dir, parent);
                if next.extension().is_none() {
                    next.set_extension("json");
                }
                current = next;
            }
            _ => {
                return Err(config_error(
                    tsconfig,
                    "`compilerOptions.outDir` is not set".to_string(),
                ))
            }
        }
    }
}

/// Declaration emission through the TypeScript compiler CLI.
#[derive(Debug, Clone, Default)]
pub struct TscCompiler {
    program: Option<PathBuf>,
}

impl TscCompiler {
    pub fn new(program: Option<PathBuf>) -> Self {
        TscCompiler { program }
    }
}

impl DeclarationCompiler for TscCompiler {
    fn emit(&self, request: &DeclarationRequest) -> Result<DeclarationOutput> {
        let program = resolve_tool(&request.cwd, self.program.as_deref(), "tsc")?;

        // Sits next to the build config so default `include` globs still apply.
        let dir = request.tsconfig.parent().unwrap_or(&request.cwd);
        let mut config = tempfile::Builder::new()
            .prefix(".tsconfig.packup.")
            .suffix(".json")
            .tempfile_in(dir)
            .context("failed to create temporary tsconfig")?;

        let overrides = serde_json::json!({
            "extends": to_slash(&request.tsconfig),
            "compilerOptions": {
                "declaration": true,
                "emitDeclarationOnly": true,
                "noEmit": false,
                "declarationDir": to_slash(&request.declaration_dir),
            }
        });
        serde_json::to_writer_pretty(&mut config, &overrides)
            .context("failed to write temporary tsconfig")?;

        let output = ProcessBuilder::new(program)
            .arg("-p")
            .arg(config.path())
            .args(["--pretty", "false"])
            .cwd(&request.cwd)
            .exec()?;

        let code = output
            .status
            .code()
            .context("tsc was terminated by a signal")?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        Ok(DeclarationOutput {
            // 1: diagnostics, outputs skipped; 3: invalid project; 4: reference cycle
            emit_skipped: matches!(code, 1 | 3 | 4),
            diagnostics: parse_diagnostics(&stdout)?,
        })
    }
}

/// Parse `tsc --pretty false` output.
///
/// Indented lines continue the message of the preceding diagnostic.
pub fn parse_diagnostics(output: &str) -> Result<Vec<CompilerDiagnostic>> {
    let re = Regex::new(
        r"^(?:(?P<loc>.+?\(\d+,\d+\)): )?(?P<sev>error|warning|message|suggestion) TS(?P<code>\d+): (?P<msg>.*)$",
    )?;

    let mut diagnostics: Vec<CompilerDiagnostic> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = re.captures(line) {
            let severity = match &caps["sev"] {
                "error" => Severity::Error,
                "warning" => Severity::Warning,
                "message" => Severity::Message,
                _ => Severity::Suggestion,
            };
            diagnostics.push(CompilerDiagnostic {
                severity,
                location: caps.name("loc").map(|m| m.as_str().to_string()),
                code: caps["code"].parse().unwrap_or(0),
                message: caps["msg"].to_string(),
            });
        } else if line.starts_with(' ') && !line.trim().is_empty() {
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line);
            }
        }
    }

    Ok(diagnostics)
}
