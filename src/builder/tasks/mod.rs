//! Task handlers.
//!
//! Every [`Task`] variant has exactly one handler. Handlers are stateless:
//! everything they need comes from the [`BuildContext`], the task value and
//! the [`Reporter`] passed into each call.

pub mod bundle;
pub mod dts;

use miette::Diagnostic;
use thiserror::Error;

use crate::builder::context::BuildContext;
use crate::builder::plan::Task;
use crate::util::shell::Reporter;

pub use bundle::{BundleConfig, BundleHandler, Bundler, ViteBundler};
pub use dts::{DeclarationCompiler, DeclarationRequest, DtsHandler, TscCompiler};

/// Errors raised while running a task.
#[derive(Debug, Error, Diagnostic)]
pub enum TaskError {
    #[error("failed to emit declarations for `{import_id}` ({errors} error(s))")]
    #[diagnostic(code(packup::task::compilation))]
    Compilation { import_id: String, errors: usize },

    #[error("invalid compiler config `{path}`: {message}")]
    #[diagnostic(
        code(packup::task::config),
        help("set `compilerOptions.outDir` in the build tsconfig or a config it extends")
    )]
    Config { path: String, message: String },

    #[error("failed to bundle `{output}`: {message}")]
    #[diagnostic(code(packup::task::bundle))]
    Bundle { output: String, message: String },

    #[error("failed to run {tool}: {message}")]
    #[diagnostic(code(packup::task::tool))]
    Tool { tool: &'static str, message: String },
}

/// Lifecycle shared by all task handlers.
///
/// `print` describes the task without side effects. `run` starts the
/// reporter, does the work and then reports through exactly one of
/// `success` or `fail`.
pub trait TaskHandler<T> {
    /// Describe what the task is about to do.
    fn print(&self, ctx: &BuildContext, task: &T, reporter: &Reporter);

    /// Do the work of the task.
    fn execute(&self, ctx: &BuildContext, task: &T, reporter: &Reporter) -> Result<(), TaskError>;

    /// Report a finished task.
    fn success(&self, ctx: &BuildContext, task: &T, reporter: &Reporter);

    /// Report a failed task.
    fn fail(&self, ctx: &BuildContext, task: &T, reporter: &Reporter, err: &TaskError);

    /// Run the task and report the outcome.
    fn run(&self, ctx: &BuildContext, task: &T, reporter: &Reporter) -> Result<(), TaskError> {
        match self.execute(ctx, task, reporter) {
            Ok(()) => {
                self.success(ctx, task, reporter);
                Ok(())
            }
            Err(err) => {
                self.fail(ctx, task, reporter, &err);
                Err(err)
            }
        }
    }
}

/// One handler per task variant.
pub struct Handlers<'a> {
    pub dts: DtsHandler<'a>,
    pub bundle: BundleHandler<'a>,
}

impl<'a> Handlers<'a> {
    pub fn new(compiler: &'a dyn DeclarationCompiler, bundler: &'a dyn Bundler) -> Self {
        Handlers {
            dts: DtsHandler::new(compiler),
            bundle: BundleHandler::new(bundler),
        }
    }

    pub fn print(&self, ctx: &BuildContext, task: &Task, reporter: &Reporter) {
        match task {
            Task::Dts(t) => self.dts.print(ctx, t, reporter),
            Task::JsBundle(t) => self.bundle.print(ctx, t, reporter),
        }
    }

    pub fn run(&self, ctx: &BuildContext, task: &Task, reporter: &Reporter) -> Result<(), TaskError> {
        match task {
            Task::Dts(t) => self.dts.run(ctx, t, reporter),
            Task::JsBundle(t) => self.bundle.run(ctx, t, reporter),
        }
    }
}
