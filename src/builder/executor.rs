//! Build pipeline execution.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::builder::plan::Task;
use crate::builder::tasks::Handlers;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::shell::{format_duration, Shell, Status};

/// Runs planned tasks in order against one build context.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
    shell: Arc<Shell>,
    handlers: Handlers<'a>,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(ctx: &'a BuildContext, shell: Arc<Shell>, handlers: Handlers<'a>) -> Self {
        BuildExecutor {
            ctx,
            shell,
            handlers,
        }
    }

    /// Clean the dist directory, then run every task sequentially.
    ///
    /// The first failing task aborts the build; artifacts written by earlier
    /// tasks are left in place.
    pub fn execute(&self, tasks: &[Task]) -> Result<()> {
        let start = Instant::now();

        if let Some(jobs) = self.ctx.config.jobs {
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
                .ok(); // Ignore if already set
        }

        self.clean();

        for task in tasks {
            tracing::debug!("running task: {}", task.describe());
            let reporter = self.shell.reporter();
            self.handlers.print(self.ctx, task, &reporter);
            self.handlers.run(self.ctx, task, &reporter)?;
        }

        self.shell.status(
            Status::Finished,
            format!(
                "{} in {}",
                self.ctx.manifest.name,
                format_duration(start.elapsed())
            ),
        );

        Ok(())
    }

    fn clean(&self) {
        self.shell.status(Status::Cleaning, self.ctx.dist_path.display());

        if let Err(e) = remove_dir_all_if_exists(&self.ctx.dist_path) {
            self.shell.status(Status::Warning, format!("{:#}", e));
        }
    }
}
