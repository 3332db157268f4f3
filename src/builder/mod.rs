//! Build orchestration.
//!
//! This module turns a package manifest into a build context, plans the
//! declaration and bundle tasks, and runs them through their handlers.

pub mod context;
pub mod executor;
pub mod plan;
pub mod targets;
pub mod tasks;

pub use context::{BuildContext, ContextError, ExportMap};
pub use executor::BuildExecutor;
pub use plan::{plan, Task};
pub use targets::{BrowserslistTranslator, TargetTranslator};
pub use tasks::{Handlers, TaskError, TaskHandler};
