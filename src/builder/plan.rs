//! Build task planning.
//!
//! The planner turns a [`BuildContext`] into an ordered task list: exactly
//! one declaration task, followed by one bundle task per distinct
//! `(format, output)` pair in the order those pairs were first seen.

use serde::{Deserialize, Serialize};

use crate::builder::context::BuildContext;
use crate::core::target::{Format, Runtime};

/// A build task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    /// Emit type declarations for every export with a `types` field
    Dts(DtsTask),
    /// Bundle JS for one module format and output file
    JsBundle(JsBundleTask),
}

impl Task {
    /// Short human-readable label.
    pub fn describe(&self) -> String {
        match self {
            Task::Dts(_) => "types".to_string(),
            Task::JsBundle(task) => format!("javascript files ({})", task.format),
        }
    }
}

/// Declaration emission for all typed exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtsTask {
    pub entries: Vec<DeclEntry>,
}

/// One export that declares a `types` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclEntry {
    /// Specifier consumers import this export by (e.g. `pkg/server`)
    pub import_id: String,
    /// Export subpath (e.g. `./server`)
    pub export_path: String,
    /// Source file the declarations are generated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Declared `types` output
    pub target_path: String,
}

/// JS bundle emission for one `(format, output)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsBundleTask {
    pub format: Format,
    pub output: String,
    pub runtime: Runtime,
    pub entries: Vec<BundleEntry>,
}

/// An export contributing to a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Export subpath
    pub path: String,
    /// Source entry file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

/// Plan the build tasks for `ctx`.
pub fn plan(ctx: &BuildContext) -> Vec<Task> {
    let mut dts = DtsTask::default();
    let mut bundles: Vec<JsBundleTask> = Vec::new();

    for (export_path, export) in ctx.exports.iter() {
        let runtime = match Runtime::for_export_path(export_path) {
            Runtime::Universal => ctx.config.runtime.unwrap_or(Runtime::Universal),
            runtime => runtime,
        };

        if let Some(types) = &export.types {
            dts.entries.push(DeclEntry {
                import_id: import_id(&ctx.manifest.name, export_path),
                export_path: export_path.to_string(),
                source_path: export.source.clone(),
                target_path: types.clone(),
            });
        }

        let outputs = [
            (Format::Cjs, export.require.as_ref()),
            (Format::Es, export.import.as_ref()),
        ];

        for (format, output) in outputs {
            let Some(output) = output else {
                continue;
            };

            let entry = BundleEntry {
                path: export_path.to_string(),
                entry: export.source.clone(),
            };

            match bundles
                .iter_mut()
                .find(|t| t.format == format && t.output == *output)
            {
                Some(task) => {
                    if task.runtime != runtime {
                        tracing::warn!(
                            "multiple entries with different outputs for the same format are not supported; \
                             the first output will be used ({} `{}`: keeping runtime `{}`, ignoring `{}` from `{}`)",
                            format,
                            output,
                            task.runtime,
                            runtime,
                            export_path
                        );
                    }
                    task.entries.push(entry);
                }
                None => bundles.push(JsBundleTask {
                    format,
                    output: output.clone(),
                    runtime,
                    entries: vec![entry],
                }),
            }
        }
    }

    tracing::debug!(
        "planned {} declaration entries and {} bundle tasks",
        dts.entries.len(),
        bundles.len()
    );

    std::iter::once(Task::Dts(dts))
        .chain(bundles.into_iter().map(Task::JsBundle))
        .collect()
}

/// Join a package name and an export subpath the way module specifiers read.
///
/// `("pkg", ".")` becomes `pkg`, `("pkg", "./server")` becomes `pkg/server`.
pub fn import_id(name: &str, export_path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in name.split('/').chain(export_path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;

    fn bundles(tasks: &[Task]) -> Vec<&JsBundleTask> {
        tasks
            .iter()
            .filter_map(|t| match t {
                Task::JsBundle(b) => Some(b),
                Task::Dts(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_plan_scenario() {
        let ctx = context(
            "/",
            r#"{
                "name": "test",
                "version": "1.0.0",
                "exports": {
                    ".": {
                        "types": "./dist/index.d.ts",
                        "import": "./dist/index.mjs",
                        "require": "./dist/index.js"
                    }
                }
            }"#,
        );

        let tasks = plan(&ctx);
        assert_eq!(tasks.len(), 3);

        let Task::Dts(dts) = &tasks[0] else {
            panic!("declaration task must come first");
        };
        assert_eq!(dts.entries.len(), 1);
        assert_eq!(dts.entries[0].import_id, "test");
        assert_eq!(dts.entries[0].export_path, ".");
        assert_eq!(dts.entries[0].target_path, "./dist/index.d.ts");

        let bundles = bundles(&tasks);
        assert_eq!(bundles[0].format, Format::Cjs);
        assert_eq!(bundles[0].output, "./dist/index.js");
        assert_eq!(bundles[1].format, Format::Es);
        assert_eq!(bundles[1].output, "./dist/index.mjs");
    }

    #[test]
    fn test_plan_without_require_has_no_cjs_task() {
        let ctx = context(
            "/pkg",
            r#"{"name": "test", "version": "1.0.0", "exports": {
                ".": { "import": "./dist/index.mjs" }
            }}"#,
        );

        let tasks = plan(&ctx);
        let bundles = bundles(&tasks);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].format, Format::Es);
    }

    #[test]
    fn test_plan_merges_shared_outputs() {
        let ctx = context(
            "/pkg",
            r#"{"name": "test", "version": "1.0.0", "exports": {
                ".": { "source": "./src/index.ts", "require": "./dist/index.js" },
                "./extra": { "source": "./src/extra.ts", "require": "./dist/index.js" }
            }}"#,
        );

        let tasks = plan(&ctx);
        let bundles = bundles(&tasks);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].entries.len(), 2);
        assert_eq!(bundles[0].entries[1].path, "./extra");
        assert_eq!(bundles[0].entries[1].entry.as_deref(), Some("./src/extra.ts"));
    }

    #[test]
    fn test_plan_runtime_conflict_keeps_first() {
        let ctx = context(
            "/pkg",
            r#"{"name": "test", "version": "1.0.0", "exports": {
                "./strapi-admin": { "import": "./dist/shared.mjs" },
                "./strapi-server": { "import": "./dist/shared.mjs" }
            }}"#,
        );

        let tasks = plan(&ctx);
        let bundles = bundles(&tasks);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].runtime, Runtime::Web);
        assert_eq!(bundles[0].entries.len(), 2);
    }

    #[test]
    fn test_plan_runtime_classification() {
        let ctx = context(
            "/pkg",
            r#"{"name": "plugin", "version": "1.0.0", "exports": {
                "./strapi-admin": { "require": "./dist/admin/index.js" },
                "./strapi-server": { "require": "./dist/server/index.js" },
                "./utils": { "require": "./dist/utils/index.js" }
            }}"#,
        );

        let tasks = plan(&ctx);
        let runtimes: Vec<_> = bundles(&tasks).iter().map(|b| b.runtime).collect();
        assert_eq!(runtimes, [Runtime::Web, Runtime::Node, Runtime::Universal]);
    }

    #[test]
    fn test_plan_configured_runtime_applies_to_unclassified_exports() {
        let mut ctx = context(
            "/pkg",
            r#"{"name": "plugin", "version": "1.0.0", "exports": {
                "./strapi-admin": { "require": "./dist/admin/index.js" },
                "./utils": { "require": "./dist/utils/index.js" }
            }}"#,
        );
        ctx.config.runtime = Some(Runtime::Node);

        let tasks = plan(&ctx);
        let runtimes: Vec<_> = bundles(&tasks).iter().map(|b| b.runtime).collect();
        assert_eq!(runtimes, [Runtime::Web, Runtime::Node]);
    }

    #[test]
    fn test_plan_always_has_declaration_task() {
        let ctx = context(
            "/pkg",
            r#"{"name": "test", "version": "1.0.0", "main": "./dist/index.js"}"#,
        );

        let tasks = plan(&ctx);
        assert_eq!(tasks.len(), 2);
        assert!(matches!(&tasks[0], Task::Dts(d) if d.entries.is_empty()));
    }

    #[test]
    fn test_plan_subpath_import_ids() {
        let ctx = context(
            "/pkg",
            r#"{"name": "@scope/pkg", "version": "1.0.0", "exports": {
                ".": { "types": "./dist/index.d.ts", "import": "./dist/index.mjs" },
                "./server": { "types": "./dist/server/index.d.ts", "import": "./dist/server/index.mjs" }
            }}"#,
        );

        let tasks = plan(&ctx);
        let Task::Dts(dts) = &tasks[0] else {
            panic!("declaration task must come first");
        };
        let ids: Vec<_> = dts.entries.iter().map(|e| e.import_id.as_str()).collect();
        assert_eq!(ids, ["@scope/pkg", "@scope/pkg/server"]);
    }

    #[test]
    fn test_import_id() {
        assert_eq!(import_id("test", "."), "test");
        assert_eq!(import_id("test", "./server"), "test/server");
        assert_eq!(import_id("@s/p", "./a/../b"), "@s/p/b");
    }

    #[test]
    fn test_task_serialization() {
        let task = Task::JsBundle(JsBundleTask {
            format: Format::Es,
            output: "./dist/index.mjs".to_string(),
            runtime: Runtime::Universal,
            entries: vec![BundleEntry {
                path: ".".to_string(),
                entry: None,
            }],
        });

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"type\":\"js_bundle\""));
        assert!(json.contains("\"format\":\"es\""));
        assert!(json.contains("\"runtime\":\"*\""));
        assert!(!json.contains("\"entry\""));
    }
}
