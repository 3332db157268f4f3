//! Build context - output directory, compile targets, externals and exports.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use miette::Diagnostic;
use thiserror::Error;

use crate::builder::targets::{resolve_targets, TargetTranslator};
use crate::core::manifest::{parse_exports, Export, ExtensionMap, PackageManifest};
use crate::core::target::Targets;
use crate::util::config::BuildConfig;
use crate::util::fs::{normalize_lexically, resolve};

/// Errors about the package's output layout.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ContextError {
    #[error("could not detect dist path")]
    #[diagnostic(
        code(packup::context::dist_not_detected),
        help("declare `require` or `import` outputs in package.json")
    )]
    DistNotDetected,

    #[error(
        "all output files must share a common parent directory which is not the root package directory"
    )]
    #[diagnostic(
        code(packup::context::dist_is_root),
        help("move build outputs into a directory such as ./dist")
    )]
    DistIsPackageRoot,

    #[error("the dist directory `{}` contains the package directory", .0.display())]
    #[diagnostic(code(packup::context::dist_contains_root))]
    DistContainsPackageRoot(PathBuf),

    #[error("output `{}` is outside the dist directory `{}`", .0, .1.display())]
    #[diagnostic(
        code(packup::context::output_outside_dist),
        help("set `[build] dist` to a directory containing every `require` and `import` output")
    )]
    OutputsOutsideDist(String, PathBuf),
}

/// Export subpaths in manifest order.
///
/// Inserting an existing subpath replaces its export in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMap {
    entries: Vec<(String, Export)>,
}

impl ExportMap {
    pub fn new() -> Self {
        ExportMap::default()
    }

    pub fn insert(&mut self, path: String, export: Export) {
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = export,
            None => self.entries.push((path, export)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Export> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.entries.iter().map(|(p, e)| (p.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Export)> for ExportMap {
    fn from_iter<I: IntoIterator<Item = (String, Export)>>(iter: I) -> Self {
        let mut map = ExportMap::new();
        for (path, export) in iter {
            map.insert(path, export);
        }
        map
    }
}

/// Everything the planner and task handlers need to know about one build.
///
/// Created once per invocation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Package root directory
    pub cwd: PathBuf,

    /// The validated manifest
    pub manifest: PackageManifest,

    /// Normalized exports, in manifest order
    pub exports: ExportMap,

    /// Module names the bundler leaves as runtime imports
    pub external: BTreeSet<String>,

    /// Output extensions per module system
    pub ext_map: ExtensionMap,

    /// Compiler targets per runtime
    pub targets: Targets,

    /// Directory containing every build artifact
    pub dist_path: PathBuf,

    /// Build settings from config and CLI
    pub config: BuildConfig,
}

impl BuildContext {
    /// Create a new build context for the package rooted at `cwd`.
    pub fn new(
        cwd: &Path,
        ext_map: ExtensionMap,
        manifest: PackageManifest,
        config: BuildConfig,
        translator: &dyn TargetTranslator,
    ) -> Result<Self> {
        let cwd = if cwd.is_absolute() {
            normalize_lexically(cwd)
        } else {
            normalize_lexically(&std::env::current_dir()?.join(cwd))
        };

        let exports: ExportMap = parse_exports(&manifest, &ext_map)?.into_iter().collect();

        let external = manifest
            .dependencies
            .keys()
            .chain(manifest.peer_dependencies.keys())
            .chain(config.externals.iter())
            .cloned()
            .collect();

        let dist_path = dist_path(&cwd, &exports, config.dist.as_deref())?;

        // Layout errors are reported before any external tool runs
        let targets = resolve_targets(manifest.browserslist.as_deref(), translator)?;

        tracing::debug!("dist path: {}", dist_path.display());

        Ok(BuildContext {
            cwd,
            manifest,
            exports,
            external,
            ext_map,
            targets,
            dist_path,
            config,
        })
    }

    /// Output extensions for the package's module system.
    pub fn extensions(&self) -> &crate::core::manifest::Extensions {
        self.ext_map.for_type(self.manifest.package_type())
    }
}

/// The dist directory: `configured` when set, otherwise inferred from the
/// `import`/`require` outputs of `exports`.
pub fn dist_path(
    cwd: &Path,
    exports: &ExportMap,
    configured: Option<&Path>,
) -> Result<PathBuf, ContextError> {
    let outputs = exports
        .iter()
        .flat_map(|(_, e)| [e.import.as_deref(), e.require.as_deref()])
        .flatten();

    match configured {
        Some(dist) => {
            let dist = check_dist_path(cwd, resolve(cwd, dist))?;
            for output in outputs {
                if !resolve(cwd, output).starts_with(&dist) {
                    return Err(ContextError::OutputsOutsideDist(output.to_string(), dist));
                }
            }
            Ok(dist)
        }
        None => infer_dist_path(cwd, outputs),
    }
}

/// Find the deepest directory containing every output path.
///
/// Output paths are resolved against `cwd`; the result is the longest common
/// prefix of their parent directories. A prefix that is only the filesystem
/// root does not count as a dist directory.
pub fn infer_dist_path<'a>(
    cwd: &Path,
    outputs: impl IntoIterator<Item = &'a str>,
) -> Result<PathBuf, ContextError> {
    let dirs: Vec<PathBuf> = outputs
        .into_iter()
        .map(|output| {
            let path = resolve(cwd, output);
            path.parent().map(Path::to_path_buf).unwrap_or(path)
        })
        .collect();

    let (first, rest) = dirs.split_first().ok_or(ContextError::DistNotDetected)?;

    let common = rest.iter().fold(
        first.components().collect::<Vec<Component<'_>>>(),
        |mut common, dir| {
            let shared = common
                .iter()
                .zip(dir.components())
                .take_while(|(a, b)| **a == *b)
                .count();
            common.truncate(shared);
            common
        },
    );

    if !common.iter().any(|c| matches!(c, Component::Normal(_))) {
        return Err(ContextError::DistNotDetected);
    }

    check_dist_path(cwd, common.into_iter().collect())
}

/// Reject dist directories whose cleanup would delete package sources.
fn check_dist_path(cwd: &Path, dist: PathBuf) -> Result<PathBuf, ContextError> {
    if dist == cwd {
        return Err(ContextError::DistIsPackageRoot);
    }
    if cwd.starts_with(&dist) {
        return Err(ContextError::DistContainsPackageRoot(dist));
    }
    Ok(dist)
}
