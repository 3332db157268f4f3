//! Compiler target resolution from browserslist queries.
//!
//! Browserslist queries describe the environments a package supports; the
//! bundler wants engine/version pairs like `chrome100` or `node16.0.0`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::target::Targets;
use crate::util::process::{resolve_tool, ProcessBuilder};

/// Queries used when the manifest has no `browserslist` field.
pub const DEFAULT_BROWSERS_LIST: &[&str] = &[
    "last 3 major versions",
    "Firefox ESR",
    "last 2 Opera versions",
    "not dead",
    "node 16.0.0",
];

/// Baseline query for node-only bundles.
pub const NODE_BASELINE_QUERY: &str = "node 16.0.0";

/// Target list for browser-only bundles.
pub const WEB_TARGET: &str = "esnext";

/// Translates browserslist queries into compiler targets.
pub trait TargetTranslator {
    fn translate(&self, queries: &[String]) -> Result<Vec<String>>;
}

/// Resolve the per-runtime target lists.
///
/// The universal list follows the manifest's queries (or the defaults); the
/// node and web lists are fixed.
pub fn resolve_targets(
    queries: Option<&[String]>,
    translator: &dyn TargetTranslator,
) -> Result<Targets> {
    let universal_queries: Vec<String> = match queries {
        Some(q) if !q.is_empty() => q.to_vec(),
        _ => DEFAULT_BROWSERS_LIST.iter().map(|q| q.to_string()).collect(),
    };

    let universal = translator
        .translate(&universal_queries)
        .context("failed to resolve browserslist targets")?;
    if universal.is_empty() {
        bail!(
            "could not resolve any compiler targets from browserslist queries: {}",
            universal_queries.join(", ")
        );
    }
    let node = translator
        .translate(&[NODE_BASELINE_QUERY.to_string()])
        .context("failed to resolve node targets")?;

    tracing::debug!("resolved targets: * = {:?}, node = {:?}", universal, node);

    Ok(Targets {
        universal,
        node,
        web: vec![WEB_TARGET.to_string()],
    })
}

/// Default translator.
///
/// Explicit `<browser> <version>` queries are translated directly; anything
/// else is expanded by the `browserslist` CLI first.
#[derive(Debug, Clone)]
pub struct BrowserslistTranslator {
    cwd: PathBuf,
    program: Option<PathBuf>,
}

impl BrowserslistTranslator {
    pub fn new(cwd: &Path, program: Option<PathBuf>) -> Self {
        BrowserslistTranslator {
            cwd: cwd.to_path_buf(),
            program,
        }
    }

    fn expand(&self, queries: &[String]) -> Result<Vec<String>> {
        let program = resolve_tool(&self.cwd, self.program.as_deref(), "browserslist")?;
        let output = ProcessBuilder::new(program)
            .arg(queries.join(", "))
            .cwd(&self.cwd)
            .exec_and_check()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl TargetTranslator for BrowserslistTranslator {
    fn translate(&self, queries: &[String]) -> Result<Vec<String>> {
        if queries.iter().all(|q| parse_explicit(q).is_some()) {
            return Ok(to_compiler_targets(queries));
        }

        let expanded = self.expand(queries)?;
        Ok(to_compiler_targets(&expanded))
    }
}

/// Parse an explicit `<browser> <version>` query.
fn parse_explicit(query: &str) -> Option<(&str, &str)> {
    let mut parts = query.split_whitespace();
    let name = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let starts_with_digit = version.chars().next().is_some_and(|c| c.is_ascii_digit());
    let is_version = version
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    let known = engine_name(&name.to_lowercase()).is_some();

    (starts_with_digit && is_version && known).then_some((name, version))
}

/// Map a browserslist browser name onto a compiler engine name.
fn engine_name(browser: &str) -> Option<&'static str> {
    match browser {
        "chrome" | "and_chr" => Some("chrome"),
        "edge" => Some("edge"),
        "firefox" | "and_ff" => Some("firefox"),
        "ie" => Some("ie"),
        "ios_saf" | "ios" => Some("ios"),
        "node" => Some("node"),
        "opera" => Some("opera"),
        "safari" => Some("safari"),
        _ => None,
    }
}

/// Convert `<browser> <version>` lines into compiler targets.
///
/// Unknown browsers are dropped, version ranges use their lower bound, and
/// only the lowest version per engine is kept.
pub fn to_compiler_targets(entries: &[String]) -> Vec<String> {
    let mut lowest: BTreeMap<&'static str, (Vec<u64>, String)> = BTreeMap::new();

    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(engine) = engine_name(&name.to_lowercase()) else {
            continue;
        };

        let version = version.split('-').next().unwrap_or(version).to_string();
        let key = version_key(&version);

        match lowest.get(engine) {
            Some((existing, _)) if *existing <= key => {}
            _ => {
                lowest.insert(engine, (key, version));
            }
        }
    }

    lowest
        .into_iter()
        .map(|(engine, (_, version))| format!("{}{}", engine, version))
        .collect()
}

fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}
