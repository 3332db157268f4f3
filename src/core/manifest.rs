//! package.json manifest parsing and validation.
//!
//! The manifest is read once per build. Object key order inside `exports`
//! is significant, so the raw export map is kept as an ordered JSON map.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::target::Format;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "package.json";

/// Keys allowed inside an object-valued export entry.
const KNOWN_EXPORT_KEYS: &[&str] = &[
    "types", "source", "module", "import", "require", "default", "browser", "node",
];

/// Errors found while loading or validating a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("failed to parse package.json: {0}")]
    #[diagnostic(code(packup::manifest::parse))]
    Parse(#[from] serde_json::Error),

    #[error("package.json: missing required field `{0}`")]
    #[diagnostic(code(packup::manifest::missing_field))]
    MissingField(&'static str),

    #[error("package.json: invalid version `{version}`: {source}")]
    #[diagnostic(
        code(packup::manifest::version),
        help("versions must follow semver, e.g. \"1.0.0\"")
    )]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    #[error("package.json: invalid type `{0}`; expected \"commonjs\" or \"module\"")]
    #[diagnostic(code(packup::manifest::package_type))]
    InvalidType(String),

    #[error("'package.json' must contain a 'main' and 'module' property")]
    #[diagnostic(code(packup::manifest::missing_entry))]
    MissingEntry,

    #[error("exports[\"{path}\"]: the 'types' property should be the first property")]
    #[diagnostic(code(packup::manifest::ordering))]
    TypesNotFirst { path: String },

    #[error("exports[\"{path}\"]: the 'default' property should be the last property")]
    #[diagnostic(code(packup::manifest::ordering))]
    DefaultNotLast { path: String },

    #[error("exports[\"{path}\"]: unknown property '{key}'")]
    #[diagnostic(
        code(packup::manifest::unknown_key),
        help("allowed properties: types, source, module, import, require, default, browser, node")
    )]
    UnknownExportKey { path: String, key: String },

    #[error("invalid exports:{}", format_list(.0))]
    #[diagnostic(code(packup::manifest::exports))]
    InvalidExports(Vec<String>),
}

fn format_list(errors: &[String]) -> String {
    errors.iter().map(|e| format!("\n- {}", e)).collect()
}

/// Module system declared by the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    CommonJs,
    Module,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::CommonJs => "commonjs",
            PackageType::Module => "module",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output file extensions for one module system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    pub cjs: String,
    pub es: String,
}

impl Extensions {
    pub fn for_format(&self, format: Format) -> &str {
        match format {
            Format::Cjs => &self.cjs,
            Format::Es => &self.es,
        }
    }
}

/// Output extensions per module system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMap {
    pub commonjs: Extensions,
    pub module: Extensions,
}

impl ExtensionMap {
    pub fn for_type(&self, ty: PackageType) -> &Extensions {
        match ty {
            PackageType::CommonJs => &self.commonjs,
            PackageType::Module => &self.module,
        }
    }
}

impl Default for ExtensionMap {
    fn default() -> Self {
        ExtensionMap {
            commonjs: Extensions {
                cjs: ".js".to_string(),
                es: ".mjs".to_string(),
            },
            module: Extensions {
                cjs: ".cjs".to_string(),
                es: ".js".to_string(),
            },
        }
    }
}

/// Build artifacts for a single export subpath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Export {
    /// Every declared output path (everything except `source`).
    pub fn output_paths(&self) -> impl Iterator<Item = &str> {
        [&self.types, &self.require, &self.import, &self.default]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }

    /// Overlay the fields set in `other` onto `self`.
    fn merge(&mut self, other: Export) {
        if other.types.is_some() {
            self.types = other.types;
        }
        if other.source.is_some() {
            self.source = other.source;
        }
        if other.require.is_some() {
            self.require = other.require;
        }
        if other.import.is_some() {
            self.import = other.import;
        }
        if other.default.is_some() {
            self.default = other.default;
        }
    }
}

/// `browserslist` accepts a single query string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum QueryList {
    One(String),
    Many(Vec<String>),
}

impl From<QueryList> for Vec<String> {
    fn from(list: QueryList) -> Self {
        match list {
            QueryList::One(q) => q
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            QueryList::Many(qs) => qs,
        }
    }
}

/// Raw manifest as deserialized from JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    package_type: Option<String>,
    main: Option<String>,
    module: Option<String>,
    types: Option<String>,
    source: Option<String>,
    exports: Option<Map<String, Value>>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
    browserslist: Option<QueryList>,
}

/// A validated package manifest.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub name: String,
    pub version: semver::Version,
    pub package_type: Option<PackageType>,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    pub source: Option<String>,
    /// Raw export map in declaration order
    pub exports: Option<Map<String, Value>>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
    pub browserslist: Option<Vec<String>>,
}

impl PackageManifest {
    /// Load and validate the manifest at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let manifest = Self::from_str(&contents)
            .with_context(|| format!("invalid manifest: {}", path.display()))?;
        Ok(manifest)
    }

    /// Parse and validate a manifest from JSON text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(contents)?;

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ManifestError::MissingField("name"))?;
        let version_str = raw
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or(ManifestError::MissingField("version"))?;
        let version = semver::Version::parse(&version_str).map_err(|source| {
            ManifestError::InvalidVersion {
                version: version_str.clone(),
                source,
            }
        })?;

        let package_type = match raw.package_type.as_deref() {
            None => None,
            Some("commonjs") => Some(PackageType::CommonJs),
            Some("module") => Some(PackageType::Module),
            Some(other) => return Err(ManifestError::InvalidType(other.to_string())),
        };

        let manifest = PackageManifest {
            name,
            version,
            package_type,
            main: raw.main,
            module: raw.module,
            types: raw.types,
            source: raw.source,
            exports: raw.exports,
            dependencies: raw.dependencies,
            dev_dependencies: raw.dev_dependencies,
            peer_dependencies: raw.peer_dependencies,
            browserslist: raw.browserslist.map(Into::into),
        };

        manifest.validate_export_ordering()?;

        Ok(manifest)
    }

    /// The effective module system (`commonjs` unless declared otherwise).
    pub fn package_type(&self) -> PackageType {
        self.package_type.unwrap_or_default()
    }

    /// Check key order inside every object-valued export.
    ///
    /// `types` must come first and `default` last; `module` before `import`
    /// and `import` before `require` are only warned about.
    pub fn validate_export_ordering(&self) -> Result<(), ManifestError> {
        let Some(exports) = &self.exports else {
            if self.main.is_none() && self.module.is_none() {
                return Err(ManifestError::MissingEntry);
            }
            return Ok(());
        };

        for (path, entry) in exports {
            let Value::Object(entry) = entry else {
                continue;
            };
            let keys: Vec<&str> = entry.keys().map(String::as_str).collect();

            if let Some(key) = keys.iter().find(|k| !KNOWN_EXPORT_KEYS.contains(k)) {
                return Err(ManifestError::UnknownExportKey {
                    path: path.clone(),
                    key: key.to_string(),
                });
            }

            if keys.contains(&"types") && keys.first() != Some(&"types") {
                return Err(ManifestError::TypesNotFirst { path: path.clone() });
            }

            if !comes_before(&keys, "import", "require") {
                tracing::warn!(
                    "exports[\"{}\"]: the 'import' property should come before the 'require' property",
                    path
                );
            }

            if !comes_before(&keys, "module", "import") {
                tracing::warn!(
                    "exports[\"{}\"]: the 'module' property should come before the 'import' property",
                    path
                );
            }

            if keys.contains(&"default") && keys.last() != Some(&"default") {
                return Err(ManifestError::DefaultNotLast { path: path.clone() });
            }
        }

        Ok(())
    }
}

/// True unless both keys are present and `second` precedes `first`.
fn comes_before(keys: &[&str], first: &str, second: &str) -> bool {
    let a = keys.iter().position(|k| *k == first);
    let b = keys.iter().position(|k| *k == second);
    match (a, b) {
        (Some(a), Some(b)) => a < b,
        _ => true,
    }
}

/// Normalize the manifest's export declarations into `(subpath, Export)` pairs.
///
/// The root export `"."` is always first and is seeded from the top-level
/// `main`/`module`/`types`/`source` fields. All problems are collected and
/// reported together.
pub fn parse_exports(
    manifest: &PackageManifest,
    ext_map: &ExtensionMap,
) -> Result<Vec<(String, Export)>, ManifestError> {
    let mut root = Export {
        types: manifest.types.clone(),
        source: manifest.source.clone(),
        require: manifest.main.clone(),
        import: manifest.module.clone(),
        default: manifest.module.clone().or_else(|| manifest.main.clone()),
    };

    let mut extra = Vec::new();
    let mut errors = Vec::new();

    if let Some(exports) = &manifest.exports {
        if !exports.contains_key("./package.json") {
            tracing::warn!("package.json: `exports[\"./package.json\"]` should be declared");
        }

        for (path, entry) in exports {
            if path.ends_with(".json") {
                if path == "./package.json" && entry.as_str() != Some("./package.json") {
                    errors.push(
                        "package.json: `exports[\"./package.json\"]` must be \"./package.json\""
                            .to_string(),
                    );
                }
                continue;
            }

            let Value::Object(fields) = entry else {
                errors.push(format!(
                    "package.json: `exports[\"{}\"]` must be an object",
                    path
                ));
                continue;
            };

            let export = match export_from_fields(path, fields) {
                Ok(export) => export,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            if path == "." {
                check_root_field(&mut errors, "main", "require", &root.require, &export.require);
                check_root_field(&mut errors, "module", "import", &root.import, &export.import);
                check_root_field(&mut errors, "types", "types", &root.types, &export.types);
                check_root_field(&mut errors, "source", "source", &root.source, &export.source);
                root.merge(export);
            } else {
                extra.push((path.clone(), export));
            }
        }
    }

    let mut exports = Vec::with_capacity(extra.len() + 1);
    exports.push((".".to_string(), root));
    exports.extend(extra);

    errors.extend(validate_extensions(
        &exports,
        manifest.package_type(),
        ext_map,
    ));

    if errors.is_empty() {
        Ok(exports)
    } else {
        Err(ManifestError::InvalidExports(errors))
    }
}

fn export_from_fields(path: &str, fields: &Map<String, Value>) -> Result<Export, String> {
    let get = |key: &str| -> Result<Option<String>, String> {
        match fields.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(format!(
                "package.json: `exports[\"{}\"].{}` must be a string",
                path, key
            )),
        }
    };

    Ok(Export {
        types: get("types")?,
        source: get("source")?,
        require: get("require")?,
        import: get("import")?,
        default: get("default")?,
    })
}

fn check_root_field(
    errors: &mut Vec<String>,
    top_level: &str,
    export_key: &str,
    declared: &Option<String>,
    exported: &Option<String>,
) {
    if let (Some(a), Some(b)) = (declared, exported) {
        if a != b {
            errors.push(format!(
                "package.json: mismatch between '{}' and 'exports.{}'. These must be equal.",
                top_level, export_key
            ));
        }
    }
}

fn validate_extensions(
    exports: &[(String, Export)],
    ty: PackageType,
    ext_map: &ExtensionMap,
) -> Vec<String> {
    let ext = ext_map.for_type(ty);
    let mut errors = Vec::new();

    for (path, export) in exports {
        if let Some(require) = &export.require {
            if !require.ends_with(&ext.cjs) {
                errors.push(format!(
                    "package.json with `type: \"{}\"` - `exports[\"{}\"].require` must end with \"{}\"",
                    ty, path, ext.cjs
                ));
            }
        }
        if let Some(import) = &export.import {
            if !import.ends_with(&ext.es) {
                errors.push(format!(
                    "package.json with `type: \"{}\"` - `exports[\"{}\"].import` must end with \"{}\"",
                    ty, path, ext.es
                ));
            }
        }
    }

    errors
}
