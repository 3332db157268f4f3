//! Runtime and module-format definitions.
//!
//! A [`Runtime`] selects which compiler target list applies to a bundle,
//! and a [`Format`] selects the module system a bundle is emitted in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Execution environment a bundle is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Runtime {
    /// Node.js only
    #[serde(rename = "node")]
    Node,
    /// Browsers only
    #[serde(rename = "web")]
    Web,
    /// Both node and browsers
    #[default]
    #[serde(rename = "*")]
    Universal,
}

impl Runtime {
    /// Classify an export subpath by naming convention.
    ///
    /// Admin entry points run in the browser, server entry points in node,
    /// everything else in both.
    pub fn for_export_path(export_path: &str) -> Self {
        if export_path.contains("strapi-admin") {
            Runtime::Web
        } else if export_path.contains("strapi-server") {
            Runtime::Node
        } else {
            Runtime::Universal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Node => "node",
            Runtime::Web => "web",
            Runtime::Universal => "*",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Runtime::Node),
            "web" => Ok(Runtime::Web),
            "*" | "universal" => Ok(Runtime::Universal),
            _ => Err(format!(
                "invalid runtime '{}'; expected 'node', 'web', or '*'",
                s
            )),
        }
    }
}

/// Module format of an emitted bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// CommonJS (`require`)
    Cjs,
    /// ES modules (`import`)
    Es,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cjs => "cjs",
            Format::Es => "es",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved compiler target lists, one per runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    #[serde(rename = "*")]
    pub universal: Vec<String>,
    pub node: Vec<String>,
    pub web: Vec<String>,
}

impl Targets {
    /// Get the target list for a runtime.
    pub fn for_runtime(&self, runtime: Runtime) -> &[String] {
        match runtime {
            Runtime::Node => &self.node,
            Runtime::Web => &self.web,
            Runtime::Universal => &self.universal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_for_export_path() {
        assert_eq!(Runtime::for_export_path("./strapi-admin"), Runtime::Web);
        assert_eq!(Runtime::for_export_path("./strapi-server"), Runtime::Node);
        assert_eq!(Runtime::for_export_path("./dist/strapi-admin/x"), Runtime::Web);
        assert_eq!(Runtime::for_export_path("."), Runtime::Universal);
        assert_eq!(Runtime::for_export_path("./server"), Runtime::Universal);
    }

    #[test]
    fn test_runtime_parse() {
        assert_eq!("node".parse::<Runtime>().unwrap(), Runtime::Node);
        assert_eq!("web".parse::<Runtime>().unwrap(), Runtime::Web);
        assert_eq!("*".parse::<Runtime>().unwrap(), Runtime::Universal);
        assert!("deno".parse::<Runtime>().is_err());
    }

    #[test]
    fn test_targets_serialize_universal_key() {
        let targets = Targets {
            universal: vec!["chrome100".to_string()],
            node: vec!["node16.0.0".to_string()],
            web: vec!["esnext".to_string()],
        };

        let json = serde_json::to_string(&targets).unwrap();
        assert!(json.contains("\"*\":[\"chrome100\"]"));
        assert_eq!(targets.for_runtime(Runtime::Web), ["esnext".to_string()]);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(Format::Cjs.to_string(), "cjs");
        assert_eq!(Format::Es.to_string(), "es");
    }
}
