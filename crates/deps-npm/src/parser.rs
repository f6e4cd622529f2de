//! package.json descriptor parser.
//!
//! Extracts the identity (`name`, `version`) and the declared dependencies of
//! a package root. The merge engine uses the identity to build package nodes
//! and the dependencies to discover which package requires which version.

use deps_core::{DepsError, Result};
use serde_json::Value;

/// Section in package.json where a dependency is declared.
///
/// npm supports multiple dependency sections:
/// - `dependencies`: Production dependencies
/// - `devDependencies`: Development-only dependencies
/// - `peerDependencies`: Peer dependency requirements
/// - `optionalDependencies`: Optional dependencies (install failures ignored)
///
/// # Examples
///
/// ```
/// use deps_npm::parser::NpmDependencySection;
///
/// assert!(NpmDependencySection::Dependencies.is_installed());
/// assert!(!NpmDependencySection::DevDependencies.is_installed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpmDependencySection {
    /// Production dependencies (`dependencies`)
    Dependencies,
    /// Development dependencies (`devDependencies`)
    DevDependencies,
    /// Peer dependencies (`peerDependencies`)
    PeerDependencies,
    /// Optional dependencies (`optionalDependencies`)
    OptionalDependencies,
}

impl NpmDependencySection {
    /// Sections in precedence order: a name declared in several sections
    /// takes its range from the first one listed here.
    pub const ALL: [Self; 4] = [
        Self::Dependencies,
        Self::OptionalDependencies,
        Self::PeerDependencies,
        Self::DevDependencies,
    ];

    /// JSON key of the section.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::OptionalDependencies => "optionalDependencies",
        }
    }

    /// Whether an installed package actually resolves dependencies from this
    /// section at runtime. Dev dependencies never ship with a package.
    pub const fn is_installed(self) -> bool {
        !matches!(self, Self::DevDependencies)
    }
}

/// Dependency declared in a package.json.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmDependency {
    pub name: String,
    pub version_req: Option<String>,
    pub section: NpmDependencySection,
}

/// Parsed package.json of a package root.
#[derive(Debug, Clone, Default)]
pub struct PackageDescriptor {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: Vec<NpmDependency>,
}

impl PackageDescriptor {
    /// Dependencies that matter for an installed copy, first section wins
    /// when a name repeats.
    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &NpmDependency> {
        let mut seen = std::collections::HashSet::new();
        self.dependencies
            .iter()
            .filter(|dep| dep.section.is_installed())
            .filter(move |dep| seen.insert(dep.name.as_str()))
    }
}

/// Parses a package.json file into its descriptor.
///
/// # Errors
///
/// Returns an error if:
/// - JSON parsing fails
/// - The document is not a JSON object
///
/// # Examples
///
/// ```
/// use deps_npm::parser::parse_package_json;
///
/// let json = r#"{
///   "name": "react-dom",
///   "version": "17.0.2",
///   "dependencies": {
///     "scheduler": "^0.20.2"
///   }
/// }"#;
///
/// let descriptor = parse_package_json(json).unwrap();
/// assert_eq!(descriptor.version.as_deref(), Some("17.0.2"));
/// assert_eq!(descriptor.dependencies[0].name, "scheduler");
/// ```
pub fn parse_package_json(content: &str) -> Result<PackageDescriptor> {
    let root: Value = serde_json::from_str(content).map_err(|e| DepsError::ParseError {
        file_type: "package.json".into(),
        source: Box::new(e),
    })?;

    let Some(object) = root.as_object() else {
        return Err(DepsError::ParseError {
            file_type: "package.json".into(),
            source: Box::new(std::io::Error::other("expected a JSON object")),
        });
    };

    let mut dependencies = Vec::new();
    for section in NpmDependencySection::ALL {
        if let Some(deps) = object.get(section.key()).and_then(Value::as_object) {
            dependencies.extend(parse_dependency_section(deps, section));
        }
    }

    Ok(PackageDescriptor {
        name: object.get("name").and_then(Value::as_str).map(String::from),
        version: object
            .get("version")
            .and_then(Value::as_str)
            .map(String::from),
        dependencies,
    })
}

fn parse_dependency_section(
    deps: &serde_json::Map<String, Value>,
    section: NpmDependencySection,
) -> impl Iterator<Item = NpmDependency> + '_ {
    deps.iter().map(move |(name, value)| NpmDependency {
        name: name.clone(),
        version_req: value.as_str().map(String::from),
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity() {
        let json = r#"{
  "name": "util-deprecate",
  "version": "1.0.2",
  "browser": "browser.js"
}"#;

        let descriptor = parse_package_json(json).unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("util-deprecate"));
        assert_eq!(descriptor.version.as_deref(), Some("1.0.2"));
        assert!(descriptor.dependencies.is_empty());
    }

    #[test]
    fn test_parse_simple_dependencies() {
        let json = r#"{
  "dependencies": {
    "core-util-is": "~1.0.0",
    "inherits": "~2.0.3"
  }
}"#;

        let descriptor = parse_package_json(json).unwrap();
        assert_eq!(descriptor.dependencies.len(), 2);

        let core = &descriptor.dependencies[0];
        assert_eq!(core.name, "core-util-is");
        assert_eq!(core.version_req, Some("~1.0.0".into()));
        assert_eq!(core.section, NpmDependencySection::Dependencies);
    }

    #[test]
    fn test_parse_all_sections() {
        let json = r#"{
  "dependencies": { "a": "^1.0.0" },
  "devDependencies": { "b": "^2.0.0" },
  "peerDependencies": { "c": "^3.0.0" },
  "optionalDependencies": { "d": "^4.0.0" }
}"#;

        let descriptor = parse_package_json(json).unwrap();
        assert_eq!(descriptor.dependencies.len(), 4);

        let runtime: Vec<&str> = descriptor
            .runtime_dependencies()
            .map(|dep| dep.name.as_str())
            .collect();
        assert_eq!(runtime, vec!["a", "d", "c"]);
    }

    #[test]
    fn test_runtime_dependencies_first_section_wins() {
        let json = r#"{
  "dependencies": { "react": "^17.0.0" },
  "peerDependencies": { "react": "^16.8.0 || ^17.0.0" }
}"#;

        let descriptor = parse_package_json(json).unwrap();
        let runtime: Vec<&NpmDependency> = descriptor.runtime_dependencies().collect();
        assert_eq!(runtime.len(), 1);
        assert_eq!(runtime[0].version_req.as_deref(), Some("^17.0.0"));
    }

    #[test]
    fn test_non_string_version_req() {
        let json = r#"{ "dependencies": { "weird": { "version": "1.0.0" } } }"#;
        let descriptor = parse_package_json(json).unwrap();
        assert_eq!(descriptor.dependencies[0].version_req, None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_package_json("{ invalid json }");
        assert!(matches!(result, Err(DepsError::ParseError { .. })));
    }

    #[test]
    fn test_parse_non_object() {
        let result = parse_package_json("[1, 2, 3]");
        assert!(result.is_err());
    }

    #[test]
    fn test_dependency_with_git_url() {
        let json = r#"{
  "dependencies": {
    "my-lib": "git+https://github.com/user/repo.git"
  }
}"#;

        let descriptor = parse_package_json(json).unwrap();
        assert_eq!(
            descriptor.dependencies[0].version_req,
            Some("git+https://github.com/user/repo.git".into())
        );
    }
}
