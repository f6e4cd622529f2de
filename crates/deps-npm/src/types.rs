use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The package a resolution result was requested for.
///
/// `version` is what the caller asked for (exact version or range), not
/// necessarily the version that was resolved.
///
/// # Examples
///
/// ```
/// use deps_npm::types::RequestedDependency;
///
/// let dep = RequestedDependency::new("react", "^17.0.0");
/// assert_eq!(dep.name, "react");
/// assert_eq!(dep.version, "^17.0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedDependency {
    pub name: String,
    pub version: String,
}

impl RequestedDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A single file of a resolved package tree.
///
/// Every key of the wire entry other than `content` (`isModule`, `requires`,
/// ...) is kept in `metadata` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub content: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl FileEntry {
    /// Creates an entry without metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Output of resolving one requested package, as produced by the packager.
///
/// `contents` maps absolute virtual paths (`/node_modules/...`) to files. The
/// requested package lives at `/node_modules/<dependency.name>`; its
/// transitive dependencies are further package roots in the same mapping,
/// either hoisted (`/node_modules/dep`) or nested
/// (`/node_modules/pkg/node_modules/dep`).
///
/// # Examples
///
/// ```
/// use deps_npm::types::ResolutionResult;
///
/// let json = r#"{
///   "dependency": { "name": "left-pad", "version": "^1.3.0" },
///   "contents": {
///     "/node_modules/left-pad/package.json": {
///       "content": "{\"name\":\"left-pad\",\"version\":\"1.3.0\"}"
///     }
///   }
/// }"#;
///
/// let result: ResolutionResult = serde_json::from_str(json).unwrap();
/// assert_eq!(result.dependency.name, "left-pad");
/// assert!(result.resolved_version.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub dependency: RequestedDependency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_version: Option<String>,
    pub contents: BTreeMap<String, FileEntry>,
}

impl ResolutionResult {
    /// Creates an empty result for `name` requested at `version`.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dependency: RequestedDependency::new(name, version),
            resolved_version: None,
            contents: BTreeMap::new(),
        }
    }

    /// Adds a file, replacing any previous entry at `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.contents.insert(path.into(), FileEntry::new(content));
        self
    }

    /// Declares the concrete version the packager resolved.
    #[must_use]
    pub fn with_resolved_version(mut self, version: impl Into<String>) -> Self {
        self.resolved_version = Some(version.into());
        self
    }
}

/// A concrete package: name plus resolved version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// The merged `node_modules` tree.
///
/// `resolutions` records, for every package name, the version that occupies
/// `/node_modules/<name>`. `dependencies` lists the requests in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTree {
    pub contents: BTreeMap<String, FileEntry>,
    pub resolutions: BTreeMap<String, String>,
    pub dependencies: Vec<RequestedDependency>,
}

impl MergedTree {
    /// Content of the file at `path`, if present.
    pub fn file(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(|entry| entry.content.as_str())
    }

    /// Version promoted to the top level for `name`.
    pub fn resolution(&self, name: &str) -> Option<&str> {
        self.resolutions.get(name).map(String::as_str)
    }

    /// Renders the tree as pretty-printed JSON with sorted keys.
    pub fn to_json_pretty(&self) -> deps_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
