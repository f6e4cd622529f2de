//! Manifest synthesis for merged trees.

use crate::types::MergedTree;
use serde_json::{Map, Value, json};

/// Name written into synthesized manifests.
pub const MANIFEST_NAME: &str = "merged-dependencies";

/// Builds a `package.json` for the project the merged tree belongs to.
///
/// Every requested name is listed once, pinned to the version that ended at
/// the top level. Requests are taken in input order; a name requested twice
/// keeps its first position.
///
/// # Examples
///
/// ```
/// use deps_npm::{ResolutionResult, merge_dependencies, synthesize_manifest};
///
/// let react = ResolutionResult::new("react", "^17.0.0")
///     .with_file("/node_modules/react/package.json", r#"{"version":"17.0.2"}"#);
/// let tree = merge_dependencies(&[react]).unwrap();
///
/// let manifest = synthesize_manifest(&tree);
/// assert_eq!(manifest["dependencies"]["react"], "17.0.2");
/// ```
pub fn synthesize_manifest(tree: &MergedTree) -> Value {
    let mut dependencies = Map::new();

    for requested in &tree.dependencies {
        if dependencies.contains_key(&requested.name) {
            continue;
        }
        let version = tree
            .resolution(&requested.name)
            .unwrap_or(&requested.version);
        dependencies.insert(requested.name.clone(), Value::String(version.to_string()));
    }

    json!({
        "name": MANIFEST_NAME,
        "private": true,
        "dependencies": dependencies,
    })
}
