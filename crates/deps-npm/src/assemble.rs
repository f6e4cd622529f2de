//! Tree assembly.
//!
//! Writes every node's files below each root the nesting plan assigned to
//! it. The plan is the only input deciding paths; this module only copies
//! and guards against two packages claiming one path.

use crate::conflict::{Decision, NestingPlan};
use crate::ingest::{NodeId, PackageGraph};
use crate::path::join;
use crate::types::{FileEntry, MergedTree, RequestedDependency};
use deps_core::{DepsError, Result};
use std::collections::{BTreeMap, HashMap};

/// Builds the merged tree from a nesting plan.
///
/// # Errors
///
/// Returns [`DepsError::MergeCollision`] when two different packages would
/// write different content to the same path.
pub fn assemble(
    graph: &PackageGraph,
    decisions: &[Decision],
    plan: &NestingPlan,
    dependencies: Vec<RequestedDependency>,
) -> Result<MergedTree> {
    let mut contents: BTreeMap<String, FileEntry> = BTreeMap::new();
    let mut owners: HashMap<String, NodeId> = HashMap::new();

    for (root, &node) in plan.placements() {
        let package = graph.node(node);

        for (relative, entry) in &package.files {
            let path = join(root, relative);

            match owners.get(&path) {
                None => {
                    owners.insert(path.clone(), node);
                    contents.insert(path, entry.clone());
                }
                Some(&existing) if existing == node => {}
                Some(&existing) => {
                    let written = &contents[&path];
                    if written.content != entry.content {
                        return Err(DepsError::MergeCollision {
                            path,
                            existing: graph.node(existing).id.to_string(),
                            incoming: package.id.to_string(),
                        });
                    }
                    tracing::debug!(
                        "{} and {} both provide identical {}",
                        graph.node(existing).id,
                        package.id,
                        path
                    );
                }
            }
        }
    }

    let resolutions = decisions
        .iter()
        .map(|decision| {
            (
                decision.name.clone(),
                graph.node(decision.promoted).id.version.clone(),
            )
        })
        .collect();

    Ok(MergedTree {
        contents,
        resolutions,
        dependencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{plan_layout, resolve_conflicts};
    use crate::ingest::ingest;
    use crate::types::ResolutionResult;

    #[test]
    fn test_files_written_below_every_placement() {
        let input = ResolutionResult::new("a", "1.0.0")
            .with_file(
                "/node_modules/a/package.json",
                r#"{"name":"a","version":"1.0.0","dependencies":{"b":"^1.0.0"}}"#,
            )
            .with_file("/node_modules/a/index.js", "require('b');")
            .with_file("/node_modules/b/package.json", r#"{"name":"b","version":"1.0.0"}"#)
            .with_file("/node_modules/b/lib/b.js", "module.exports = 'b';");

        let graph = ingest(std::slice::from_ref(&input)).unwrap();
        let decisions = resolve_conflicts(&graph);
        let plan = plan_layout(&graph, &decisions);
        let tree = assemble(&graph, &decisions, &plan, vec![input.dependency.clone()]).unwrap();

        assert_eq!(tree.contents, input.contents);
        assert_eq!(tree.resolution("a"), Some("1.0.0"));
        assert_eq!(tree.resolution("b"), Some("1.0.0"));
        assert_eq!(tree.dependencies, vec![input.dependency]);
    }

    #[test]
    fn test_file_entries_are_copied_with_metadata() {
        let mut input = ResolutionResult::new("a", "1.0.0")
            .with_file("/node_modules/a/package.json", r#"{"version":"1.0.0"}"#)
            .with_file("/node_modules/a/index.js", "x");
        input
            .contents
            .get_mut("/node_modules/a/index.js")
            .unwrap()
            .metadata
            .insert("isModule".into(), serde_json::Value::Bool(true));

        let graph = ingest(std::slice::from_ref(&input)).unwrap();
        let decisions = resolve_conflicts(&graph);
        let plan = plan_layout(&graph, &decisions);
        let tree = assemble(&graph, &decisions, &plan, vec![]).unwrap();

        assert_eq!(
            tree.contents["/node_modules/a/index.js"].metadata["isModule"],
            serde_json::Value::Bool(true)
        );
    }

    /// `a` ships a stray file where a nested `b` ends up later.
    fn stray_file_inputs(from_a: &str, from_b: &str) -> Vec<ResolutionResult> {
        let a_manifest = r#"{"name":"a","version":"1.0.0","dependencies":{"b":"^2.0.0"}}"#;
        let a_alone = ResolutionResult::new("a", "1.0.0")
            .with_file("/node_modules/a/package.json", a_manifest)
            .with_file("/node_modules/a/node_modules/b/x.js", from_a);
        let c = ResolutionResult::new("c", "1.0.0")
            .with_file(
                "/node_modules/c/package.json",
                r#"{"name":"c","version":"1.0.0","dependencies":{"a":"^1.0.0"}}"#,
            )
            .with_file("/node_modules/a/package.json", a_manifest)
            .with_file(
                "/node_modules/a/node_modules/b/package.json",
                r#"{"name":"b","version":"2.0.0"}"#,
            )
            .with_file("/node_modules/a/node_modules/b/x.js", from_b);
        let b = ResolutionResult::new("b", "1.0.0")
            .with_file("/node_modules/b/package.json", r#"{"name":"b","version":"1.0.0"}"#);

        vec![a_alone, c, b]
    }

    fn merge(inputs: &[ResolutionResult]) -> Result<MergedTree> {
        let graph = ingest(inputs).unwrap();
        let decisions = resolve_conflicts(&graph);
        let plan = plan_layout(&graph, &decisions);
        assemble(&graph, &decisions, &plan, vec![])
    }

    #[test]
    fn test_collision_between_different_packages_is_fatal() {
        let err = merge(&stray_file_inputs("from a", "from b")).unwrap_err();

        match err {
            DepsError::MergeCollision {
                path,
                existing,
                incoming,
            } => {
                assert_eq!(path, "/node_modules/a/node_modules/b/x.js");
                assert_eq!(existing, "a@1.0.0");
                assert_eq!(incoming, "b@2.0.0");
            }
            other => panic!("Expected MergeCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_content_from_different_packages_is_kept() {
        let tree = merge(&stray_file_inputs("same", "same")).unwrap();

        assert_eq!(tree.file("/node_modules/a/node_modules/b/x.js"), Some("same"));
        assert!(
            tree.contents
                .contains_key("/node_modules/a/node_modules/b/package.json")
        );
        assert_eq!(tree.resolution("b"), Some("1.0.0"));
    }
}
