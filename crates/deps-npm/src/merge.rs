use crate::assemble::assemble;
use crate::conflict::{plan_layout, resolve_conflicts};
use crate::ingest::ingest;
use crate::types::{MergedTree, ResolutionResult};
use deps_core::Result;

/// Merges independently resolved packages into one `node_modules` tree.
///
/// Inputs are taken in order: when two inputs request different versions of
/// the same package, the earlier one ends up at the top level. The result is
/// a pure function of `results`, so the same inputs always give the same
/// tree.
///
/// # Errors
///
/// Returns [`deps_core::DepsError::MalformedResolutionResult`] when an input
/// cannot be read as a package tree and
/// [`deps_core::DepsError::MergeCollision`] when two packages would write the
/// same path. No partial tree is returned.
///
/// # Examples
///
/// ```
/// use deps_npm::{ResolutionResult, merge_dependencies};
///
/// let react = ResolutionResult::new("react", "17.0.2")
///     .with_file("/node_modules/react/package.json", r#"{"name":"react","version":"17.0.2"}"#);
/// let left_pad = ResolutionResult::new("left-pad", "1.3.0")
///     .with_file("/node_modules/left-pad/package.json", r#"{"name":"left-pad","version":"1.3.0"}"#);
///
/// let tree = merge_dependencies(&[react, left_pad]).unwrap();
/// assert_eq!(tree.resolution("react"), Some("17.0.2"));
/// assert!(tree.file("/node_modules/left-pad/package.json").is_some());
/// ```
pub fn merge_dependencies(results: &[ResolutionResult]) -> Result<MergedTree> {
    let graph = ingest(results)?;
    let decisions = resolve_conflicts(&graph);
    let plan = plan_layout(&graph, &decisions);

    let requested = results.iter().map(|r| r.dependency.clone()).collect();
    let tree = assemble(&graph, &decisions, &plan, requested)?;

    tracing::info!(
        "Merged {} inputs: {} packages, {} conflicts, {} nested, {} files",
        results.len(),
        graph.len(),
        decisions.iter().filter(|d| !d.nested.is_empty()).count(),
        plan.nested().count(),
        tree.contents.len()
    );

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_empty_tree() {
        let tree = merge_dependencies(&[]).unwrap();
        assert_eq!(tree, MergedTree::default());
    }

    #[test]
    fn test_malformed_input_aborts_whole_merge() {
        let good = ResolutionResult::new("react", "17.0.2")
            .with_file("/node_modules/react/package.json", r#"{"version":"17.0.2"}"#);
        let bad = ResolutionResult::new("broken", "1.0.0")
            .with_file("/node_modules/broken/package.json", r#"{"version":"one"}"#);

        assert!(merge_dependencies(&[good, bad]).is_err());
    }

    #[test]
    fn test_input_order_decides_direct_conflicts() {
        let v17 = ResolutionResult::new("react", "17.0.2")
            .with_file("/node_modules/react/package.json", r#"{"version":"17.0.2"}"#);
        let v16 = ResolutionResult::new("react", "16.14.0")
            .with_file("/node_modules/react/package.json", r#"{"version":"16.14.0"}"#);

        let forward = merge_dependencies(&[v17.clone(), v16.clone()]).unwrap();
        let backward = merge_dependencies(&[v16, v17]).unwrap();

        assert_eq!(forward.resolution("react"), Some("17.0.2"));
        assert_eq!(backward.resolution("react"), Some("16.14.0"));
    }
}
