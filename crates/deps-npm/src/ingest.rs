//! Resolution result ingestion.
//!
//! Turns every input into package occurrences (one per package root), interns
//! them into [`PackageNode`]s keyed by `(name, version)` and records which
//! node each package actually resolves its dependencies to.

use crate::parser::{PackageDescriptor, parse_package_json};
use crate::path::{
    join, lookup_candidates, manifest_path, package_roots, relative_path, top_level_root,
};
use crate::types::{FileEntry, PackageId, ResolutionResult};
use deps_core::{DepsError, Result, parse_version};
use node_semver::Version;
use std::collections::{BTreeMap, HashMap};

/// Index of a node inside a [`PackageGraph`].
pub type NodeId = usize;

/// A concrete package observed in at least one input.
#[derive(Debug, Clone)]
pub struct PackageNode {
    pub id: PackageId,
    pub version: Version,
    /// Root of the first occurrence, e.g. `/node_modules/a/node_modules/b`.
    pub root_path: String,
    /// Files keyed by path relative to the package root.
    pub files: BTreeMap<String, FileEntry>,
    pub requested_directly: bool,
    /// Earliest input this node was the requested package of.
    pub direct_request: Option<usize>,
    /// Package that structurally held the first occurrence.
    pub anchor: Option<NodeId>,
}

/// `dependent --name--> target` as declared by the dependent's package.json.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub target: NodeId,
    pub range: Option<String>,
}

/// Normalized view of all inputs.
#[derive(Debug, Default)]
pub struct PackageGraph {
    nodes: Vec<PackageNode>,
    index: HashMap<PackageId, NodeId>,
    edges: Vec<BTreeMap<String, Requirement>>,
    requested: Vec<NodeId>,
}

impl PackageGraph {
    pub fn nodes(&self) -> &[PackageNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &PackageNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up the node of a concrete package.
    pub fn find(&self, id: &PackageId) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Dependencies of `node`, keyed by the name they are required under.
    pub fn edges(&self, node: NodeId) -> &BTreeMap<String, Requirement> {
        &self.edges[node]
    }

    /// Requested node of every input, in input order.
    pub fn requested(&self) -> &[NodeId] {
        &self.requested
    }

    /// Every node declaring a dependency on `name`, with its requirement.
    pub fn dependents<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (NodeId, &'a Requirement)> + 'a {
        self.edges
            .iter()
            .enumerate()
            .filter_map(move |(node, edges)| edges.get(name).map(|req| (node, req)))
    }

    /// Adds an occurrence to its `(name, version)` node.
    ///
    /// Files of an existing node are unioned. One file with two different
    /// contents is a [`DepsError::MergeCollision`].
    fn intern(
        &mut self,
        package: &str,
        root: &str,
        occurrence: Occurrence<'_>,
    ) -> Result<(NodeId, bool)> {
        let id = PackageId::new(occurrence.name, occurrence.version.to_string());

        if let Some(&existing) = self.index.get(&id) {
            let node = &mut self.nodes[existing];
            for (relative, entry) in occurrence.files {
                match node.files.get(&relative) {
                    Some(kept) if kept.content != entry.content => {
                        tracing::warn!(
                            "{}: {} differs between inputs ({} disagrees)",
                            node.id,
                            relative,
                            package
                        );
                        return Err(DepsError::MergeCollision {
                            path: join(root, &relative),
                            existing: node.id.to_string(),
                            incoming: format!("{} from {}", node.id, package),
                        });
                    }
                    Some(_) => {}
                    None => {
                        node.files.insert(relative, entry.clone());
                    }
                }
            }
            return Ok((existing, false));
        }

        let files = occurrence
            .files
            .into_iter()
            .map(|(relative, entry)| (relative, entry.clone()))
            .collect();

        let node_id = self.nodes.len();
        self.index.insert(id.clone(), node_id);
        self.nodes.push(PackageNode {
            id,
            version: occurrence.version,
            root_path: root.to_string(),
            files,
            requested_directly: false,
            direct_request: None,
            anchor: None,
        });
        self.edges.push(BTreeMap::new());
        Ok((node_id, true))
    }

    fn add_result(&mut self, input: usize, result: &ResolutionResult) -> Result<()> {
        let package = result.dependency.name.as_str();
        let occurrences = collect_occurrences(result)?;
        let requested_root = top_level_root(package);

        let mut descriptors = Vec::with_capacity(occurrences.len());
        let mut local: BTreeMap<String, NodeId> = BTreeMap::new();
        let mut created = Vec::new();

        for (root, occurrence) in occurrences {
            descriptors.push((root.clone(), occurrence.descriptor.clone()));
            let (node, is_new) = self.intern(package, &root, occurrence)?;
            if is_new {
                created.push((root.clone(), node));
            }
            local.insert(root, node);
        }

        let Some(&requested) = local.get(&requested_root) else {
            return Err(DepsError::malformed(
                package,
                format!("requested package not found at {requested_root}"),
            ));
        };

        let node = &mut self.nodes[requested];
        node.requested_directly = true;
        if node.direct_request.is_none() {
            node.direct_request = Some(input);
        }
        self.requested.push(requested);

        for (root, node) in created {
            let enclosing = package_roots(&root)
                .into_iter()
                .rev()
                .find_map(|candidate| local.get(&candidate.root).copied());
            let anchor = enclosing.or(Some(requested)).filter(|&anchor| anchor != node);
            self.nodes[node].anchor = anchor;
        }

        for (root, descriptor) in &descriptors {
            let dependent = local[root];
            for dep in descriptor.runtime_dependencies() {
                let target = lookup_candidates(root, &dep.name)
                    .iter()
                    .find_map(|candidate| local.get(candidate).copied());

                let Some(target) = target else {
                    tracing::trace!(
                        "{}: dependency {} is not materialized in {}",
                        self.nodes[dependent].id,
                        dep.name,
                        package
                    );
                    continue;
                };

                if target == dependent {
                    continue;
                }

                let edges = &mut self.edges[dependent];
                match edges.get(&dep.name) {
                    Some(existing) if existing.target != target => {
                        tracing::debug!(
                            "{}: keeping {} for {}, {} also resolved it to {}",
                            self.nodes[dependent].id,
                            self.nodes[existing.target].id,
                            dep.name,
                            package,
                            self.nodes[target].id
                        );
                    }
                    Some(_) => {}
                    None => {
                        edges.insert(
                            dep.name.clone(),
                            Requirement {
                                target,
                                range: dep.version_req.clone(),
                            },
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

/// One package root inside a single input.
struct Occurrence<'a> {
    name: String,
    version: Version,
    descriptor: PackageDescriptor,
    files: BTreeMap<String, &'a FileEntry>,
}

/// Builds the package graph of all inputs, in input order.
///
/// # Errors
///
/// Returns [`DepsError::MalformedResolutionResult`] when a path is relative
/// or not normalized, a file has no enclosing package root, a package.json is unreadable or
/// lacks a valid version, or the requested package is missing.
///
/// # Examples
///
/// ```
/// use deps_npm::ingest::ingest;
/// use deps_npm::types::ResolutionResult;
///
/// let result = ResolutionResult::new("left-pad", "1.3.0")
///     .with_file("/node_modules/left-pad/package.json", r#"{"version":"1.3.0"}"#)
///     .with_file("/node_modules/left-pad/index.js", "module.exports = leftPad;");
///
/// let graph = ingest(&[result]).unwrap();
/// assert_eq!(graph.len(), 1);
/// assert!(graph.node(0).requested_directly);
/// assert_eq!(graph.node(0).files.len(), 2);
/// ```
pub fn ingest(results: &[ResolutionResult]) -> Result<PackageGraph> {
    let mut graph = PackageGraph::default();

    for (input, result) in results.iter().enumerate() {
        graph.add_result(input, result)?;
        tracing::trace!(
            "ingested {}@{} ({} nodes so far)",
            result.dependency.name,
            result.dependency.version,
            graph.len()
        );
    }

    Ok(graph)
}

fn collect_occurrences(result: &ResolutionResult) -> Result<BTreeMap<String, Occurrence<'_>>> {
    let package = result.dependency.name.as_str();
    if package.is_empty() {
        return Err(DepsError::malformed(package, "requested package has no name"));
    }

    let requested_root = top_level_root(package);
    let mut grouped: BTreeMap<String, (String, BTreeMap<String, &FileEntry>)> = BTreeMap::new();

    for (path, entry) in &result.contents {
        if !path.starts_with('/') {
            return Err(DepsError::malformed(
                package,
                format!("path `{path}` is not absolute"),
            ));
        }
        if path[1..]
            .split('/')
            .any(|segment| matches!(segment, "" | "." | ".."))
        {
            return Err(DepsError::malformed(
                package,
                format!("path `{path}` has an empty, `.` or `..` segment"),
            ));
        }

        let Some(owner) = package_roots(path)
            .into_iter()
            .rev()
            .find(|root| result.contents.contains_key(&manifest_path(&root.root)))
        else {
            return Err(DepsError::malformed(
                package,
                format!("no package root for `{path}`"),
            ));
        };

        let Some(relative) = relative_path(path, &owner.root) else {
            return Err(DepsError::malformed(
                package,
                format!("path `{path}` is not normalized"),
            ));
        };

        grouped
            .entry(owner.root)
            .or_insert_with(|| (owner.name, BTreeMap::new()))
            .1
            .insert(relative.to_string(), entry);
    }

    let mut occurrences = BTreeMap::new();

    for (root, (name, files)) in grouped {
        let manifest = &result.contents[&manifest_path(&root)];
        let descriptor = parse_package_json(&manifest.content).map_err(|e| {
            DepsError::malformed(package, format!("invalid package.json at {root}: {e}"))
        })?;

        let fallback = if root == requested_root {
            result.resolved_version.as_deref()
        } else {
            None
        };
        let Some(raw_version) = descriptor.version.as_deref().or(fallback) else {
            return Err(DepsError::malformed(
                package,
                format!("{root}/package.json has no version"),
            ));
        };
        let Some(version) = parse_version(raw_version) else {
            return Err(DepsError::malformed(
                package,
                format!("`{raw_version}` in {root}/package.json is not a valid version"),
            ));
        };

        if let Some(declared) = descriptor.name.as_deref()
            && declared != name
        {
            tracing::debug!("{} is installed as {} (alias)", declared, name);
        }

        if root == requested_root
            && let Some(declared) = result.resolved_version.as_deref()
        {
            match parse_version(declared) {
                None => {
                    return Err(DepsError::malformed(
                        package,
                        format!("declared resolved version `{declared}` is not a valid version"),
                    ));
                }
                Some(declared) if declared != version => {
                    return Err(DepsError::malformed(
                        package,
                        format!("declared resolved version {declared} does not match package.json version {version}"),
                    ));
                }
                Some(_) => {}
            }
        }

        occurrences.insert(
            root,
            Occurrence {
                name,
                version,
                descriptor,
                files,
            },
        );
    }

    Ok(occurrences)
}
