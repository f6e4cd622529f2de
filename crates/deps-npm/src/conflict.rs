//! Conflict resolution and nesting plan.
//!
//! Every package name gets exactly one promoted version at
//! `/node_modules/<name>`. Other versions are nested below the packages that
//! require them, so Node's outward `node_modules` walk from each dependent
//! still lands on the version it was resolved against.

use crate::ingest::{NodeId, PackageGraph};
use crate::path::{
    NODE_MODULES, is_within, lookup_candidates, nested_root, nesting_depth, top_level_root,
};
use deps_core::{NpmMatcher, VersionRequirementMatcher};
use std::collections::{BTreeMap, VecDeque};

/// All nodes sharing one package name, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGroup<'a> {
    pub name: &'a str,
    pub members: Vec<NodeId>,
}

impl ConflictGroup<'_> {
    /// A group with a single version is not a conflict.
    pub fn is_conflict(&self) -> bool {
        self.members.len() > 1
    }
}

/// Why a node was promoted to the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionReason {
    /// Only version of its name.
    Sole,
    /// Requested by the caller; `input` is the earliest request.
    DirectRequest { input: usize },
    /// Satisfied the most dependents' ranges (ties: highest version).
    MostSatisfied { satisfied: usize },
}

/// Outcome for one package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub name: String,
    pub promoted: NodeId,
    pub reason: PromotionReason,
    pub nested: Vec<NodeId>,
}

/// Partitions the graph by package name, sorted by name.
pub fn conflict_groups(graph: &PackageGraph) -> Vec<ConflictGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for (id, node) in graph.nodes().iter().enumerate() {
        groups.entry(node.id.name.as_str()).or_default().push(id);
    }

    groups
        .into_iter()
        .map(|(name, members)| ConflictGroup { name, members })
        .collect()
}

/// Picks the promoted version of every package name.
///
/// Priority: a directly requested version beats any transitive one; among
/// direct requests the earliest input wins; among transitive versions the
/// one satisfying the most dependents' declared ranges wins, then the
/// highest version.
pub fn resolve_conflicts(graph: &PackageGraph) -> Vec<Decision> {
    resolve_conflicts_with(graph, &NpmMatcher)
}

/// [`resolve_conflicts`] with a custom range matcher.
pub fn resolve_conflicts_with<M: VersionRequirementMatcher>(
    graph: &PackageGraph,
    matcher: &M,
) -> Vec<Decision> {
    conflict_groups(graph)
        .iter()
        .map(|group| decide(graph, group, matcher))
        .collect()
}

fn decide<M: VersionRequirementMatcher>(
    graph: &PackageGraph,
    group: &ConflictGroup<'_>,
    matcher: &M,
) -> Decision {
    let direct = group
        .members
        .iter()
        .filter_map(|&node| graph.node(node).direct_request.map(|input| (input, node)))
        .min();

    let (promoted, reason) = if !group.is_conflict() {
        (group.members[0], PromotionReason::Sole)
    } else if let Some((input, node)) = direct {
        (node, PromotionReason::DirectRequest { input })
    } else {
        let ranges: Vec<&str> = graph
            .dependents(group.name)
            .filter_map(|(_, req)| req.range.as_deref())
            .collect();

        let scored = group.members.iter().map(|&node| {
            let version = &graph.node(node).id.version;
            let satisfied = ranges
                .iter()
                .filter(|range| matcher.satisfies(range, version))
                .count();
            (node, satisfied)
        });

        let (node, satisfied) = scored
            .max_by(|(a, a_score), (b, b_score)| {
                a_score
                    .cmp(b_score)
                    .then_with(|| graph.node(*a).version.cmp(&graph.node(*b).version))
            })
            .unwrap_or((group.members[0], 0));
        (node, PromotionReason::MostSatisfied { satisfied })
    };

    let nested: Vec<NodeId> = group
        .members
        .iter()
        .copied()
        .filter(|&node| node != promoted)
        .collect();

    if group.is_conflict() {
        tracing::debug!(
            "{}: promoted {} ({:?}), nesting {} other version(s)",
            group.name,
            graph.node(promoted).id.version,
            reason,
            nested.len()
        );
    }

    Decision {
        name: group.name.to_string(),
        promoted,
        reason,
        nested,
    }
}

/// Explicit relation from package root to the node installed there.
///
/// Top-level entries are `/node_modules/<name>`; nested entries are
/// `<dependent root>/node_modules/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestingPlan {
    placements: BTreeMap<String, NodeId>,
}

impl NestingPlan {
    pub fn placements(&self) -> &BTreeMap<String, NodeId> {
        &self.placements
    }

    pub fn node_at(&self, root: &str) -> Option<NodeId> {
        self.placements.get(root).copied()
    }

    /// Node that Node's lookup for `name` reaches from the package at `from_root`.
    pub fn resolve(&self, from_root: &str, name: &str) -> Option<NodeId> {
        lookup_candidates(from_root, name)
            .iter()
            .find_map(|candidate| self.node_at(candidate))
    }

    /// Nested entries as `(dependent root, required name, node)`.
    pub fn nested(&self) -> impl Iterator<Item = (&str, &str, NodeId)> + '_ {
        let marker = format!("/{NODE_MODULES}/");
        self.placements.iter().filter_map(move |(root, &node)| {
            let split = root.rfind(&marker).filter(|&idx| idx > 0)?;
            Some((&root[..split], &root[split + marker.len()..], node))
        })
    }

    /// Every root `node` is installed at.
    pub fn roots_of(&self, node: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.placements
            .iter()
            .filter(move |(_, placed)| **placed == node)
            .map(|(root, _)| root.as_str())
    }
}

/// Computes where every node is installed.
///
/// Promoted nodes go to the top level. Then, breadth-first from those
/// placements, every dependency whose lookup would reach the wrong version
/// gets its required version nested below the dependent. Nodes no placed
/// package requires are attached below their anchor afterwards.
pub fn plan_layout(graph: &PackageGraph, decisions: &[Decision]) -> NestingPlan {
    let mut planner = Planner::new(graph);

    for decision in decisions {
        planner.place(top_level_root(&decision.name), decision.promoted);
    }
    planner.drain();
    planner.attach_unplaced();

    planner.plan
}

struct Planner<'a> {
    graph: &'a PackageGraph,
    plan: NestingPlan,
    first_root: Vec<Option<String>>,
    queue: VecDeque<(String, NodeId)>,
    max_depth: usize,
}

impl<'a> Planner<'a> {
    fn new(graph: &'a PackageGraph) -> Self {
        Self {
            graph,
            plan: NestingPlan::default(),
            first_root: vec![None; graph.len()],
            queue: VecDeque::new(),
            max_depth: graph.len() + 1,
        }
    }

    fn place(&mut self, root: String, node: NodeId) {
        if self.first_root[node].is_none() {
            self.first_root[node] = Some(root.clone());
        }
        self.plan.placements.insert(root.clone(), node);
        self.queue.push_back((root, node));
    }

    fn drain(&mut self) {
        let graph = self.graph;
        while let Some((root, node)) = self.queue.pop_front() {
            for (name, req) in graph.edges(node) {
                if self.plan.resolve(&root, name) == Some(req.target) {
                    continue;
                }

                let slot = nested_root(&root, name);
                if nesting_depth(&slot) > self.max_depth {
                    tracing::warn!(
                        "not nesting {} below {}: depth limit {} reached",
                        graph.node(req.target).id,
                        root,
                        self.max_depth
                    );
                    continue;
                }

                match self.plan.node_at(&slot) {
                    None => {
                        tracing::trace!("nesting {} at {}", graph.node(req.target).id, slot);
                        self.place(slot, req.target);
                    }
                    Some(other) => {
                        tracing::warn!(
                            "{} is taken by {}, {} cannot see {}",
                            slot,
                            graph.node(other).id,
                            graph.node(node).id,
                            graph.node(req.target).id
                        );
                    }
                }
            }
        }
    }

    fn attach_unplaced(&mut self) {
        loop {
            let unplaced: Vec<NodeId> = (0..self.graph.len())
                .filter(|&node| self.first_root[node].is_none())
                .collect();
            let Some(&first) = unplaced.first() else {
                break;
            };

            let mut progressed = false;
            for node in unplaced {
                if self.first_root[node].is_some() {
                    continue;
                }
                let parent = self
                    .graph
                    .node(node)
                    .anchor
                    .and_then(|anchor| self.first_root[anchor].clone());
                let Some(parent) = parent else {
                    continue;
                };

                let slot = self.orphan_slot(&parent, node);
                tracing::debug!(
                    "{} is required by no placed package, attaching at {}",
                    self.graph.node(node).id,
                    slot
                );
                self.place(slot, node);
                self.drain();
                progressed = true;
            }

            if !progressed {
                let namesake = top_level_root(&self.graph.node(first).id.name);
                let slot = self.orphan_slot(&namesake, first);
                tracing::debug!(
                    "{} has no placed anchor, attaching at {}",
                    self.graph.node(first).id,
                    slot
                );
                self.place(slot, first);
                self.drain();
            }
        }
    }

    /// Free slot for an unrequired node, preferring one that changes no
    /// existing lookup.
    fn orphan_slot(&self, preferred: &str, node: NodeId) -> String {
        let name = self.graph.node(node).id.name.as_str();
        let namesake = top_level_root(name);

        for parent in [preferred, namesake.as_str()] {
            let slot = self.free_slot(parent, name);
            if !self.shadows(&slot, name) {
                return slot;
            }
        }

        let slot = self.free_slot(&namesake, name);
        tracing::warn!(
            "{} at {} may shadow lookups of {}",
            self.graph.node(node).id,
            slot,
            name
        );
        slot
    }

    fn free_slot(&self, parent: &str, name: &str) -> String {
        let mut slot = nested_root(parent, name);
        while self.plan.node_at(&slot).is_some() {
            slot = nested_root(&slot, name);
        }
        slot
    }

    /// Whether installing `name` at `slot` could change what an already
    /// placed package resolves `name` to.
    fn shadows(&self, slot: &str, name: &str) -> bool {
        let Some(parent) = slot.strip_suffix(&format!("/{NODE_MODULES}/{name}")) else {
            return false;
        };

        self.plan
            .placements
            .iter()
            .any(|(root, &node)| is_within(root, parent) && self.graph.edges(node).contains_key(name))
    }
}
