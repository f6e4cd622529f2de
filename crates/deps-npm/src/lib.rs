//! npm dependency merging for deps-merge.
//!
//! Combines independently resolved package trees into a single
//! `node_modules` tree: one version of every package at the top level, other
//! versions nested below the packages that need them.

pub mod assemble;
pub mod conflict;
pub mod formatter;
pub mod ingest;
mod merge;
pub mod parser;
pub mod path;
pub mod registry;
pub mod types;

pub use conflict::{Decision, NestingPlan, PromotionReason, plan_layout, resolve_conflicts};
pub use formatter::synthesize_manifest;
pub use ingest::{PackageGraph, ingest};
pub use merge::merge_dependencies;
pub use parser::{NpmDependency, NpmDependencySection, PackageDescriptor, parse_package_json};
pub use registry::{DEFAULT_PACKAGER_URL, PackagerRegistry};
pub use types::{FileEntry, MergedTree, PackageId, RequestedDependency, ResolutionResult};
