//! Version requirement matching abstractions.
//!
//! Provides the npm flavour of version parsing and range matching used by
//! conflict resolution (node-semver semantics: `^`, `~`, `x` ranges, `||`
//! unions, hyphen ranges).

use node_semver::{Range, Version};

/// Generic version requirement matcher.
///
/// Used by conflict resolution to count how many dependents a candidate
/// version would satisfy.
pub trait VersionRequirementMatcher: Send + Sync {
    /// Check if `version` satisfies `requirement`.
    ///
    /// # Examples
    ///
    /// - `"^1.0.0"` with `"1.5.0"` → true
    /// - `"^1.0.0"` with `"2.0.0"` → false (new major version)
    /// - `"~1.0.0"` with `"1.1.0"` → false
    fn satisfies(&self, requirement: &str, version: &str) -> bool;
}

/// node-semver based matcher for npm ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmMatcher;

impl VersionRequirementMatcher for NpmMatcher {
    fn satisfies(&self, requirement: &str, version: &str) -> bool {
        let Some(version) = parse_version(version) else {
            return requirement.trim() == version.trim();
        };

        match Range::parse(requirement.trim()) {
            Ok(range) => range.satisfies(&version),
            // Tags, URLs and aliases carry no range information
            Err(_) => false,
        }
    }
}

/// Parses an npm version string, returning `None` when it is not a version.
///
/// # Examples
///
/// ```
/// # use deps_core::version_matcher::parse_version;
/// assert!(parse_version("17.0.2").is_some());
/// assert!(parse_version("1.0.0-beta.1").is_some());
/// assert!(parse_version("not-a-version").is_none());
/// ```
pub fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version.trim()).ok()
}
