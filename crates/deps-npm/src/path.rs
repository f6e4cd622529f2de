//! Segment-aware model of virtual `node_modules` paths.
//!
//! Package roots are found by walking whole path segments: every
//! `node_modules/<name>` (or `node_modules/@scope/<name>`) hop that still has
//! something below it is a candidate root. Comparisons between a path and a
//! root always happen on a `/` boundary, so `/node_modules/util` is never
//! treated as a prefix of `/node_modules/util-deprecate/browser.js`.

/// Directory name that holds installed packages.
pub const NODE_MODULES: &str = "node_modules";

/// Manifest file marking a package root.
pub const MANIFEST: &str = "package.json";

/// A `node_modules/<name>` hop found in a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    /// Absolute root path, e.g. `/node_modules/a/node_modules/@scope/b`.
    pub root: String,
    /// Install name, e.g. `@scope/b`.
    pub name: String,
}

/// Lists the candidate package roots of `path`, outermost first.
///
/// # Examples
///
/// ```
/// use deps_npm::path::package_roots;
///
/// let roots = package_roots("/node_modules/a/node_modules/@scope/b/lib/index.js");
/// assert_eq!(roots.len(), 2);
/// assert_eq!(roots[0].root, "/node_modules/a");
/// assert_eq!(roots[1].name, "@scope/b");
/// ```
pub fn package_roots(path: &str) -> Vec<PackageRoot> {
    let segments = segments(path);
    let mut roots = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        if segments[i] != NODE_MODULES {
            i += 1;
            continue;
        }

        let Some(first) = segments.get(i + 1) else {
            break;
        };

        let (name, end) = if first.starts_with('@') {
            match segments.get(i + 2) {
                Some(second) => (format!("{first}/{second}"), i + 3),
                None => break,
            }
        } else {
            ((*first).to_string(), i + 2)
        };

        // A root must have at least one segment below it
        if end >= segments.len() || !is_package_name(&name) {
            i += 1;
            continue;
        }

        roots.push(PackageRoot {
            root: format!("/{}", segments[..end].join("/")),
            name,
        });
        i = end;
    }

    roots
}

/// Whether `name` can be an installed package name.
///
/// Dot-directories such as `.bin` or `.cache` live in `node_modules` without
/// being packages.
pub fn is_package_name(name: &str) -> bool {
    match name.split_once('/') {
        Some((scope, rest)) => {
            scope.len() > 1
                && scope.starts_with('@')
                && !rest.is_empty()
                && !rest.starts_with('.')
                && !rest.contains('/')
        }
        None => !name.is_empty() && !name.starts_with('.') && !name.starts_with('@'),
    }
}

/// Path of `path` relative to `root`, compared on a segment boundary.
///
/// # Examples
///
/// ```
/// use deps_npm::path::relative_path;
///
/// assert_eq!(
///     relative_path("/node_modules/util/support/isBuffer.js", "/node_modules/util"),
///     Some("support/isBuffer.js")
/// );
/// assert_eq!(
///     relative_path("/node_modules/util-deprecate/browser.js", "/node_modules/util"),
///     None
/// );
/// ```
pub fn relative_path<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    path.strip_prefix(root)?
        .strip_prefix('/')
        .filter(|rest| !rest.is_empty())
}

/// Whether `path` is `parent` or lies below it.
pub fn is_within(path: &str, parent: &str) -> bool {
    path == parent || relative_path(path, parent).is_some()
}

/// Top-level root of a package: `/node_modules/<name>`.
pub fn top_level_root(name: &str) -> String {
    format!("/{NODE_MODULES}/{name}")
}

/// Root of `name` nested below the package at `parent`.
pub fn nested_root(parent: &str, name: &str) -> String {
    format!("{parent}/{NODE_MODULES}/{name}")
}

/// Location of the manifest of the package at `root`.
pub fn manifest_path(root: &str) -> String {
    join(root, MANIFEST)
}

/// Joins a package root and a path relative to it.
pub fn join(root: &str, relative: &str) -> String {
    format!("{root}/{relative}")
}

/// Number of `node_modules` hops in `root`.
pub fn nesting_depth(root: &str) -> usize {
    segments(root)
        .iter()
        .filter(|segment| **segment == NODE_MODULES)
        .count()
}

/// Roots Node's module lookup visits for `name`, starting at the package at
/// `from_root` and walking outwards through every enclosing `node_modules`.
///
/// # Examples
///
/// ```
/// use deps_npm::path::lookup_candidates;
///
/// assert_eq!(
///     lookup_candidates("/node_modules/a/node_modules/b", "c"),
///     vec![
///         "/node_modules/a/node_modules/b/node_modules/c".to_string(),
///         "/node_modules/a/node_modules/c".to_string(),
///         "/node_modules/c".to_string(),
///     ]
/// );
/// ```
pub fn lookup_candidates(from_root: &str, name: &str) -> Vec<String> {
    let segments = segments(from_root);
    let mut candidates = vec![nested_root(from_root, name)];

    for idx in (0..segments.len()).rev() {
        if segments[idx] == NODE_MODULES {
            candidates.push(format!("/{}/{}", segments[..=idx].join("/"), name));
        }
    }

    candidates
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_root() {
        let roots = package_roots("/node_modules/react/index.js");
        assert_eq!(
            roots,
            vec![PackageRoot {
                root: "/node_modules/react".into(),
                name: "react".into(),
            }]
        );
    }

    #[test]
    fn test_scoped_root() {
        let roots = package_roots("/node_modules/@dnd-kit/core/dist/index.js");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].root, "/node_modules/@dnd-kit/core");
        assert_eq!(roots[0].name, "@dnd-kit/core");
    }

    #[test]
    fn test_nested_scoped_root() {
        let roots = package_roots(
            "/node_modules/@dnd-kit/sortable/node_modules/@dnd-kit/core/package.json",
        );
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].name, "@dnd-kit/sortable");
        assert_eq!(
            roots[1].root,
            "/node_modules/@dnd-kit/sortable/node_modules/@dnd-kit/core"
        );
    }

    #[test]
    fn test_prefix_names_are_distinct_roots() {
        let util = package_roots("/node_modules/util/support/isBufferBrowser.js");
        let deprecate = package_roots("/node_modules/util-deprecate/browser.js");

        assert_eq!(util[0].name, "util");
        assert_eq!(deprecate[0].name, "util-deprecate");
        assert_ne!(util[0].root, deprecate[0].root);
    }

    #[test]
    fn test_dot_directories_are_not_packages() {
        assert!(package_roots("/node_modules/.bin/loose-envify").is_empty());
        assert!(!is_package_name(".cache"));
        assert!(!is_package_name("@scope"));
        assert!(is_package_name("@scope/pkg"));
        assert!(is_package_name("util-deprecate"));
    }

    #[test]
    fn test_file_directly_in_node_modules_is_not_a_root() {
        assert!(package_roots("/node_modules/stray.js").is_empty());
        assert!(package_roots("/node_modules/@scope/stray.js").is_empty());
    }

    #[test]
    fn test_relative_path_boundary() {
        assert_eq!(
            relative_path("/node_modules/util/util.js", "/node_modules/util"),
            Some("util.js")
        );
        assert_eq!(
            relative_path("/node_modules/util-deprecate/node.js", "/node_modules/util"),
            None
        );
        assert_eq!(relative_path("/node_modules/util", "/node_modules/util"), None);
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/node_modules/a", "/node_modules/a"));
        assert!(is_within("/node_modules/a/node_modules/b", "/node_modules/a"));
        assert!(!is_within("/node_modules/ab", "/node_modules/a"));
    }

    #[test]
    fn test_root_builders() {
        assert_eq!(top_level_root("@dnd-kit/core"), "/node_modules/@dnd-kit/core");
        assert_eq!(
            nested_root("/node_modules/readable-stream", "isarray"),
            "/node_modules/readable-stream/node_modules/isarray"
        );
        assert_eq!(
            manifest_path("/node_modules/util"),
            "/node_modules/util/package.json"
        );
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("/node_modules/a"), 1);
        assert_eq!(nesting_depth("/node_modules/@s/a/node_modules/b"), 2);
    }

    #[test]
    fn test_lookup_candidates_top_level() {
        assert_eq!(
            lookup_candidates("/node_modules/@dnd-kit/sortable", "@dnd-kit/core"),
            vec![
                "/node_modules/@dnd-kit/sortable/node_modules/@dnd-kit/core".to_string(),
                "/node_modules/@dnd-kit/core".to_string(),
            ]
        );
    }
}
