use crate::error::Result;
use async_trait::async_trait;

/// Producer of per-package resolution results.
///
/// Implementors turn a `(name, version)` pair into one fully resolved
/// dependency subtree. The merge engine never calls a source itself: callers
/// gather every result first and hand the materialized values to the merge,
/// which keeps the merge a pure function of its arguments.
///
/// # Examples
///
/// ```no_run
/// use deps_core::ResolutionSource;
/// use async_trait::async_trait;
///
/// # #[derive(Clone)]
/// # struct Document { name: String }
/// struct StaticSource;
///
/// #[async_trait]
/// impl ResolutionSource for StaticSource {
///     type Resolution = Document;
///
///     async fn fetch(&self, name: &str, _version: &str) -> deps_core::Result<Document> {
///         Ok(Document { name: name.into() })
///     }
/// }
/// ```
#[async_trait]
pub trait ResolutionSource: Send + Sync {
    /// Resolution document produced by this source.
    type Resolution: Send;

    /// Retrieves the resolution result for `name` at `version`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The package/version pair is unknown (`DepsError::NotFound`)
    /// - The transport or storage fails
    /// - The document cannot be deserialized
    async fn fetch(&self, name: &str, version: &str) -> Result<Self::Resolution>;

    /// Short label used in logs.
    fn label(&self) -> &'static str {
        "source"
    }
}
