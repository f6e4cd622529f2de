//! Error taxonomy shared by every deps-merge crate.

use thiserror::Error;

/// Errors produced while retrieving, ingesting, or merging resolution results.
///
/// The merge engine only ever returns [`DepsError::MalformedResolutionResult`]
/// and [`DepsError::MergeCollision`]; the remaining variants belong to the
/// collaborators around it (HTTP client, configuration).
#[derive(Error, Debug)]
pub enum DepsError {
    /// An input could not be turned into package nodes.
    #[error("Malformed resolution result for '{package}': {reason}")]
    MalformedResolutionResult { package: String, reason: String },

    /// Two different packages would occupy the same output path.
    #[error("Merge collision at '{path}': {existing} and {incoming} provide different content")]
    MergeCollision {
        path: String,
        existing: String,
        incoming: String,
    },

    #[error("Failed to parse {file_type}: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid package spec '{0}', expected <name>@<version>")]
    InvalidPackageSpec(String),

    #[error("Resolution for '{package}@{version}' not found")]
    NotFound { package: String, version: String },

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for deps-merge operations.
pub type Result<T> = std::result::Result<T, DepsError>;

impl DepsError {
    /// Create a malformed-input error for the given package.
    pub fn malformed(package: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResolutionResult {
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error for a `(name, version)` lookup.
    pub fn not_found(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NotFound {
            package: package.into(),
            version: version.into(),
        }
    }

    /// Whether the error means the requested document does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
