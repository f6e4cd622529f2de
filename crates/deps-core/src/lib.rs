//! Core abstractions for deps-merge.
//!
//! Shared by the merge engine and its collaborators:
//! - [`DepsError`] / [`Result`]: the error taxonomy
//! - [`version_matcher`]: npm version parsing and range matching
//! - [`ResolutionSource`]: the interface of anything producing resolution results
//! - [`HttpClient`]: HTTP access for remote sources

pub mod error;
pub mod http;
pub mod registry;
pub mod version_matcher;

pub use error::{DepsError, Result};
pub use http::{HttpClient, HttpStatus};
pub use registry::ResolutionSource;
pub use version_matcher::{NpmMatcher, VersionRequirementMatcher, parse_version};
