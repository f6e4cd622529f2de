//! Packager fixtures shared by the integration tests.
//!
//! Documents live at `<dir>/<name>/<version>.json`. With an upstream
//! registry, misses are fetched once and written back so later runs stay
//! offline.

#![allow(dead_code, unreachable_pub)]

use deps_core::{DepsError, Result};
use deps_npm::{PackagerRegistry, ResolutionResult};
use std::path::PathBuf;

/// The checked-in packager documents.
pub fn packages_cache() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/packages-cache")
}

#[derive(Clone, Debug)]
pub struct FixtureStore {
    dir: PathBuf,
    upstream: Option<PackagerRegistry>,
}

impl FixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            upstream: None,
        }
    }

    #[must_use]
    pub fn with_upstream(mut self, registry: PackagerRegistry) -> Self {
        self.upstream = Some(registry);
        self
    }

    /// Location of the document for `name@version`.
    ///
    /// Versions are a single path component, so `/`, `\`, `.` and `..` are
    /// refused.
    pub fn fixture_path(&self, name: &str, version: &str) -> Result<PathBuf> {
        let version_ok = !version.is_empty()
            && version != "."
            && version != ".."
            && !version.contains(['/', '\\']);
        let name_ok = deps_npm::path::is_package_name(name);

        if !(version_ok && name_ok) {
            return Err(DepsError::InvalidPackageSpec(format!("{name}@{version}")));
        }

        Ok(self.dir.join(name).join(format!("{version}.json")))
    }

    pub async fn get_resolution(&self, name: &str, version: &str) -> Result<ResolutionResult> {
        let path = self.fixture_path(name, version)?;

        match tokio::fs::read(&path).await {
            Ok(data) => return Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let Some(upstream) = &self.upstream else {
            return Err(DepsError::not_found(name, version));
        };

        let document = upstream.get_document(name, version).await?;
        let result: ResolutionResult = serde_json::from_value(document.clone())?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, serde_json::to_vec_pretty(&document)?).await?;

        Ok(result)
    }
}
