//! Packager client.
//!
//! Produces [`ResolutionResult`]s for a `(name, version)` pair. Only callers
//! of the merge use it, never the merge itself.

use crate::types::ResolutionResult;
use deps_core::{DepsError, HttpClient, ResolutionSource, Result};
use serde_json::Value;

/// Base URL of the public packager service.
pub const DEFAULT_PACKAGER_URL: &str = "https://prod-packager-packages.codesandbox.io";

/// Client of the packager's `v2/packages` endpoint.
#[derive(Clone, Debug)]
pub struct PackagerRegistry {
    http: HttpClient,
    base_url: String,
}

impl PackagerRegistry {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, DEFAULT_PACKAGER_URL)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// URL of the resolution document of `name@version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use deps_core::HttpClient;
    /// use deps_npm::PackagerRegistry;
    ///
    /// let registry = PackagerRegistry::with_base_url(HttpClient::new().unwrap(), "http://localhost/");
    /// assert_eq!(
    ///     registry.resolution_url("@dnd-kit/core", "3.0.1"),
    ///     "http://localhost/v2/packages/@dnd-kit/core/3.0.1.json"
    /// );
    /// ```
    pub fn resolution_url(&self, name: &str, version: &str) -> String {
        format!("{}/v2/packages/{name}/{version}.json", self.base_url)
    }

    /// Fetches the raw resolution document, keeping every key the packager
    /// sent.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::NotFound`] when the packager answers 404.
    pub async fn get_document(&self, name: &str, version: &str) -> Result<Value> {
        let url = self.resolution_url(name, version);
        self.http
            .get_json::<Value>(&url)
            .await?
            .ok_or_else(|| DepsError::not_found(name, version))
    }

    /// Fetches and decodes the resolution of `name@version`.
    pub async fn get_resolution(&self, name: &str, version: &str) -> Result<ResolutionResult> {
        let document = self.get_document(name, version).await?;
        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait::async_trait]
impl ResolutionSource for PackagerRegistry {
    type Resolution = ResolutionResult;

    async fn fetch(&self, name: &str, version: &str) -> Result<ResolutionResult> {
        self.get_resolution(name, version).await
    }

    fn label(&self) -> &'static str {
        "packager"
    }
}
