//! Configuration for the deps-merge command.
//!
//! Loaded from an optional JSON file; every key is optional and command-line
//! flags take precedence over the file.

use deps_core::{DepsError, Result};
use deps_npm::DEFAULT_PACKAGER_URL;
use serde::Deserialize;
use std::path::Path;

/// Default packager request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings of the packager client.
///
/// # Examples
///
/// ```
/// use deps_merge::config::MergeConfig;
///
/// let config: MergeConfig = serde_json::from_str(r#"{ "timeoutSecs": 5 }"#).unwrap();
/// assert_eq!(config.timeout_secs, 5);
/// assert_eq!(config.packager_url, deps_npm::DEFAULT_PACKAGER_URL);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MergeConfig {
    /// Base URL of the packager service.
    #[serde(default = "default_packager_url")]
    pub packager_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            packager_url: default_packager_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_packager_url() -> String {
    DEFAULT_PACKAGER_URL.to_owned()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl MergeConfig {
    /// Reads the configuration file at `path`, or the defaults when there is
    /// none.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Io`] when the file cannot be read and
    /// [`DepsError::Config`] when it is not a valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| DepsError::Config(format!("{}: {e}", path.display())))?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks that the settings can be used together.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Config`] for an empty packager URL or a zero
    /// timeout.
    pub fn validate(&self) -> Result<()> {
        if self.packager_url.trim().is_empty() {
            return Err(DepsError::Config("packager URL is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(DepsError::Config("timeout must be at least 1 second".into()));
        }
        Ok(())
    }
}
