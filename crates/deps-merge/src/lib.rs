//! Command-line front end of deps-merge.
//!
//! Retrieves one resolution result per requested package, concurrently, then
//! hands them to [`deps_npm::merge_dependencies`] in request order and writes
//! the merged tree (or a synthesized package.json) as JSON.

pub mod config;

use clap::Parser;
use config::MergeConfig;
use deps_core::{DepsError, HttpClient, ResolutionSource, Result};
use deps_npm::path::is_package_name;
use deps_npm::{
    MergedTree, PackagerRegistry, RequestedDependency, ResolutionResult, merge_dependencies,
    synthesize_manifest,
};
use std::path::PathBuf;
use std::time::Duration;

/// Merge npm packages resolved by the packager into one node_modules tree
///
/// Packages are merged in the order given: when two of them request
/// different versions of the same package, the earlier one wins the
/// top-level slot.
#[derive(Parser, Debug)]
#[command(name = "deps-merge")]
#[command(version, about)]
pub struct Cli {
    /// Packages to merge, e.g. `react@17.0.2` or `@dnd-kit/core@3.0.1`
    #[arg(required = true, value_name = "PACKAGE@VERSION")]
    pub packages: Vec<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the packager service
    #[arg(long, value_name = "URL")]
    pub packager_url: Option<String>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print a package.json for the merged tree instead of the tree itself
    #[arg(long)]
    pub manifest: bool,
}

impl Cli {
    /// Configuration file settings with this command line's flags applied.
    ///
    /// # Errors
    ///
    /// Propagates [`MergeConfig::load`] and [`MergeConfig::validate`] errors.
    pub fn merge_config(&self) -> Result<MergeConfig> {
        let mut config = MergeConfig::load(self.config.as_deref())?;

        if let Some(url) = &self.packager_url {
            config.packager_url.clone_from(url);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parses `name@version`, including scoped names.
///
/// # Errors
///
/// Returns [`DepsError::InvalidPackageSpec`] when the version is missing or
/// the name is not an installable package name.
///
/// # Examples
///
/// ```
/// use deps_merge::parse_package_spec;
///
/// let dep = parse_package_spec("@dnd-kit/core@3.0.1").unwrap();
/// assert_eq!(dep.name, "@dnd-kit/core");
/// assert_eq!(dep.version, "3.0.1");
///
/// assert!(parse_package_spec("@dnd-kit/core").is_err());
/// ```
pub fn parse_package_spec(spec: &str) -> Result<RequestedDependency> {
    let invalid = || DepsError::InvalidPackageSpec(spec.to_string());

    let (name, version) = spec
        .rfind('@')
        .filter(|&idx| idx > 0)
        .map(|idx| (&spec[..idx], &spec[idx + 1..]))
        .ok_or_else(invalid)?;

    if version.trim().is_empty() || !is_package_name(name) {
        return Err(invalid());
    }

    Ok(RequestedDependency::new(name, version.trim()))
}

/// Builds the packager client described by `config`.
///
/// # Errors
///
/// Returns [`DepsError::Http`] when the HTTP client cannot be created.
pub fn build_source(config: &MergeConfig) -> Result<PackagerRegistry> {
    let http = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    Ok(PackagerRegistry::with_base_url(http, &config.packager_url))
}

/// Retrieves every request concurrently, keeping request order.
///
/// # Errors
///
/// Fails with the first error any retrieval returns.
pub async fn fetch_all<S>(source: &S, requests: &[RequestedDependency]) -> Result<Vec<ResolutionResult>>
where
    S: ResolutionSource<Resolution = ResolutionResult> + ?Sized,
{
    let fetches = requests
        .iter()
        .map(|dep| source.fetch(&dep.name, &dep.version));
    futures::future::try_join_all(fetches).await
}

/// Renders the command's output document.
///
/// # Errors
///
/// Returns [`DepsError::Json`] if serialization fails.
pub fn render(tree: &MergedTree, manifest: bool) -> Result<String> {
    let mut rendered = if manifest {
        serde_json::to_string_pretty(&synthesize_manifest(tree))?
    } else {
        tree.to_json_pretty()?
    };
    rendered.push('\n');
    Ok(rendered)
}

/// Runs the command.
///
/// # Errors
///
/// Returns configuration, retrieval, merge and output errors.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.merge_config()?;
    let requests = cli
        .packages
        .iter()
        .map(|spec| parse_package_spec(spec))
        .collect::<Result<Vec<_>>>()?;

    let source = build_source(&config)?;
    tracing::info!(
        "Fetching {} resolution results from {}",
        requests.len(),
        source.label()
    );

    let results = fetch_all(&source, &requests).await?;
    let tree = merge_dependencies(&results)?;
    let rendered = render(&tree, cli.manifest)?;

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
