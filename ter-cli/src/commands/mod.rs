//! CLI command implementations.

pub mod build;
pub mod tags;
pub mod verify;

pub use build::build_site;
pub use tags::list_tags;
pub use verify::verify_site;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use ter_core::{Config, Page, SiteBuilder};

/// Load the config (defaults when the file is absent) and apply CLI overrides.
pub fn load_config(
    config_path: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<Config> {
    tracing::debug!("Loading config from {:?}", config_path);
    let mut config =
        Config::load_or_default(config_path).context("Failed to load configuration")?;

    // Command-line paths are relative to the working directory, not the config file
    if let Some(input) = input {
        config.input_dir = absolute(input)?;
    }
    if let Some(output) = output {
        config.output_dir = absolute(output)?;
    }
    Ok(config)
}

/// Build every page of the site described by `config`.
pub fn build_pages(config: Config) -> Result<Vec<Page>> {
    tracing::info!("Building site: {}", config.site.title);
    let builder = SiteBuilder::new(config).context("Invalid configuration")?;
    builder.build().context("Failed to build site")
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(cwd.join(path))
}
