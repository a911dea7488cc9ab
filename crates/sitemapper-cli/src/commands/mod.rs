//! Command implementations

mod generate;
mod inspect;
mod plan;

pub use generate::execute as generate;
pub use inspect::execute as inspect;
pub use plan::execute as plan;

use anyhow::{Result, anyhow};
use sitemapper_core::{Config, DocumentStore, JsonCatalog, SitemapGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CliError;

/// Load configuration from an explicit file or the default locations.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    Ok(config.map_err(CliError::from)?)
}

/// Load the catalog named on the command line or in the configuration.
fn load_catalog(config: &Config, flag: Option<PathBuf>) -> Result<Arc<JsonCatalog>> {
    let path = flag
        .or_else(|| config.paths.catalog.clone())
        .ok_or_else(|| CliError::usage(anyhow!("no catalog configured; pass --catalog")))?;

    Ok(Arc::new(JsonCatalog::load(&path).map_err(CliError::from)?))
}

/// Wire a generator over the catalog and `store`.
fn build_generator(
    config: &Config,
    catalog: Arc<JsonCatalog>,
    store: Arc<dyn DocumentStore>,
) -> SitemapGenerator {
    SitemapGenerator::new(config.generator, config, catalog.clone(), store).with_media(catalog)
}
