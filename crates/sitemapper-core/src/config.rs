//! Configuration for sitemap generation.
//!
//! Configuration is a TOML file holding generator settings, output paths and
//! the publishing policy of every content source.
//!
//! ## File Location
//!
//! `Config::load()` reads, in order of preference:
//!
//! 1. The file named by `SITEMAPPER_CONFIG`
//! 2. The platform config directory, e.g. `~/.config/sitemapper/config.toml` on Linux
//!
//! and falls back to defaults when neither exists.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [generator]
//! max_entries_per_file = 50000
//! concurrency = 4
//!
//! [paths]
//! output = "public/sitemaps"
//! catalog = "content/catalog.json"
//!
//! [[sources]]
//! kind = "section"
//! handle = "blog"
//! priority = 0.8
//! changefreq = "daily"
//! image_field = "hero"
//!
//! [[sources]]
//! kind = "section"
//! handle = "news"
//! [sources.news.criteria]
//! posted_within_days = 2
//! ```

use crate::{Error, Result, SourcePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SITEMAPPER_CONFIG";

/// Protocol limit on URLs per sitemap document.
pub const PROTOCOL_MAX_ENTRIES: usize = 50_000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Generation settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Publishing policy per content source.
    #[serde(default)]
    pub sources: Vec<SourcePolicy>,
}

/// Settings that shape the generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum URLs per document. `0` writes one document per source
    /// regardless of size.
    #[serde(default = "default_max_entries")]
    pub max_entries_per_file: usize,
    /// Number of chunks resolved concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

const fn default_max_entries() -> usize {
    PROTOCOL_MAX_ENTRIES
}

const fn default_concurrency() -> usize {
    4
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_entries_per_file: default_max_entries(),
            concurrency: default_concurrency(),
        }
    }
}

impl GeneratorConfig {
    /// Per-document limit, `None` when pagination is off.
    #[must_use]
    pub const fn page_size(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.max_entries_per_file)
    }

    /// Concurrency, at least one.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// File system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory the documents are written to.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// JSON content catalog read by the command line tool.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

fn default_output() -> PathBuf {
    PathBuf::from("sitemaps")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            catalog: None,
        }
    }
}

/// Read access to source policies.
pub trait PolicyStore: Send + Sync {
    /// Every configured source policy, valid or not.
    fn source_policies(&self) -> Vec<SourcePolicy>;
}

impl PolicyStore for Config {
    fn source_policies(&self) -> Vec<SourcePolicy> {
        self.sources.clone()
    }
}

impl PolicyStore for Vec<SourcePolicy> {
    fn source_policies(&self) -> Vec<SourcePolicy> {
        self.clone()
    }
}

impl Config {
    /// Load configuration from `SITEMAPPER_CONFIG`, the platform config
    /// directory, or defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no configuration file found, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))?;
        debug!(path = %path.display(), sources = config.sources.len(), "loaded configuration");
        Ok(config)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Default configuration file location for this platform.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "sitemapper", "sitemapper")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Policies from `store` that pass validation, with duplicates of an
/// already-seen source dropped. Rejections are logged.
#[must_use]
pub fn valid_policies(store: &dyn PolicyStore) -> Vec<SourcePolicy> {
    let mut seen = std::collections::BTreeSet::new();
    store
        .source_policies()
        .into_iter()
        .filter(|policy| match policy.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("skipping source policy: {e}");
                false
            },
        })
        .filter(|policy| {
            let fresh = seen.insert(policy.source_ref());
            if !fresh {
                warn!(source = %policy.source_ref(), "duplicate source policy ignored");
            }
            fresh
        })
        .collect()
}
