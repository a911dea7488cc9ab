use crate::{Error, Result, SiteId};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Destination for serialized sitemap documents.
pub trait DocumentStore: Send + Sync {
    /// Persist `xml` under `name`, replacing any previous document atomically.
    fn save(&self, name: &str, xml: &str) -> Result<()>;

    /// Whether a document named `name` exists.
    fn exists(&self, name: &str) -> bool;

    /// Names of every stored document.
    fn list(&self) -> Result<Vec<String>>;

    /// Delete the document named `name`.
    fn remove(&self, name: &str) -> Result<()>;
}

/// File name of a site's index document.
#[must_use]
pub fn index_file_name(site: SiteId) -> String {
    format!("sitemap_{site}.xml")
}

/// File name of one chunk document of a site.
#[must_use]
pub fn chunk_file_name(site: SiteId, base_name: &str) -> String {
    format!("sitemap_{site}_{}.xml", sanitize_base_name(base_name))
}

/// Whether `name` is a chunk document of `site`.
#[must_use]
pub fn is_chunk_file_of(site: SiteId, name: &str) -> bool {
    name.strip_prefix(&format!("sitemap_{site}_"))
        .is_some_and(|rest| rest.len() > ".xml".len() && rest.ends_with(".xml"))
}

/// Restrict a base name to `[A-Za-z0-9._-]` with no `..` segments.
#[must_use]
pub fn sanitize_base_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }
    sanitized
}

/// Documents stored as files in one output directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    /// Open `root_dir`, creating it when missing.
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        fs::create_dir_all(&root_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create output directory {}: {e}",
                root_dir.display()
            ))
        })?;
        Ok(Self { root_dir })
    }

    /// Output directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name != sanitize_base_name(name) {
            return Err(Error::Storage(format!("Invalid document name '{name}'")));
        }
        Ok(self.root_dir.join(name))
    }
}

impl DocumentStore for FileStore {
    #[instrument(skip(self, xml), fields(bytes = xml.len()))]
    fn save(&self, name: &str, xml: &str) -> Result<()> {
        let path = self.path_for(name)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root_dir)
            .map_err(|e| Error::Storage(format!("Failed to create temp file for {name}: {e}")))?;
        tmp.write_all(xml.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to write {name}: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing {name}: {e}")))?;
        }

        tmp.persist(&path)
            .map_err(|e| Error::Storage(format!("Failed to commit {name}: {e}")))?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root_dir).map_err(|e| {
            Error::Storage(format!("Failed to read {}: {e}", self.root_dir.display()))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Storage(format!("Failed to read entry: {e}")))?;
            if entry.file_type().is_ok_and(|t| t.is_file()) {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    #[instrument(skip(self))]
    fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        fs::remove_file(&path)
            .map_err(|e| Error::Storage(format!("Failed to remove {name}: {e}")))?;
        debug!("Removed {}", path.display());
        Ok(())
    }
}
