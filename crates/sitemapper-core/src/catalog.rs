//! File-backed content repository.
//!
//! A catalog is a JSON document listing sites and per-site item instances.
//! It lets the command line tool generate sitemaps without a live content
//! store, and doubles as the fixture format for integration tests.
//!
//! ```json
//! {
//!   "sites": [
//!     { "id": 1, "handle": "en", "language": "en", "base_url": "https://example.com/" }
//!   ],
//!   "items": [
//!     {
//!       "id": 10,
//!       "site_id": 1,
//!       "source": { "kind": "section", "handle": "blog" },
//!       "url": "https://example.com/blog/hello",
//!       "title": "Hello",
//!       "date_updated": "2024-05-01T10:00:00Z",
//!       "fields": { "featured": true },
//!       "media": { "hero": [{ "url": "https://cdn.example.com/hello.jpg", "title": "Hello" }] }
//!     }
//!   ]
//! }
//! ```
//!
//! Query constraints understood by the catalog:
//!
//! - `posted_within_days = N`: post date no older than `N` days
//! - any other key: the item's `fields` entry must equal the value

use crate::query::{Constraint, ContentQuery, QueryOrder};
use crate::repository::{ContentRepository, MediaResolver};
use crate::{ContentItem, Error, ItemId, MediaRef, Result, Site, SiteId, SourceRef};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Constraint key selecting recently posted items.
pub const POSTED_WITHIN_DAYS: &str = "posted_within_days";

/// One item instance as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Logical identity shared across sites.
    pub id: ItemId,
    /// Owning site.
    pub site_id: SiteId,
    /// Source the item belongs to.
    pub source: SourceRef,
    /// Canonical URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
    /// Publish date.
    #[serde(default)]
    pub post_date: Option<DateTime<Utc>>,
    /// Last modification time.
    pub date_updated: DateTime<Utc>,
    /// Redirect placeholder.
    #[serde(default)]
    pub link_only: bool,
    /// Custom field values, matched by equality constraints.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Related media per field, in relation order.
    #[serde(default)]
    pub media: BTreeMap<String, Vec<MediaRef>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sites: Vec<Site>,
    #[serde(default)]
    items: Vec<CatalogEntry>,
}

/// In-memory catalog of sites and items.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    sites: Vec<Site>,
    languages: HashMap<SiteId, String>,
    entries: Vec<CatalogEntry>,
    now: DateTime<Utc>,
}

impl JsonCatalog {
    /// Build a catalog, checking that every item belongs to a known site.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for items referencing an unknown site.
    pub fn new(sites: Vec<Site>, entries: Vec<CatalogEntry>) -> Result<Self> {
        let languages: HashMap<SiteId, String> = sites
            .iter()
            .map(|site| (site.id, site.language.clone()))
            .collect();

        if let Some(orphan) = entries.iter().find(|e| !languages.contains_key(&e.site_id)) {
            return Err(Error::Parse(format!(
                "item {} references unknown site {}",
                orphan.id, orphan.site_id
            )));
        }

        Ok(Self {
            sites,
            languages,
            entries,
            now: Utc::now(),
        })
    }

    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or items of unknown sites.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.sites, file.items)
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file is missing, otherwise any
    /// read or parse error.
    #[instrument]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("catalog {}", path.display()))
            },
            _ => Error::Io(e),
        })?;
        let catalog = Self::from_json(&json)?;
        debug!(
            sites = catalog.sites.len(),
            items = catalog.entries.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Evaluate time-relative constraints against `now` instead of the load time.
    #[must_use]
    pub const fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    fn satisfies(&self, entry: &CatalogEntry, constraint: &Constraint) -> bool {
        if constraint.key == POSTED_WITHIN_DAYS {
            let Some(days) = constraint.value.as_i64() else {
                return false;
            };
            // Out-of-range windows reach back to the beginning of time
            let since = Duration::try_days(days).and_then(|d| self.now.checked_sub_signed(d));
            return entry
                .post_date
                .is_some_and(|posted| since.is_none_or(|since| posted >= since));
        }
        entry.fields.get(&constraint.key) == Some(&constraint.value)
    }

    fn matching(&self, query: &ContentQuery) -> Vec<&CatalogEntry> {
        let mut matched: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| e.source == query.source)
            .filter(|e| query.site.matches(e.site_id))
            .filter(|e| query.ids.as_ref().is_none_or(|ids| ids.contains(&e.id)))
            .filter(|e| !(query.exclude_link_only && e.link_only))
            .filter(|e| query.constraints.iter().all(|c| self.satisfies(e, c)))
            .collect();

        match query.order {
            QueryOrder::Id => matched.sort_by_key(|e| (e.id, e.site_id)),
            QueryOrder::UpdatedDesc => matched.sort_by(|a, b| {
                b.date_updated
                    .cmp(&a.date_updated)
                    .then_with(|| (a.id, a.site_id).cmp(&(b.id, b.site_id)))
            }),
        }
        matched
    }

    fn to_item(&self, entry: &CatalogEntry) -> ContentItem {
        ContentItem {
            id: entry.id,
            site_id: entry.site_id,
            language: self
                .languages
                .get(&entry.site_id)
                .cloned()
                .unwrap_or_default(),
            url: entry.url.clone(),
            date_updated: entry.date_updated,
            title: entry.title.clone(),
            author: entry.author.clone(),
            post_date: entry.post_date,
            link_only: entry.link_only,
        }
    }
}

#[async_trait]
impl ContentRepository for JsonCatalog {
    async fn sites(&self) -> Result<Vec<Site>> {
        Ok(self.sites.clone())
    }

    async fn count(&self, query: &ContentQuery) -> Result<usize> {
        Ok(self.matching(query).len())
    }

    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<ContentItem>> {
        Ok(self
            .matching(query)
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|entry| self.to_item(entry))
            .collect())
    }
}

#[async_trait]
impl MediaResolver for JsonCatalog {
    async fn first_media(&self, item: &ContentItem, field: &str) -> Result<Option<MediaRef>> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.id == item.id && e.site_id == item.site_id)
            .and_then(|e| e.media.get(field))
            .and_then(|media| media.first())
            .cloned())
    }
}
