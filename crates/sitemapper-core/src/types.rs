use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a site (one localized variant of the content repository).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical identity of a content item, shared by its per-site instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A site the sitemaps are generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Numeric site id, used in output file names.
    pub id: SiteId,
    /// Short handle for display.
    pub handle: String,
    /// Language tag (e.g. `en-US`) used for hreflang and news entries.
    pub language: String,
    /// Public base URL; sites without one are not published.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Whether the site serves public URLs at all.
    #[serde(default = "default_true")]
    pub has_urls: bool,
}

const fn default_true() -> bool {
    true
}

impl Site {
    /// Whether sitemaps should be generated for this site.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.has_urls
            && self
                .base_url
                .as_deref()
                .is_some_and(|base| !base.trim().is_empty())
    }

    /// Public URL of a sitemap document for this site.
    ///
    /// `sitemap_url("blog_50")` yields `<base>/sitemap_blog_50.xml`. The delivery
    /// layer maps that URL back to the stored `sitemap_<siteId>_blog_50.xml`.
    pub fn sitemap_url(&self, base_name: &str) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::Config(format!("site {} has no base URL", self.id)))?;

        let mut base = url::Url::parse(base)
            .map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(&format!("sitemap_{base_name}.xml"))
            .map(String::from)
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }
}

/// Kind of logical content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A section of entries.
    Section,
    /// A category group.
    Category,
}

impl SourceKind {
    /// Lowercase name used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a content source: its kind plus its handle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Section or category.
    pub kind: SourceKind,
    /// Human-readable handle, also the base of output file names.
    pub handle: String,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.handle)
    }
}

/// Change frequency hints for sitemap entries.
///
/// These values indicate how frequently a page is likely to change,
/// though search engines may not follow these hints strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// Protocol spelling of the value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::Parse(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// Marks a source as a news source.
///
/// The criteria are handed to the content repository verbatim as extra
/// query constraints, e.g. `{ posted_within_days = 2 }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsPolicy {
    /// Extra query constraints applied to every query for this source.
    #[serde(default)]
    pub criteria: BTreeMap<String, serde_json::Value>,
}

/// Publishing policy for one content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePolicy {
    /// Source handle.
    #[serde(default)]
    pub handle: String,
    /// Section or category.
    pub kind: SourceKind,
    /// Crawl priority, 0.0 to 1.0.
    #[serde(default = "default_priority")]
    pub priority: f32,
    /// Change frequency hint.
    #[serde(default = "default_changefreq")]
    pub changefreq: ChangeFrequency,
    /// Field whose first related media is exposed as an `image:image` block.
    #[serde(default)]
    pub image_field: Option<String>,
    /// Present when the source is published in the news format.
    #[serde(default)]
    pub news: Option<NewsPolicy>,
}

const fn default_priority() -> f32 {
    0.5
}

const fn default_changefreq() -> ChangeFrequency {
    ChangeFrequency::Weekly
}

impl SourcePolicy {
    /// Create a standard policy with default priority and change frequency.
    #[must_use]
    pub fn new(kind: SourceKind, handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            kind,
            priority: default_priority(),
            changefreq: default_changefreq(),
            image_field: None,
            news: None,
        }
    }

    /// Set the crawl priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the change frequency.
    #[must_use]
    pub const fn with_changefreq(mut self, changefreq: ChangeFrequency) -> Self {
        self.changefreq = changefreq;
        self
    }

    /// Expose the first media related through `field` as an image.
    #[must_use]
    pub fn with_image_field(mut self, field: impl Into<String>) -> Self {
        self.image_field = Some(field.into());
        self
    }

    /// Publish this source in the news format.
    #[must_use]
    pub fn with_news(mut self, news: NewsPolicy) -> Self {
        self.news = Some(news);
        self
    }

    /// Identity of the source this policy applies to.
    #[must_use]
    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            kind: self.kind,
            handle: self.handle.clone(),
        }
    }

    /// How nodes and documents for this source are formatted.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        if self.news.is_some() {
            Classification::News
        } else {
            Classification::Standard {
                images: self.image_field.is_some(),
            }
        }
    }

    /// Reject policies the engine cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.handle.trim().is_empty() {
            return Err(Error::Config(format!(
                "{} source policy is missing a handle",
                self.kind
            )));
        }
        if !self
            .handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || self.handle.contains("..")
        {
            return Err(Error::Config(format!(
                "source handle '{}' contains characters not allowed in file names",
                self.handle
            )));
        }
        if !(0.0..=1.0).contains(&self.priority) || self.priority.is_nan() {
            return Err(Error::Config(format!(
                "priority {} for '{}' is outside 0.0..=1.0",
                self.priority, self.handle
            )));
        }
        if self
            .image_field
            .as_deref()
            .is_some_and(|f| f.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "image field for '{}' is empty",
                self.handle
            )));
        }
        Ok(())
    }
}

/// Node and document format of a source, decided once per policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Standard URL nodes; `images` is set when the policy names an image field.
    Standard {
        /// Whether the image extension may appear.
        images: bool,
    },
    /// News protocol nodes.
    News,
}

/// Media reference resolved through an item's image field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Absolute URL of the media file.
    pub url: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
}

/// A resolved content record for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Logical identity shared across sites.
    pub id: ItemId,
    /// Site this instance belongs to.
    pub site_id: SiteId,
    /// Language tag of the owning site.
    pub language: String,
    /// Canonical URL; `None` means the item is not publishable.
    #[serde(default)]
    pub url: Option<String>,
    /// Last modification time.
    pub date_updated: DateTime<Utc>,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
    /// Publish date.
    #[serde(default)]
    pub post_date: Option<DateTime<Utc>>,
    /// Pass-through redirect entries never appear in a sitemap.
    #[serde(default)]
    pub link_only: bool,
}

/// Sitemap metadata attached to an item at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAnnotation {
    /// Priority copied from the owning policy.
    pub priority: f32,
    /// Change frequency copied from the owning policy.
    pub changefreq: ChangeFrequency,
    /// First media found through the policy's image field.
    pub image: Option<MediaRef>,
}

impl ItemAnnotation {
    /// Annotation carrying the policy's priority and change frequency.
    #[must_use]
    pub fn from_policy(policy: &SourcePolicy, image: Option<MediaRef>) -> Self {
        Self {
            priority: policy.priority,
            changefreq: policy.changefreq,
            image,
        }
    }
}

/// A content item together with its annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedItem {
    /// The item as returned by the repository.
    pub item: ContentItem,
    /// Policy-derived metadata.
    pub annotation: ItemAnnotation,
}
