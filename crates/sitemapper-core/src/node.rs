//! Per-item URL nodes.
//!
//! A node is the serializable form of one item on one site. Standard nodes
//! carry crawl hints, alternates and an optional image; news nodes carry
//! alternates and the news-protocol publication block.

use crate::linker::Alternate;
use crate::{AnnotatedItem, ChangeFrequency, Classification, ContentItem, MediaRef};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

/// A standard `<url>` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardNode {
    /// Canonical URL.
    pub loc: String,
    /// Crawl priority.
    pub priority: f32,
    /// Change frequency hint.
    pub changefreq: ChangeFrequency,
    /// Last modification time.
    pub lastmod: DateTime<Utc>,
    /// Other-site versions of the item.
    pub alternates: Vec<Alternate>,
    /// Image block, only for sources with an image field.
    pub image: Option<MediaRef>,
}

/// A news `<url>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsNode {
    /// Canonical URL.
    pub loc: String,
    /// Other-site versions of the item.
    pub alternates: Vec<Alternate>,
    /// Publication name.
    pub publication_name: String,
    /// Publication language.
    pub publication_language: String,
    /// Publication date, omitted when unknown.
    pub publication_date: Option<DateTime<Utc>>,
    /// Article title.
    pub title: String,
}

/// One entry of a sitemap document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlNode {
    /// Standard entry.
    Standard(StandardNode),
    /// News entry.
    News(NewsNode),
}

impl UrlNode {
    /// The node's location.
    #[must_use]
    pub fn loc(&self) -> &str {
        match self {
            Self::Standard(node) => &node.loc,
            Self::News(node) => &node.loc,
        }
    }

    /// Whether the node lists alternates.
    #[must_use]
    pub fn has_alternates(&self) -> bool {
        match self {
            Self::Standard(node) => !node.alternates.is_empty(),
            Self::News(node) => !node.alternates.is_empty(),
        }
    }
}

/// Editable news data for one item, seeded from the item itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsPayload {
    /// Publication name; defaults to the author's display name.
    pub author: Option<String>,
    /// Publication language; defaults to the item's site language.
    pub language: Option<String>,
    /// Publication date; defaults to the item's post date.
    pub publish_date: Option<DateTime<Utc>>,
    /// Article title.
    pub title: String,
    /// Article URL.
    pub location: Option<String>,
}

impl NewsPayload {
    /// Default payload for `item`. A missing author becomes an empty name.
    #[must_use]
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            author: Some(item.author.clone().unwrap_or_default()),
            language: Some(item.language.clone()),
            publish_date: item.post_date,
            title: item.title.clone(),
            location: item.url.clone(),
        }
    }
}

/// Adjusts the news payload of an item before its node is built.
pub trait NewsHook: Send + Sync {
    /// Return the payload to publish for `item`.
    fn populate(&self, item: &ContentItem, payload: NewsPayload) -> NewsPayload;
}

impl<F> NewsHook for F
where
    F: Fn(&ContentItem, NewsPayload) -> NewsPayload + Send + Sync,
{
    fn populate(&self, item: &ContentItem, payload: NewsPayload) -> NewsPayload {
        self(item, payload)
    }
}

/// Build the node for one annotated item.
///
/// Returns `None` for items without a URL and for news items whose payload
/// lacks a location, author or language once the hook has run.
#[must_use]
pub fn build_node(
    entry: &AnnotatedItem,
    alternates: Vec<Alternate>,
    classification: Classification,
    news_hook: Option<&dyn NewsHook>,
) -> Option<UrlNode> {
    let item = &entry.item;
    let Some(loc) = item.url.as_ref() else {
        debug!(item = %item.id, site = %item.site_id, "item has no URL, skipping");
        return None;
    };

    match classification {
        Classification::News => build_news(item, alternates, news_hook),
        Classification::Standard { images } => Some(UrlNode::Standard(StandardNode {
            loc: loc.clone(),
            priority: entry.annotation.priority,
            changefreq: entry.annotation.changefreq,
            lastmod: item.date_updated,
            alternates,
            image: if images {
                entry.annotation.image.clone()
            } else {
                None
            },
        })),
    }
}

fn build_news(
    item: &ContentItem,
    alternates: Vec<Alternate>,
    news_hook: Option<&dyn NewsHook>,
) -> Option<UrlNode> {
    let payload = NewsPayload::from_item(item);
    let payload = match news_hook {
        Some(hook) => hook.populate(item, payload),
        None => payload,
    };

    let (Some(loc), Some(name), Some(language)) = (
        non_empty(payload.location),
        non_empty(payload.author),
        non_empty(payload.language),
    ) else {
        debug!(item = %item.id, site = %item.site_id, "incomplete news payload, skipping");
        return None;
    };

    Some(UrlNode::News(NewsNode {
        loc,
        alternates,
        publication_name: name,
        publication_language: language,
        publication_date: payload.publish_date,
        title: payload.title,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Protocol form of a timestamp: RFC 3339, whole seconds, `+00:00`.
#[must_use]
pub fn format_lastmod(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Protocol form of a priority: one decimal.
#[must_use]
pub fn format_priority(priority: f32) -> String {
    format!("{priority:.1}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ItemAnnotation, ItemId, SiteId};
    use chrono::TimeZone;

    fn entry(url: Option<&str>) -> AnnotatedItem {
        AnnotatedItem {
            item: ContentItem {
                id: ItemId(42),
                site_id: SiteId(1),
                language: "en-GB".to_string(),
                url: url.map(str::to_string),
                date_updated: Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap(),
                title: "Launch day".to_string(),
                author: Some("Ada".to_string()),
                post_date: Some(Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap()),
                link_only: false,
            },
            annotation: ItemAnnotation {
                priority: 0.8,
                changefreq: ChangeFrequency::Daily,
                image: Some(MediaRef {
                    url: "https://cdn.example.com/a.jpg".to_string(),
                    title: "Hero".to_string(),
                }),
            },
        }
    }

    fn alternates() -> Vec<Alternate> {
        vec![Alternate {
            language: "de".to_string(),
            url: "https://example.com/de/a".to_string(),
        }]
    }

    #[test]
    fn test_missing_url_yields_no_node() {
        let node = build_node(
            &entry(None),
            Vec::new(),
            Classification::Standard { images: false },
            None,
        );
        assert!(node.is_none());
    }

    #[test]
    fn test_standard_node_carries_annotation() {
        let node = build_node(
            &entry(Some("https://example.com/a")),
            alternates(),
            Classification::Standard { images: true },
            None,
        )
        .unwrap();

        let UrlNode::Standard(node) = node else {
            panic!("expected a standard node");
        };
        assert_eq!(node.loc, "https://example.com/a");
        assert_eq!(format_priority(node.priority), "0.8");
        assert_eq!(node.changefreq, ChangeFrequency::Daily);
        assert_eq!(format_lastmod(&node.lastmod), "2024-03-09T14:30:05+00:00");
        assert_eq!(node.alternates.len(), 1);
        assert_eq!(node.image.unwrap().title, "Hero");
    }

    #[test]
    fn test_image_dropped_without_image_classification() {
        let node = build_node(
            &entry(Some("https://example.com/a")),
            Vec::new(),
            Classification::Standard { images: false },
            None,
        )
        .unwrap();
        assert!(matches!(node, UrlNode::Standard(StandardNode { image: None, .. })));
        assert!(!node.has_alternates());
    }

    #[test]
    fn test_news_node_keeps_alternates() {
        let node = build_node(
            &entry(Some("https://example.com/a")),
            alternates(),
            Classification::News,
            None,
        )
        .unwrap();

        let UrlNode::News(news) = &node else {
            panic!("expected a news node");
        };
        assert_eq!(news.publication_name, "Ada");
        assert_eq!(news.publication_language, "en-GB");
        assert_eq!(news.title, "Launch day");
        assert_eq!(news.alternates, alternates());
        assert!(node.has_alternates());
    }

    #[test]
    fn test_news_hook_fills_missing_publish_date() {
        let mut undated = entry(Some("https://example.com/a"));
        undated.item.post_date = None;

        let filled = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let hook = move |_: &ContentItem, mut payload: NewsPayload| {
            payload.publish_date.get_or_insert(filled);
            payload
        };

        let node = build_node(&undated, Vec::new(), Classification::News, Some(&hook)).unwrap();
        let UrlNode::News(news) = node else {
            panic!("expected a news node");
        };
        assert_eq!(news.publication_date, Some(filled));
    }

    #[test]
    fn test_news_hook_clearing_location_omits_node() {
        let hook = |_: &ContentItem, mut payload: NewsPayload| {
            payload.location = None;
            payload
        };
        let node = build_node(
            &entry(Some("https://example.com/a")),
            Vec::new(),
            Classification::News,
            Some(&hook),
        );
        assert!(node.is_none());
    }

    #[test]
    fn test_news_without_author_is_skipped() {
        let mut anonymous = entry(Some("https://example.com/a"));
        anonymous.item.author = None;
        assert!(build_node(&anonymous, Vec::new(), Classification::News, None).is_none());
    }

    #[test]
    fn test_news_without_publish_date_is_still_emitted() {
        let mut undated = entry(Some("https://example.com/a"));
        undated.item.post_date = None;
        let node = build_node(&undated, Vec::new(), Classification::News, None).unwrap();
        assert!(matches!(
            node,
            UrlNode::News(NewsNode {
                publication_date: None,
                ..
            })
        ));
    }
}
