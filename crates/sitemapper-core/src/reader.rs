//! Sitemap XML parsing.
//!
//! Reads `<urlset>` and `<sitemapindex>` documents, including the alternate
//! link, image and news extensions this crate writes. Element matching uses
//! local names so any namespace prefix is accepted.
//!
//! ```rust
//! use sitemapper_core::reader::{parse, SitemapKind};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/page1</loc>
//!     <lastmod>2024-01-15</lastmod>
//!   </url>
//! </urlset>"#;
//!
//! let doc = parse(xml)?;
//! assert_eq!(doc.kind, SitemapKind::Urlset);
//! assert_eq!(doc.urls[0].loc, "https://example.com/page1");
//! # Ok::<(), sitemapper_core::Error>(())
//! ```

use crate::linker::Alternate;
use crate::{ChangeFrequency, Error, MediaRef, Result};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Root element of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SitemapKind {
    /// `<urlset>`
    Urlset,
    /// `<sitemapindex>`
    Index,
}

/// News block of a URL entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedNews {
    /// Publication name.
    pub publication_name: String,
    /// Publication language.
    pub publication_language: String,
    /// Publication date.
    pub publication_date: Option<DateTime<Utc>>,
    /// Title.
    pub title: String,
}

/// One `<url>` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedUrl {
    /// Location.
    pub loc: String,
    /// Last modification date.
    pub lastmod: Option<DateTime<Utc>>,
    /// Change frequency.
    pub changefreq: Option<ChangeFrequency>,
    /// Priority.
    pub priority: Option<f32>,
    /// Alternate-language links.
    pub alternates: Vec<Alternate>,
    /// Image block.
    pub image: Option<MediaRef>,
    /// News block.
    pub news: Option<ParsedNews>,
}

/// One `<sitemap>` entry of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIndexEntry {
    /// Location of the referenced document.
    pub loc: String,
    /// Last modification date.
    pub lastmod: Option<DateTime<Utc>>,
}

/// A parsed sitemap or sitemap index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSitemap {
    /// Root element.
    pub kind: SitemapKind,
    /// Namespace URIs declared on the root element, in document order.
    pub namespaces: Vec<String>,
    /// URL entries; empty for an index.
    pub urls: Vec<ParsedUrl>,
    /// Index entries; empty for a urlset.
    pub sitemaps: Vec<ParsedIndexEntry>,
}

impl ParsedSitemap {
    /// Whether the root element declares `uri`.
    #[must_use]
    pub fn declares(&self, uri: &str) -> bool {
        self.namespaces.iter().any(|ns| ns == uri)
    }
}

/// Parse a sitemap file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a sitemap.
pub fn parse_file(path: &Path) -> Result<ParsedSitemap> {
    let xml = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    parse(&xml)
}

/// Parse sitemap XML.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed XML or a root element other than
/// `urlset` or `sitemapindex`.
pub fn parse(xml: &str) -> Result<ParsedSitemap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<(SitemapKind, Vec<String>)> = None;
    let mut path: Vec<String> = Vec::new();
    let mut urls = Vec::new();
    let mut sitemaps = Vec::new();
    let mut url: Option<ParsedUrl> = None;
    let mut entry: Option<ParsedIndexEntry> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if root.is_none() {
                    root = Some(parse_root(&e, &name)?);
                } else {
                    match name.as_str() {
                        "url" => url = Some(ParsedUrl::default()),
                        "sitemap" => {
                            entry = Some(ParsedIndexEntry {
                                loc: String::new(),
                                lastmod: None,
                            });
                        },
                        "image" => {
                            if let Some(current) = url.as_mut() {
                                current.image = Some(MediaRef {
                                    url: String::new(),
                                    title: String::new(),
                                });
                            }
                        },
                        "news" => {
                            if let Some(current) = url.as_mut() {
                                current.news = Some(ParsedNews::default());
                            }
                        },
                        _ => {},
                    }
                }
                path.push(name);
            },
            Ok(Event::Empty(e)) => {
                if let Some(current) = url.as_mut() {
                    if local_name(&e) == "link" {
                        if let Some(alternate) = parse_alternate(&e)? {
                            current.alternates.push(alternate);
                        }
                    }
                }
            },
            Ok(Event::End(_)) => match path.pop().as_deref() {
                Some("url") => {
                    if let Some(done) = url.take().filter(|u| !u.loc.is_empty()) {
                        urls.push(done);
                    }
                },
                Some("sitemap") => {
                    if let Some(done) = entry.take().filter(|e| !e.loc.is_empty()) {
                        sitemaps.push(done);
                    }
                },
                _ => {},
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                apply_text(&path, text.trim(), url.as_mut(), entry.as_mut());
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    let (kind, namespaces) =
        root.ok_or_else(|| Error::Parse("document has no root element".to_string()))?;
    Ok(ParsedSitemap {
        kind,
        namespaces,
        urls,
        sitemaps,
    })
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn parse_root(e: &BytesStart<'_>, name: &str) -> Result<(SitemapKind, Vec<String>)> {
    let kind = match name {
        "urlset" => SitemapKind::Urlset,
        "sitemapindex" => SitemapKind::Index,
        other => {
            return Err(Error::Parse(format!(
                "unexpected root element <{other}>, expected urlset or sitemapindex"
            )));
        },
    };

    let mut namespaces = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?;
            namespaces.push(value.into_owned());
        }
    }
    Ok((kind, namespaces))
}

fn parse_alternate(e: &BytesStart<'_>) -> Result<Option<Alternate>> {
    let mut rel = None;
    let mut language = None;
    let mut href = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .into_owned();
        match attr.key.local_name().as_ref() {
            b"rel" => rel = Some(value),
            b"hreflang" => language = Some(value),
            b"href" => href = Some(value),
            _ => {},
        }
    }

    Ok(match (rel.as_deref(), language, href) {
        (Some("alternate"), Some(language), Some(url)) => Some(Alternate { language, url }),
        _ => None,
    })
}

fn apply_text(
    path: &[String],
    text: &str,
    url: Option<&mut ParsedUrl>,
    entry: Option<&mut ParsedIndexEntry>,
) {
    let tail: Vec<&str> = path.iter().rev().take(2).map(String::as_str).collect();
    let (parent, element) = match tail.as_slice() {
        [element, parent] => (*parent, *element),
        _ => return,
    };

    if let Some(entry) = entry {
        match (parent, element) {
            ("sitemap", "loc") => entry.loc = text.to_string(),
            ("sitemap", "lastmod") => entry.lastmod = parse_lastmod(text),
            _ => {},
        }
        return;
    }

    let Some(url) = url else {
        return;
    };
    match (parent, element) {
        ("url", "loc") => url.loc = text.to_string(),
        ("url", "lastmod") => url.lastmod = parse_lastmod(text),
        ("url", "changefreq") => url.changefreq = text.parse().ok(),
        ("url", "priority") => url.priority = parse_priority(text),
        ("image", "loc") => {
            if let Some(image) = url.image.as_mut() {
                image.url = text.to_string();
            }
        },
        ("image", "title") => {
            if let Some(image) = url.image.as_mut() {
                image.title = text.to_string();
            }
        },
        ("publication", "name") => {
            if let Some(news) = url.news.as_mut() {
                news.publication_name = text.to_string();
            }
        },
        ("publication", "language") => {
            if let Some(news) = url.news.as_mut() {
                news.publication_language = text.to_string();
            }
        },
        ("news", "publication_date") => {
            if let Some(news) = url.news.as_mut() {
                news.publication_date = parse_lastmod(text);
            }
        },
        ("news", "title") => {
            if let Some(news) = url.news.as_mut() {
                news.title = text.to_string();
            }
        },
        _ => {},
    }
}

/// Parse a lastmod date string into a `DateTime<Utc>`.
///
/// Supports multiple date formats:
/// - `2024-01-15` (date only)
/// - `2024-01-15T10:30:00Z` (ISO 8601 with Z)
/// - `2024-01-15T10:30:00+00:00` (ISO 8601 with offset)
/// - `2024-01-15T10:30:00.000Z` (with milliseconds)
fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    tracing::debug!(date_str = %s, "Could not parse lastmod date");
    None
}

fn parse_priority(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().map(|p| p.clamp(0.0, 1.0))
}
