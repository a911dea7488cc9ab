//! Sitemap and sitemap-index documents.
//!
//! Documents are assembled from nodes, then serialized with `quick-xml`.
//! Serialization is deterministic: the same nodes always produce the same
//! bytes, so regenerating unchanged content leaves files identical.

use crate::linker::Alternate;
use crate::node::{format_lastmod, format_priority, NewsNode, StandardNode, UrlNode};
use crate::{Classification, Result};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use std::io::Write;

/// An XML namespace used by sitemap documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// The sitemap protocol itself.
    Sitemap,
    /// Alternate-language links.
    Xhtml,
    /// Image extension.
    Image,
    /// News extension.
    News,
}

impl Namespace {
    /// Namespace URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sitemap => "http://www.sitemaps.org/schemas/sitemap/0.9",
            Self::Xhtml => "http://www.w3.org/1999/xhtml",
            Self::Image => "http://www.google.com/schemas/sitemap-image/1.1",
            Self::News => "http://www.google.com/schemas/sitemap-news/0.9",
        }
    }

    /// Attribute declaring the namespace on the root element.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Sitemap => "xmlns",
            Self::Xhtml => "xmlns:xhtml",
            Self::Image => "xmlns:image",
            Self::News => "xmlns:news",
        }
    }
}

/// A `<urlset>` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapDocument {
    /// Declared namespaces, in declaration order.
    pub namespaces: Vec<Namespace>,
    /// URL entries in output order.
    pub nodes: Vec<UrlNode>,
}

/// One `<sitemap>` entry of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Public URL of the referenced document.
    pub location: String,
    /// Newest modification across the referenced source.
    pub lastmod: Option<DateTime<Utc>>,
}

/// A `<sitemapindex>` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDocument {
    /// Entries in generation order.
    pub entries: Vec<IndexEntry>,
}

/// Assemble a sitemap document.
///
/// The image and news namespaces follow the classification and are never
/// both declared. `xhtml` is declared only when some node has alternates.
#[must_use]
pub fn assemble(nodes: Vec<UrlNode>, classification: Classification) -> SitemapDocument {
    let mut namespaces = vec![Namespace::Sitemap];
    if nodes.iter().any(UrlNode::has_alternates) {
        namespaces.push(Namespace::Xhtml);
    }
    match classification {
        Classification::Standard { images: true } => namespaces.push(Namespace::Image),
        Classification::Standard { images: false } => {}
        Classification::News => namespaces.push(Namespace::News),
    }

    SitemapDocument { namespaces, nodes }
}

/// Assemble an index document from entries in generation order.
#[must_use]
pub fn assemble_index(entries: Vec<IndexEntry>) -> IndexDocument {
    IndexDocument { entries }
}

fn new_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn declaration<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| crate::Error::Xml(e.to_string()))
}

impl SitemapDocument {
    /// Serialize to XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = new_writer();
        declaration(&mut writer)?;

        let root = BytesStart::new("urlset")
            .with_attributes(self.namespaces.iter().map(|ns| (ns.attribute(), ns.uri())));
        writer.write_event(Event::Start(root))?;
        for node in &self.nodes {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            match node {
                UrlNode::Standard(node) => write_standard(&mut writer, node)?,
                UrlNode::News(node) => write_news(&mut writer, node)?,
            }
            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        finish(writer)
    }
}

fn write_alternates<W: Write>(writer: &mut Writer<W>, alternates: &[Alternate]) -> Result<()> {
    for alternate in alternates {
        let link = BytesStart::new("xhtml:link").with_attributes([
            ("rel", "alternate"),
            ("hreflang", alternate.language.as_str()),
            ("href", alternate.url.as_str()),
        ]);
        writer.write_event(Event::Empty(link))?;
    }
    Ok(())
}

fn write_standard<W: Write>(writer: &mut Writer<W>, node: &StandardNode) -> Result<()> {
    text_element(writer, "loc", &node.loc)?;
    write_alternates(writer, &node.alternates)?;
    text_element(writer, "lastmod", &format_lastmod(&node.lastmod))?;
    text_element(writer, "changefreq", node.changefreq.as_str())?;
    text_element(writer, "priority", &format_priority(node.priority))?;
    if let Some(image) = &node.image {
        writer.write_event(Event::Start(BytesStart::new("image:image")))?;
        text_element(writer, "image:loc", &image.url)?;
        text_element(writer, "image:title", &image.title)?;
        writer.write_event(Event::End(BytesEnd::new("image:image")))?;
    }
    Ok(())
}

fn write_news<W: Write>(writer: &mut Writer<W>, node: &NewsNode) -> Result<()> {
    text_element(writer, "loc", &node.loc)?;
    write_alternates(writer, &node.alternates)?;
    writer.write_event(Event::Start(BytesStart::new("news:news")))?;
    writer.write_event(Event::Start(BytesStart::new("news:publication")))?;
    text_element(writer, "news:name", &node.publication_name)?;
    text_element(writer, "news:language", &node.publication_language)?;
    writer.write_event(Event::End(BytesEnd::new("news:publication")))?;
    if let Some(date) = &node.publication_date {
        text_element(writer, "news:publication_date", &format_lastmod(date))?;
    }
    text_element(writer, "news:title", &node.title)?;
    writer.write_event(Event::End(BytesEnd::new("news:news")))?;
    Ok(())
}

impl IndexDocument {
    /// Serialize to XML.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = new_writer();
        declaration(&mut writer)?;

        let root = BytesStart::new("sitemapindex")
            .with_attributes([(Namespace::Sitemap.attribute(), Namespace::Sitemap.uri())]);
        writer.write_event(Event::Start(root))?;
        for entry in &self.entries {
            writer.write_event(Event::Start(BytesStart::new("sitemap")))?;
            text_element(&mut writer, "loc", &entry.location)?;
            if let Some(lastmod) = &entry.lastmod {
                text_element(&mut writer, "lastmod", &format_lastmod(lastmod))?;
            }
            writer.write_event(Event::End(BytesEnd::new("sitemap")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("sitemapindex")))?;

        finish(writer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ChangeFrequency, MediaRef};
    use chrono::TimeZone;

    fn standard(loc: &str, alternates: Vec<Alternate>, image: Option<MediaRef>) -> UrlNode {
        UrlNode::Standard(StandardNode {
            loc: loc.to_string(),
            priority: 0.5,
            changefreq: ChangeFrequency::Weekly,
            lastmod: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
            alternates,
            image,
        })
    }

    fn news(loc: &str, alternates: Vec<Alternate>) -> UrlNode {
        UrlNode::News(NewsNode {
            loc: loc.to_string(),
            alternates,
            publication_name: "Ada".to_string(),
            publication_language: "en".to_string(),
            publication_date: None,
            title: "Fish & Chips".to_string(),
        })
    }

    #[test]
    fn test_plain_document_declares_base_namespace_only() {
        let doc = assemble(
            vec![standard("https://example.com/a", Vec::new(), None)],
            Classification::Standard { images: false },
        );
        assert_eq!(doc.namespaces, [Namespace::Sitemap]);

        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<lastmod>2024-02-01T12:00:00+00:00</lastmod>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(!xml.contains("xmlns:xhtml"));
    }

    #[test]
    fn test_xhtml_declared_only_with_alternates() {
        let alternate = Alternate {
            language: "de".to_string(),
            url: "https://example.com/de/a".to_string(),
        };
        let doc = assemble(
            vec![
                standard("https://example.com/a", vec![alternate], None),
                standard("https://example.com/b", Vec::new(), None),
            ],
            Classification::Standard { images: false },
        );
        assert_eq!(doc.namespaces, [Namespace::Sitemap, Namespace::Xhtml]);

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="de" href="https://example.com/de/a"/>"#
        ));
    }

    #[test]
    fn test_image_and_news_are_mutually_exclusive() {
        let images = assemble(Vec::new(), Classification::Standard { images: true });
        assert!(images.namespaces.contains(&Namespace::Image));
        assert!(!images.namespaces.contains(&Namespace::News));

        let news_doc = assemble(vec![news("https://example.com/n", Vec::new())], Classification::News);
        assert!(news_doc.namespaces.contains(&Namespace::News));
        assert!(!news_doc.namespaces.contains(&Namespace::Image));

        let xml = news_doc.to_xml().unwrap();
        assert!(xml.contains("<news:name>Ada</news:name>"));
        assert!(xml.contains("<news:title>Fish &amp; Chips</news:title>"));
        assert!(!xml.contains("news:publication_date"));
        assert!(!xml.contains("<priority>"));
    }

    #[test]
    fn test_news_entries_list_alternates_before_news_block() {
        let alternate = Alternate {
            language: "de".to_string(),
            url: "https://example.com/de/n".to_string(),
        };
        let doc = assemble(
            vec![news("https://example.com/n", vec![alternate])],
            Classification::News,
        );
        assert_eq!(
            doc.namespaces,
            [Namespace::Sitemap, Namespace::Xhtml, Namespace::News]
        );

        let xml = doc.to_xml().unwrap();
        let link = xml
            .find(r#"<xhtml:link rel="alternate" hreflang="de" href="https://example.com/de/n"/>"#)
            .unwrap();
        assert!(xml.find("<loc>").unwrap() < link);
        assert!(link < xml.find("<news:news>").unwrap());
    }

    #[test]
    fn test_image_block_serialized() {
        let image = MediaRef {
            url: "https://cdn.example.com/a.jpg".to_string(),
            title: "Hero".to_string(),
        };
        let xml = assemble(
            vec![standard("https://example.com/a", Vec::new(), Some(image))],
            Classification::Standard { images: true },
        )
        .to_xml()
        .unwrap();

        assert!(xml.contains(r#"xmlns:image="http://www.google.com/schemas/sitemap-image/1.1""#));
        assert!(xml.contains("<image:loc>https://cdn.example.com/a.jpg</image:loc>"));
        assert!(xml.contains("<image:title>Hero</image:title>"));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let build = || {
            assemble(
                vec![
                    standard("https://example.com/a", Vec::new(), None),
                    standard("https://example.com/b", Vec::new(), None),
                ],
                Classification::Standard { images: false },
            )
            .to_xml()
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_index_document() {
        let index = assemble_index(vec![
            IndexEntry {
                location: "https://example.com/sitemap_blog.xml".to_string(),
                lastmod: Some(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()),
            },
            IndexEntry {
                location: "https://example.com/sitemap_blog_50.xml".to_string(),
                lastmod: None,
            },
        ]);
        let xml = index.to_xml().unwrap();

        assert!(xml.contains("<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<lastmod>2024-05-06T07:08:09+00:00</lastmod>"));
        let first = xml.find("sitemap_blog.xml").unwrap();
        let second = xml.find("sitemap_blog_50.xml").unwrap();
        assert!(first < second);
        assert_eq!(xml.matches("<lastmod>").count(), 1);
    }
}
