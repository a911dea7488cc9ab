//! End-to-end generation against a JSON catalog and a file store.

#![allow(clippy::unwrap_used, missing_docs)]

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use sitemapper_core::query::{ContentQuery, QueryContext, QueryPurpose};
use sitemapper_core::reader::{SitemapKind, parse_file};
use sitemapper_core::{
    ContentItem, FileStore, GeneratorConfig, JsonCatalog, NewsPayload, NewsPolicy, QueryHooks,
    SiteId, SitemapGenerator, SourceKind, SourcePolicy,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const XHTML: &str = "http://www.w3.org/1999/xhtml";
const IMAGE: &str = "http://www.google.com/schemas/sitemap-image/1.1";
const NEWS: &str = "http://www.google.com/schemas/sitemap-news/0.9";

fn sites() -> Value {
    json!([
        { "id": 1, "handle": "en", "language": "en", "base_url": "https://example.com/" },
        { "id": 2, "handle": "de", "language": "de", "base_url": "https://example.com/de/" },
        { "id": 3, "handle": "staging", "language": "en", "base_url": null }
    ])
}

fn entry(source: &str, id: u64, site: u32, day: u32) -> Value {
    let prefix = if site == 1 { "" } else { "de/" };
    json!({
        "id": id,
        "site_id": site,
        "source": { "kind": "section", "handle": source },
        "url": format!("https://example.com/{prefix}{source}/{id}"),
        "title": format!("{source} {id}"),
        "author": "Ada",
        "post_date": "2024-02-01T09:00:00Z",
        "date_updated": format!("2024-01-{day:02}T12:00:00Z"),
        "media": { "hero": [{ "url": format!("https://cdn.example.com/{id}.jpg"), "title": "Hero" }] }
    })
}

fn catalog(items: Vec<Value>) -> Arc<JsonCatalog> {
    let json = json!({ "sites": sites(), "items": items });
    Arc::new(JsonCatalog::from_json(&json.to_string()).unwrap())
}

fn blog_catalog(count: u64) -> Vec<Value> {
    (1..=count).map(|id| entry("blog", id, 1, 1)).collect()
}

fn generator(
    items: Vec<Value>,
    policies: Vec<SourcePolicy>,
    max: usize,
    out: &Path,
) -> SitemapGenerator {
    let catalog = catalog(items);
    let store = Arc::new(FileStore::new(out).unwrap());
    SitemapGenerator::new(
        GeneratorConfig {
            max_entries_per_file: max,
            concurrency: 4,
        },
        &policies,
        catalog.clone(),
        store,
    )
    .with_media(catalog)
}

fn blog() -> SourcePolicy {
    SourcePolicy::new(SourceKind::Section, "blog")
}

#[tokio::test]
async fn test_blog_with_120_items_splits_into_three_documents() {
    let dir = TempDir::new().unwrap();
    let generator = generator(blog_catalog(120), vec![blog()], 50, dir.path());

    let reports = generator.generate_all(None).await.unwrap();
    assert_eq!(reports.len(), 1, "site without a base URL is skipped");

    for (file, expected) in [
        ("sitemap_1_blog.xml", 50),
        ("sitemap_1_blog_50.xml", 50),
        ("sitemap_1_blog_100.xml", 20),
    ] {
        let doc = parse_file(&dir.path().join(file)).unwrap();
        assert_eq!(doc.urls.len(), expected, "{file}");
    }

    let index = parse_file(&dir.path().join("sitemap_1.xml")).unwrap();
    assert_eq!(index.kind, SitemapKind::Index);
    let locations: Vec<_> = index.sitemaps.iter().map(|s| s.loc.as_str()).collect();
    assert_eq!(
        locations,
        [
            "https://example.com/sitemap_blog.xml",
            "https://example.com/sitemap_blog_50.xml",
            "https://example.com/sitemap_blog_100.xml",
        ]
    );
}

#[tokio::test]
async fn test_two_runs_are_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let mut items = blog_catalog(30);
    items.extend((1..=30).map(|id| entry("blog", id, 2, 2)));

    for dir in [&first, &second] {
        generator(items.clone(), vec![blog().with_image_field("hero")], 10, dir.path())
            .generate_all(None)
            .await
            .unwrap();
    }

    let mut names: Vec<_> = fs::read_dir(first.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    assert_eq!(names.len(), 8, "two indexes plus three chunks per site");

    for name in names {
        let a = fs::read(first.path().join(&name)).unwrap();
        let b = fs::read(second.path().join(&name)).unwrap();
        assert_eq!(a, b, "{name:?} differs between runs");
    }
}

#[tokio::test]
async fn test_item_without_url_is_skipped_without_shifting_others() {
    let dir = TempDir::new().unwrap();
    let mut items = blog_catalog(6);
    items[2]["url"] = Value::Null;

    let report = generator(items, vec![blog()], 3, dir.path())
        .generate(&sitemapper_core::Site {
            id: SiteId(1),
            handle: "en".to_string(),
            language: "en".to_string(),
            base_url: Some("https://example.com/".to_string()),
            has_urls: true,
        })
        .await
        .unwrap();
    assert_eq!(report.items_skipped, 1);
    assert_eq!(report.urls, 5);

    let first = parse_file(&dir.path().join("sitemap_1_blog.xml")).unwrap();
    let second = parse_file(&dir.path().join("sitemap_1_blog_3.xml")).unwrap();
    let locs: Vec<_> = first.urls.iter().chain(&second.urls).map(|u| u.loc.as_str()).collect();
    assert_eq!(
        locs,
        [
            "https://example.com/blog/1",
            "https://example.com/blog/2",
            "https://example.com/blog/4",
            "https://example.com/blog/5",
            "https://example.com/blog/6",
        ]
    );
}

#[tokio::test]
async fn test_alternates_are_symmetric_across_sites() {
    let dir = TempDir::new().unwrap();
    let mut items = blog_catalog(2);
    items.push(entry("blog", 1, 2, 5));

    generator(items, vec![blog()], 50, dir.path())
        .generate_all(None)
        .await
        .unwrap();

    let en = parse_file(&dir.path().join("sitemap_1_blog.xml")).unwrap();
    let de = parse_file(&dir.path().join("sitemap_2_blog.xml")).unwrap();
    assert!(en.declares(XHTML));
    assert!(de.declares(XHTML));

    let en_one = en.urls.iter().find(|u| u.loc.ends_with("/blog/1")).unwrap();
    assert_eq!(en_one.alternates.len(), 1);
    assert_eq!(en_one.alternates[0].language, "de");
    assert_eq!(en_one.alternates[0].url, de.urls[0].loc);

    assert_eq!(de.urls[0].alternates[0].language, "en");
    assert_eq!(de.urls[0].alternates[0].url, en_one.loc);

    let en_two = en.urls.iter().find(|u| u.loc.ends_with("/blog/2")).unwrap();
    assert!(en_two.alternates.is_empty());
}

#[tokio::test]
async fn test_news_alternates_are_symmetric_across_sites() {
    let dir = TempDir::new().unwrap();
    let items = vec![entry("news", 1, 1, 1), entry("news", 1, 2, 1)];
    let policies = vec![SourcePolicy::new(SourceKind::Section, "news").with_news(NewsPolicy::default())];

    generator(items, policies, 50, dir.path())
        .generate_all(None)
        .await
        .unwrap();

    let en = parse_file(&dir.path().join("sitemap_1_news.xml")).unwrap();
    let de = parse_file(&dir.path().join("sitemap_2_news.xml")).unwrap();
    for doc in [&en, &de] {
        assert!(doc.declares(XHTML));
        assert!(doc.declares(NEWS));
        assert_eq!(doc.urls.len(), 1);
        assert!(doc.urls[0].news.is_some());
        assert_eq!(doc.urls[0].alternates.len(), 1);
    }

    assert_eq!(en.urls[0].alternates[0].language, "de");
    assert_eq!(en.urls[0].alternates[0].url, de.urls[0].loc);
    assert_eq!(de.urls[0].alternates[0].language, "en");
    assert_eq!(de.urls[0].alternates[0].url, en.urls[0].loc);
}

#[tokio::test]
async fn test_index_lastmod_spans_all_sites() {
    let dir = TempDir::new().unwrap();
    let mut items = blog_catalog(2);
    items.push(entry("blog", 1, 2, 20));

    generator(items, vec![blog()], 50, dir.path())
        .generate_all(Some(SiteId(1)))
        .await
        .unwrap();

    let index = parse_file(&dir.path().join("sitemap_1.xml")).unwrap();
    assert_eq!(
        index.sitemaps[0].lastmod,
        Some(Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_image_and_news_never_share_a_document() {
    let dir = TempDir::new().unwrap();
    let mut items = blog_catalog(3);
    items.extend((10..13).map(|id| entry("news", id, 1, 3)));

    let policies = vec![
        blog().with_image_field("hero"),
        SourcePolicy::new(SourceKind::Section, "news")
            .with_image_field("hero")
            .with_news(NewsPolicy::default()),
    ];
    generator(items, policies, 50, dir.path())
        .generate_all(Some(SiteId(1)))
        .await
        .unwrap();

    let images = parse_file(&dir.path().join("sitemap_1_blog.xml")).unwrap();
    assert!(images.declares(IMAGE));
    assert!(!images.declares(NEWS));
    assert!(images.urls.iter().all(|u| u.image.is_some() && u.news.is_none()));

    let news = parse_file(&dir.path().join("sitemap_1_news.xml")).unwrap();
    assert!(news.declares(NEWS));
    assert!(!news.declares(IMAGE));
    assert!(news.urls.iter().all(|u| u.news.is_some() && u.image.is_none()));
    assert!(news.urls.iter().all(|u| u.priority.is_none()));
}

#[tokio::test]
async fn test_news_hook_fills_date_and_can_drop_items() {
    let dir = TempDir::new().unwrap();
    let mut items: Vec<Value> = (1..=3).map(|id| entry("news", id, 1, 1)).collect();
    items[0]["post_date"] = Value::Null;

    let filled = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
    let policies = vec![SourcePolicy::new(SourceKind::Section, "news").with_news(NewsPolicy::default())];
    let report = generator(items, policies, 50, dir.path())
        .with_news_hook(move |item: &ContentItem, mut payload: NewsPayload| {
            payload.publish_date.get_or_insert(filled);
            if item.id.0 == 3 {
                payload.location = None;
            }
            payload
        })
        .generate_all(Some(SiteId(1)))
        .await
        .unwrap();
    assert_eq!(report[0].items_skipped, 1);

    let doc = parse_file(&dir.path().join("sitemap_1_news.xml")).unwrap();
    assert_eq!(doc.urls.len(), 2);
    let first = doc.urls[0].news.as_ref().unwrap();
    assert_eq!(first.publication_date, Some(filled));
    assert_eq!(first.publication_name, "Ada");
}

#[tokio::test]
async fn test_query_refiner_narrows_every_query() {
    let dir = TempDir::new().unwrap();
    let mut items = blog_catalog(4);
    items[1]["fields"] = json!({ "featured": true });
    items[3]["fields"] = json!({ "featured": true });

    let hooks = QueryHooks::new().with_refiner(|query: ContentQuery, ctx: &QueryContext<'_>| {
        if ctx.purpose == QueryPurpose::Siblings {
            query
        } else {
            query.constraint("featured", true)
        }
    });
    let report = generator(items, vec![blog()], 50, dir.path())
        .with_query_hooks(hooks)
        .generate_all(Some(SiteId(1)))
        .await
        .unwrap();

    assert_eq!(report[0].urls, 2);
}

#[tokio::test]
async fn test_unavailable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let err = FileStore::new(blocker.join("sitemaps")).unwrap_err();
    assert!(err.is_fatal());
}
