//! Inspect command implementation

use anyhow::Result;
use colored::Colorize;
use sitemapper_core::reader::{ParsedSitemap, SitemapKind, parse_file};
use std::path::Path;

use crate::error::CliError;
use crate::output::{OutputFormat, print_json};

/// Execute the inspect command
pub fn execute(file: &Path, format: OutputFormat) -> Result<()> {
    let sitemap = parse_file(file).map_err(CliError::from)?;

    match format {
        OutputFormat::Text => print_text(file, &sitemap),
        OutputFormat::Json => print_json(&sitemap)?,
    }
    Ok(())
}

fn print_text(file: &Path, sitemap: &ParsedSitemap) {
    println!("{}", file.display().to_string().bold());

    match sitemap.kind {
        SitemapKind::Index => {
            println!("  sitemap index, {} documents", sitemap.sitemaps.len());
            for entry in &sitemap.sitemaps {
                let lastmod = entry
                    .lastmod
                    .map(|date| date.to_rfc3339())
                    .unwrap_or_default();
                println!("  {}  {}", entry.loc, lastmod.dimmed());
            }
        },
        SitemapKind::Urlset => {
            let alternates: usize = sitemap.urls.iter().map(|url| url.alternates.len()).sum();
            let images = sitemap.urls.iter().filter(|url| url.image.is_some()).count();
            let news = sitemap.urls.iter().filter(|url| url.news.is_some()).count();

            println!("  urlset, {} URLs", sitemap.urls.len());
            println!("  namespaces: {}", sitemap.namespaces.join(" "));
            println!("  alternates: {alternates}, images: {images}, news: {news}");
        },
    }
}
