//! Plan command implementation

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sitemapper_core::storage::{chunk_file_name, index_file_name};
use sitemapper_core::{Config, DocumentStore, Error, SiteId};
use std::path::PathBuf;
use std::sync::Arc;

use super::{build_generator, load_catalog};
use crate::error::CliError;
use crate::output::{OutputFormat, print_json};

/// Store for runs that only count and plan.
struct DryRun;

impl DocumentStore for DryRun {
    fn save(&self, name: &str, _xml: &str) -> sitemapper_core::Result<()> {
        Err(Error::Storage(format!("dry run cannot write {name}")))
    }

    fn exists(&self, _name: &str) -> bool {
        false
    }

    fn list(&self) -> sitemapper_core::Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn remove(&self, name: &str) -> sitemapper_core::Result<()> {
        Err(Error::Storage(format!("dry run cannot remove {name}")))
    }
}

#[derive(Debug, Serialize)]
struct SitePlan {
    site: SiteId,
    handle: String,
    index: String,
    sources: Vec<SourceSummary>,
}

#[derive(Debug, Serialize)]
struct SourceSummary {
    source: String,
    total: usize,
    documents: Vec<String>,
}

/// Execute the plan command
pub async fn execute(
    config: &Config,
    site: Option<u32>,
    catalog: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let catalog = load_catalog(config, catalog)?;
    let generator = build_generator(config, catalog, Arc::new(DryRun));

    let mut plans = Vec::new();
    for site in generator.sites(site.map(SiteId)).await.map_err(CliError::from)? {
        let sources = generator
            .plan_site(&site)
            .await
            .into_iter()
            .map(|plan| SourceSummary {
                source: plan.policy.source_ref().to_string(),
                total: plan.total,
                documents: plan
                    .chunks
                    .iter()
                    .map(|chunk| chunk_file_name(site.id, &chunk.base_name))
                    .collect(),
            })
            .collect();

        plans.push(SitePlan {
            site: site.id,
            handle: site.handle,
            index: index_file_name(site.id),
            sources,
        });
    }

    match format {
        OutputFormat::Text => print_text(&plans),
        OutputFormat::Json => print_json(&plans)?,
    }
    Ok(())
}

fn print_text(plans: &[SitePlan]) {
    if plans.is_empty() {
        println!("No publishable sites.");
        return;
    }

    for plan in plans {
        println!("{} {} ({})", "Site".bold(), plan.site, plan.handle.cyan());
        println!("  index: {}", plan.index);
        for source in &plan.sources {
            println!(
                "  {:<24} {:>8} items  {}",
                source.source,
                source.total,
                source.documents.join(", ").dimmed()
            );
        }
    }
}
