//! Generate command implementation

use anyhow::Result;
use colored::Colorize;
use sitemapper_core::{Config, FileStore, GenerationReport, SiteId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{build_generator, load_catalog};
use crate::error::CliError;
use crate::output::{OutputFormat, print_json};

/// Execute the generate command
pub async fn execute(
    config: &Config,
    site: Option<u32>,
    catalog: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let catalog = load_catalog(config, catalog)?;
    let output = output.unwrap_or_else(|| config.paths.output.clone());
    let store = Arc::new(FileStore::new(&output).map_err(CliError::from)?);

    let generator = build_generator(config, catalog, store);
    let reports = generator
        .generate_all(site.map(SiteId))
        .await
        .map_err(CliError::from)?;
    info!(sites = reports.len(), output = %output.display(), "generation finished");

    match format {
        OutputFormat::Text => print_text(&reports, &output),
        OutputFormat::Json => print_json(&reports)?,
    }
    Ok(())
}

fn print_text(reports: &[GenerationReport], output: &std::path::Path) {
    if reports.is_empty() {
        println!("No publishable sites.");
        return;
    }

    for report in reports {
        println!(
            "{} {} ({} documents, {} URLs)",
            "✓".green(),
            output.join(&report.index).display().to_string().bold(),
            report.documents.len(),
            report.urls,
        );
        for document in &report.documents {
            println!("  {document}");
        }
        if report.items_skipped > 0 {
            println!("  {} items skipped", report.items_skipped.to_string().yellow());
        }
        if report.stale_removed > 0 {
            println!("  {} stale documents removed", report.stale_removed);
        }
        if report.chunks_failed > 0 || report.sources_failed > 0 {
            println!(
                "  {} chunks and {} sources failed; see log output",
                report.chunks_failed.to_string().red(),
                report.sources_failed.to_string().red(),
            );
        }
    }
}
