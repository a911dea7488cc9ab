//! Command-line interface definitions for sitemapper.
//!
//! The CLI is a thin shell over `sitemapper-core`:
//!
//! - `generate` writes every chunk document and the per-site index
//! - `plan` counts sources and lists the documents a run would write
//! - `inspect` reads back a written sitemap or index
//!
//! Settings come from the configuration file (see `sitemapper_core::config`);
//! `--catalog` and `--output` override the paths it names.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Root command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "Generate paginated, multi-site XML sitemaps", long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SITEMAPPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate sitemap documents and indexes
    Generate {
        /// Only generate this site
        #[arg(long)]
        site: Option<u32>,

        /// Content catalog (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for the run summary
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the documents a run would write, without writing them
    Plan {
        /// Only plan this site
        #[arg(long)]
        site: Option<u32>,

        /// Content catalog (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Summarize a written sitemap or sitemap index
    Inspect {
        /// Document to read
        file: PathBuf,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl Commands {
    /// Output format selected for this command.
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Generate { format, .. } | Self::Plan { format, .. } | Self::Inspect { format, .. } => {
                *format
            },
        }
    }
}
