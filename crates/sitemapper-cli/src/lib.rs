//! sitemapper CLI - paginated, multi-site XML sitemaps
//!
//! Entry point for the `sitemapper` command-line interface. Commands live in
//! their own modules; this file parses arguments, sets up logging and
//! dispatches.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
pub mod error;
mod output;
mod utils;

use crate::utils::initialize_logging;
use cli::{Cli, Commands};

/// Execute the sitemapper CLI with the current arguments and environment.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized or the command fails.
/// Use [`error::exit_code_from_error`] to turn it into an exit code.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    match cli.command {
        Commands::Generate {
            site,
            catalog,
            output,
            format,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::generate(&config, site, catalog, output, format).await
        },
        Commands::Plan {
            site,
            catalog,
            format,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::plan(&config, site, catalog, format).await
        },
        Commands::Inspect { file, format } => commands::inspect(&file, format),
    }
}
