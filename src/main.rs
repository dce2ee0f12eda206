//! deckhand - markdown slides with live reload and synchronized navigation.

mod actor;
mod cli;
mod client;
mod config;
mod core;
mod deck;
mod embed;
mod hub;
mod logger;
mod sync;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DeckConfig;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(DeckConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { file, .. } => cli::serve::serve_deck(config, file),
        Commands::Remote { url, ws, start } => {
            cli::remote::run_remote(&config, url, ws.as_deref(), start.as_deref())
        }
    }
}
