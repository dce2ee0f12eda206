//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
const DEFAULT_CONFIG: &str = "deckhand.toml";

/// deckhand markdown slide server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output (dropped frames, hub registrations, raw fs events)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: deckhand.toml, optional)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve a deck with live reload and synchronized navigation
    #[command(visible_alias = "s")]
    Serve {
        /// Markdown source of the presentation
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// HTTP port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// WebSocket hub port
        #[arg(long)]
        ws_port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Control a running deck from the terminal
    #[command(visible_alias = "r")]
    Remote {
        /// HTTP address of the deck server (e.g., http://127.0.0.1:5277)
        url: String,

        /// WebSocket hub address (default: same host, default hub port)
        #[arg(long)]
        ws: Option<String>,

        /// Initial location hash, e.g. '#3'
        #[arg(long)]
        start: Option<String>,
    },
}

impl Cli {
    /// Config file to load, explicit or default.
    pub fn config_file(&self) -> &Path {
        self.config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from(["deckhand", "serve", "talk.md", "-p", "8080", "--watch"]);
        match &cli.command {
            Commands::Serve {
                file, port, watch, ..
            } => {
                assert_eq!(*file, PathBuf::from("talk.md"));
                assert_eq!(*port, Some(8080));
                assert_eq!(*watch, Some(true));
            }
            _ => panic!("expected serve"),
        }
        assert_eq!(cli.config_file(), Path::new("deckhand.toml"));
    }

    #[test]
    fn test_remote_args() {
        let cli = Cli::parse_from([
            "deckhand",
            "-C",
            "conf/deck.toml",
            "remote",
            "http://10.0.0.2:5277",
            "--start",
            "#4",
        ]);
        assert_eq!(cli.config_file(), Path::new("conf/deck.toml"));
        match cli.command {
            Commands::Remote { url, ws, start } => {
                assert_eq!(url, "http://10.0.0.2:5277");
                assert_eq!(ws, None);
                assert_eq!(start.as_deref(), Some("#4"));
            }
            _ => panic!("expected remote"),
        }
    }
}
