//! Configuration management for `deckhand.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/   # [serve], [watch], [hub], [client]
//! ├── error.rs   # ConfigError
//! └── mod.rs     # DeckConfig (this file)
//! ```
//!
//! The file is optional: without it every section uses its defaults.
//! Command-line flags are applied on top of the file values.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{ClientConfig, HubConfig, ServeConfig, WatchConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing deckhand.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    /// Absolute path to the config file, empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl DeckConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// A missing default config file means defaults; a config file named
    /// explicitly with `--config` must exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let path = cwd.join(cli.config_file());

        let mut config = if path.is_file() {
            let mut config = Self::from_path(&path)?;
            config.config_path = path;
            config
        } else if cli.config.is_some() {
            return Err(ConfigError::Io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            )
            .into());
        } else {
            Self::default()
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Apply command-line overrides.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            ws_port,
            watch,
            ..
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(ws_port) = ws_port {
                self.serve.ws_port = *ws_port;
            }
            if let Some(watch) = watch {
                self.watch.enabled = *watch;
            }
        }
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watch.validate()?;
        self.hub.validate()?;
        self.client.validate()?;
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DeckConfig {
    let (parsed, ignored) = DeckConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
