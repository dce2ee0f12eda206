//! `[client]` section configuration.
//!
//! Reconnect backoff for `deckhand remote`.
//!
//! ```toml
//! [client]
//! initial_delay_ms = 1000
//! max_delay_ms = 30000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::BackoffConfig;
use crate::config::ConfigError;

/// Remote client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let backoff = BackoffConfig::default();
        Self {
            initial_delay_ms: backoff.initial.as_millis() as u64,
            max_delay_ms: backoff.max.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::invalid(
                "client.initial_delay_ms",
                "must be greater than 0",
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::invalid(
                "client.max_delay_ms",
                format!(
                    "must not be below initial_delay_ms ({})",
                    self.initial_delay_ms
                ),
            ));
        }
        Ok(())
    }
}
