//! `[hub]` section configuration.
//!
//! ```toml
//! [hub]
//! outbox_capacity = 16   # Per-connection queue; oldest frame dropped on overflow
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Broadcast hub settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub outbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 16,
        }
    }
}

impl HubConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.outbox_capacity == 0 {
            return Err(ConfigError::invalid(
                "hub.outbox_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
