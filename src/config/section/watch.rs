//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! enabled = true      # Rebuild on source/asset changes
//! debounce_ms = 100   # Quiet period before a burst triggers one rebuild
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Default quiet period before a burst of changes triggers a rebuild
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::invalid(
                "watch.debounce_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert!(config.watch.enabled);
        assert_eq!(config.watch.debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let config = test_parse_config("[watch]\ndebounce_ms = 0");
        assert!(config.watch.validate().is_err());
    }
}
