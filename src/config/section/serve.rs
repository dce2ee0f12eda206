//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! ws_port = 35729             # WebSocket hub port
//! presenter_secret = "s3cret" # Require ?key=s3cret for /presenter
//! ```
//!
//! Use `interface = "0.0.0.0"` so phones and a second laptop on the LAN can
//! follow along.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Default WebSocket port for the sync hub
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind (HTTP and WebSocket).
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket hub port.
    pub ws_port: u16,

    /// Shared secret for the presenter view. Empty = ungated.
    pub presenter_secret: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            ws_port: DEFAULT_WS_PORT,
            presenter_secret: String::new(),
        }
    }
}

impl ServeConfig {
    /// Whether `key` unlocks the presenter view.
    pub fn presenter_allowed(&self, key: Option<&str>) -> bool {
        self.presenter_secret.is_empty() || key == Some(self.presenter_secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 9000\npresenter_secret = \"k\"",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 9000);
        assert_eq!(config.serve.presenter_secret, "k");
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.serve.ws_port, super::DEFAULT_WS_PORT);
        assert!(config.serve.presenter_secret.is_empty());
    }

    #[test]
    fn test_presenter_gate() {
        let open = test_parse_config("");
        assert!(open.serve.presenter_allowed(None));
        assert!(open.serve.presenter_allowed(Some("anything")));

        let gated = test_parse_config("[serve]\npresenter_secret = \"s3cret\"");
        assert!(!gated.serve.presenter_allowed(None));
        assert!(!gated.serve.presenter_allowed(Some("wrong")));
        assert!(gated.serve.presenter_allowed(Some("s3cret")));
    }
}
