//! Configuration section definitions.
//!
//! Each module corresponds to a section in `deckhand.toml`:
//!
//! | Module   | TOML Section | Purpose                                |
//! |----------|--------------|----------------------------------------|
//! | `serve`  | `[serve]`    | HTTP + WebSocket endpoints             |
//! | `watch`  | `[watch]`    | File watching and debounce window      |
//! | `hub`    | `[hub]`      | Broadcast hub queue sizing             |
//! | `client` | `[client]`   | Reconnect backoff of the remote client |

mod client;
mod hub;
mod serve;
mod watch;

pub use client::ClientConfig;
pub use hub::HubConfig;
pub use serve::{DEFAULT_WS_PORT, ServeConfig};
pub use watch::{DEFAULT_DEBOUNCE_MS, WatchConfig};
