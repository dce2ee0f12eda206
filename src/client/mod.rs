//! Client side of slide synchronization.
//!
//! Everything a viewer window needs, independent of how it renders:
//!
//! - [`backoff`]: reconnect scheduling (1s doubling up to 30s by default)
//! - [`connection`]: the reconnecting WebSocket client task and its handle
//! - [`nav`]: the slide/fragment navigation state machine
//! - [`hash`]: the `#N` URL fragment contract
//! - [`session`]: one window's loaded presentation and position
//!
//! The terminal remote (`deckhand remote`) is built on these.

pub mod backoff;
pub mod connection;
pub mod hash;
pub mod nav;
pub mod session;


pub use backoff::{BackoffConfig, ReconnectState};
pub use connection::{ClientEvent, ClientHandle, ReconnectingClient};
pub use hash::{Location, MemoryLocation};
pub use nav::{NavigationState, Navigator, SlideSink, Transition};
pub use session::{Inbound, Session};
