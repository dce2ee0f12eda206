//! Sync Module
//!
//! Wire protocol shared by the hub (server side) and the reconnecting
//! client. One JSON message per WebSocket text frame.
//!
//! ```text
//! Rebuild --reload--> Hub --reload--> every client
//! Client A --slide--> Hub --slide--> every client except A
//! ```

pub mod message;

pub use message::SyncMessage;
