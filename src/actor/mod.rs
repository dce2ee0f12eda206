//! Actor System for live rebuilds
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> RebuildActor --> Hub
//! (watch)       (parse)      (reload)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `rebuild` - Serialized parse + publish
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod rebuild;

pub use coordinator::Coordinator;
pub use rebuild::{RebuildOutcome, rebuild_now};
