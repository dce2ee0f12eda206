//! Actor Message Definitions
//!
//! ```text
//! FsActor --Rebuild--> RebuildActor --reload--> Hub
//! ```

use std::path::PathBuf;

/// Messages to the Rebuild Actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildMsg {
    /// Re-parse the presentation; `changed` is informational
    Rebuild { changed: Vec<PathBuf> },
    /// Stop after the current rebuild
    Shutdown,
}
