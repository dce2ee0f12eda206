//! Last-good presentation store.
//!
//! Readers (HTTP handlers, the watcher's asset filter) load the current
//! presentation lock-free; the rebuild actor is the only writer. A failed
//! rebuild never touches the installed presentation, it only records a
//! diagnostic.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Serialize;

use super::{DeckError, Presentation};

/// Latest rebuild failure, surfaced through `/diagnostics.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildFailure {
    pub path: PathBuf,
    pub message: String,
    /// Seconds since the Unix epoch
    pub at: u64,
}

impl RebuildFailure {
    pub fn new(path: PathBuf, error: &DeckError) -> Self {
        let at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            path,
            message: error.detail(),
            at,
        }
    }
}

/// Holds the live presentation and the last rebuild diagnostic.
#[derive(Default)]
pub struct DeckStore {
    current: ArcSwapOption<Presentation>,
    versions: AtomicU64,
    failure: Mutex<Option<RebuildFailure>>,
}

impl DeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current presentation, if one was ever installed.
    pub fn current(&self) -> Option<Arc<Presentation>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Install a new presentation and clear the diagnostic.
    ///
    /// Returns the assigned version (starting at 1).
    pub fn install(&self, mut deck: Presentation) -> u64 {
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        deck.version = version;
        self.current.store(Some(Arc::new(deck)));
        *self.failure.lock() = None;
        version
    }

    /// Record a failed rebuild, keeping the installed presentation.
    pub fn record_failure(&self, failure: RebuildFailure) {
        *self.failure.lock() = Some(failure);
    }

    pub fn last_failure(&self) -> Option<RebuildFailure> {
        self.failure.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Slide;

    fn deck(title: &str) -> Presentation {
        Presentation {
            title: title.into(),
            slides: vec![Slide::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_install_assigns_versions() {
        let store = DeckStore::new();
        assert!(!store.is_loaded());

        assert_eq!(store.install(deck("a")), 1);
        assert_eq!(store.install(deck("b")), 2);

        let current = store.current().unwrap();
        assert_eq!(current.title, "b");
        assert_eq!(current.version, 2);
    }

    #[test]
    fn test_failure_keeps_last_good() {
        let store = DeckStore::new();
        store.install(deck("good"));

        let err = DeckError::UnclosedFence { line: 3 };
        store.record_failure(RebuildFailure::new("talk.md".into(), &err));

        assert_eq!(store.current().unwrap().title, "good");
        let failure = store.last_failure().unwrap();
        assert_eq!(failure.message, "unclosed code fence opened at line 3");

        store.install(deck("fixed"));
        assert!(store.last_failure().is_none());
    }

    #[test]
    fn test_reader_keeps_old_snapshot_alive() {
        let store = DeckStore::new();
        store.install(deck("old"));
        let held = store.current().unwrap();

        store.install(deck("new"));
        assert_eq!(held.title, "old");
        assert_eq!(store.current().unwrap().title, "new");
    }
}
