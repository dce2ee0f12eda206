use std::path::{Path, PathBuf};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::time::Instant;

use super::types::ChangeKind;

/// Sleep used when nothing is pending
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing and event deduplication.
///
/// A batch becomes ready once `window` has passed since the most recent
/// accepted event; every new event restarts the window.
pub(super) struct Debouncer {
    window: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Removed + Created/Modified → the new kind (file was restored)
    /// - Modified + Removed → Removed
    /// - Created + Removed → dropped (appeared and vanished)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.add(path.clone(), kind);
        }
    }

    fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        match self.changes.get(&path).copied() {
            None => {
                crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                self.changes.remove(&path);
            }
            Some(_) => {}
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the pending batch if the window has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.window {
            return None;
        }

        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    pub(super) fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Precise sleep duration until the pending batch becomes ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}
