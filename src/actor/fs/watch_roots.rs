use std::path::PathBuf;

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watch-root consistency manager.
///
/// Roots are the parent directories of the watched files. Watching the
/// directory instead of the file keeps editors that save by rename working.
///
/// Responsibility:
/// - Attach existing roots at startup
/// - Follow root changes when the deck's asset set changes
/// - Re-attach roots that were removed and recreated
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    /// Attach every existing root. A root that cannot be watched is
    /// skipped; `maintain` retries it later.
    pub(super) fn attach_existing<W: Watcher>(&mut self, watcher: &mut W) {
        for path in &self.desired {
            if !path.exists() {
                continue;
            }
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    self.attached.insert(path.clone());
                }
                Err(e) => crate::log!("watch"; "cannot watch {}: {}", path.display(), e),
            }
        }
    }

    /// Replace the desired root set, detaching roots no longer needed.
    pub(super) fn set_desired<W: Watcher>(&mut self, paths: Vec<PathBuf>, watcher: &mut W) {
        let stale: Vec<PathBuf> = self
            .attached
            .iter()
            .filter(|p| !paths.contains(p))
            .cloned()
            .collect();
        for path in stale {
            let _ = watcher.unwatch(&path);
            self.attached.remove(&path);
            crate::debug!("watch"; "detached: {}", path.display());
        }
        self.desired = paths;
        self.maintain(watcher);
    }

    pub(super) fn maintain<W: Watcher>(&mut self, watcher: &mut W) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }

            if watcher.watch(path, RecursiveMode::NonRecursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "attached: {}", path.display());
            }
        }
    }
}
