use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::deck::DeckStore;
use crate::deck::parse::watched_files;

/// Decides which file events concern the presentation.
///
/// The watch set is the source file plus the assets of the installed deck,
/// so it is refreshed whenever the store installs a new version.
pub(super) struct WatchFilter {
    source: PathBuf,
    store: Arc<DeckStore>,
    version: Option<u64>,
    files: FxHashSet<PathBuf>,
}

impl WatchFilter {
    pub(super) fn new(source: &Path, store: Arc<DeckStore>) -> Self {
        let mut filter = Self {
            source: normalize_path(source),
            store,
            version: None,
            files: FxHashSet::default(),
        };
        filter.refresh();
        filter
    }

    /// Rebuild the watch set if the installed deck changed.
    ///
    /// Returns the directories to watch when the set changed.
    pub(super) fn refresh(&mut self) -> Option<Vec<PathBuf>> {
        let deck = self.store.current();
        let version = deck.as_ref().map(|d| d.version);
        if self.version == Some(version.unwrap_or(0)) {
            return None;
        }
        self.version = Some(version.unwrap_or(0));

        self.files = watched_files(&self.source, deck.as_deref())
            .iter()
            .map(|p| normalize_path(p))
            .collect();
        Some(self.roots())
    }

    /// Parent directories of the watched files, deduplicated.
    pub(super) fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .files
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    /// Keep only the event paths that belong to the watch set.
    ///
    /// Returns `false` when nothing relevant is left.
    pub(super) fn retain(&self, event: &mut notify::Event) -> bool {
        event
            .paths
            .retain(|p| self.files.contains(&normalize_path(p)));
        !event.paths.is_empty()
    }
}

/// Absolute, symlink-resolved form of `path`.
///
/// Files that no longer exist resolve through their parent directory so that
/// remove events still match.
pub(super) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }
    lexical_absolute(path)
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
