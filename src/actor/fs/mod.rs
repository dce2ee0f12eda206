//! FileSystem Actor
//!
//! Watches the presentation source and its assets, and sends one debounced
//! rebuild request per burst of changes to the RebuildActor.
//!
//! Architecture:
//! ```text
//! notify → bridge thread → WatchFilter → Debouncer (pure timing) → RebuildMsg
//! ```
//!
//! Directories are watched, not files: editors that save by rename replace
//! the inode, and a removed asset must be picked up again once it returns.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::messages::RebuildMsg;
use crate::deck::DeckStore;

// Pure timing and deduplication.
mod debouncer;
// Event path filtering against the deck's watch set.
mod filter;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


use debouncer::Debouncer;
use filter::WatchFilter;
use types::ChangeKind;
use watch_roots::WatchRoots;

/// Capacity of the notify → actor bridge
const EVENT_BUFFER: usize = 64;

/// Upper bound on idle sleeps, so watch roots follow newly installed decks
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// FileSystem Actor - watches the deck for changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    filter: WatchFilter,
    rebuild_tx: mpsc::Sender<RebuildMsg>,
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor; the watcher starts buffering immediately.
    pub fn new(
        source: &Path,
        store: Arc<DeckStore>,
        debounce: Duration,
        rebuild_tx: mpsc::Sender<RebuildMsg>,
    ) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let filter = WatchFilter::new(source, store);
        let mut watch_roots = WatchRoots::new(filter.roots());
        watch_roots.attach_existing(&mut watcher);

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            filter,
            rebuild_tx,
            debouncer: Debouncer::new(debounce),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let (async_tx, async_rx) = mpsc::channel::<notify::Event>(EVENT_BUFFER);

        // Bridge thread: blocking notify receiver → async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;
        debounce_loop(
            async_rx,
            self.debouncer,
            self.filter,
            self.rebuild_tx,
            move |roots| match roots {
                Some(roots) => watch_roots.set_desired(roots, &mut watcher),
                None => watch_roots.maintain(&mut watcher),
            },
        )
        .await;

        crate::debug!("watch"; "stopped");
    }
}

/// Core loop, independent of the OS watcher.
///
/// `on_roots` receives the new root set when the deck's watch set changed,
/// or `None` as a periodic re-attach tick.
async fn debounce_loop<F>(
    mut events: mpsc::Receiver<notify::Event>,
    mut debouncer: Debouncer,
    mut filter: WatchFilter,
    rebuild_tx: mpsc::Sender<RebuildMsg>,
    mut on_roots: F,
) where
    F: FnMut(Option<Vec<PathBuf>>),
{
    let mut events_open = true;

    while events_open || debouncer.is_pending() {
        tokio::select! {
            biased;
            event = events.recv(), if events_open => match event {
                Some(mut event) => {
                    if let Some(roots) = filter.refresh() {
                        on_roots(Some(roots));
                    }
                    if filter.retain(&mut event) {
                        debouncer.add_event(&event);
                    }
                }
                None => events_open = false,
            },
            _ = tokio::time::sleep(debouncer.sleep_duration().min(MAINTAIN_INTERVAL)) => {
                on_roots(filter.refresh());
                if let Some(changes) = debouncer.take_if_ready() {
                    log_changes(&changes);
                    let changed = changes.into_keys().collect();
                    if rebuild_tx.send(RebuildMsg::Rebuild { changed }).await.is_err() {
                        break; // RebuildActor gone
                    }
                }
            }
        }
    }
}

fn log_changes(changes: &FxHashMap<PathBuf, ChangeKind>) {
    for (path, kind) in changes {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("watch"; "{}: {}", kind.label(), name);
    }
}
