//! Rebuild Actor
//!
//! Serializes rebuilds: at most one parse runs at a time, and requests that
//! queue up during a parse collapse into a single follow-up rebuild.
//!
//! ```text
//! RebuildMsg --> parse (blocking pool) --Ok--> store.install + hub reload
//!                                     \--Err-> store.record_failure
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::messages::RebuildMsg;
use crate::deck::{DeckError, DeckParser, DeckStore, Presentation, RebuildFailure};
use crate::hub::Hub;
use crate::logger::{status_error, status_success};
use crate::sync::SyncMessage;

/// Outcome of a single rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// New presentation installed under this version
    Installed(u64),
    /// Parse failed; the previous presentation stays live
    Failed,
}

/// Rebuild Actor - parses the source and publishes the result
pub struct RebuildActor {
    rx: mpsc::Receiver<RebuildMsg>,
    source: PathBuf,
    parser: Arc<dyn DeckParser>,
    store: Arc<DeckStore>,
    hub: Arc<Hub>,
}

impl RebuildActor {
    pub fn new(
        rx: mpsc::Receiver<RebuildMsg>,
        source: PathBuf,
        parser: Arc<dyn DeckParser>,
        store: Arc<DeckStore>,
        hub: Arc<Hub>,
    ) -> Self {
        Self {
            rx,
            source,
            parser,
            store,
            hub,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let RebuildMsg::Rebuild { mut changed } = msg else {
                break;
            };

            // Collapse requests that queued up while the last parse ran.
            let mut shutdown = false;
            while let Ok(more) = self.rx.try_recv() {
                match more {
                    RebuildMsg::Rebuild { changed: paths } => changed.extend(paths),
                    RebuildMsg::Shutdown => {
                        shutdown = true;
                        break;
                    }
                }
            }

            crate::debug!("rebuild"; "{} changed path(s)", changed.len());
            self.rebuild().await;

            if shutdown {
                break;
            }
        }
        crate::debug!("rebuild"; "stopped");
    }

    async fn rebuild(&self) -> RebuildOutcome {
        let parser = Arc::clone(&self.parser);
        let source = self.source.clone();
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || parser.parse(&source)).await;
        match result {
            Ok(parsed) => publish(parsed, &self.source, &self.store, &self.hub, started),
            Err(e) => {
                crate::log!("error"; "rebuild task panicked: {}", e);
                RebuildOutcome::Failed
            }
        }
    }
}

/// Parse synchronously and publish (initial build before the actors start).
pub fn rebuild_now(
    parser: &dyn DeckParser,
    source: &Path,
    store: &DeckStore,
    hub: &Hub,
) -> RebuildOutcome {
    let started = Instant::now();
    publish(parser.parse(source), source, store, hub, started)
}

/// Install a successful parse and notify clients, or record the failure.
fn publish(
    parsed: Result<Presentation, DeckError>,
    source: &Path,
    store: &DeckStore,
    hub: &Hub,
    started: Instant,
) -> RebuildOutcome {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    match parsed {
        Ok(deck) => {
            let slides = deck.len();
            let version = store.install(deck);
            let clients = hub.broadcast(&SyncMessage::Reload, None);
            status_success(&format!(
                "{}: {} slides, v{} in {:?} ({} client(s) reloaded)",
                name,
                slides,
                version,
                started.elapsed(),
                clients
            ));
            RebuildOutcome::Installed(version)
        }
        Err(err) => {
            let failure = RebuildFailure::new(source.to_path_buf(), &err);
            status_error(&format!("{}: rebuild failed", name), &failure.message);
            store.record_failure(failure);
            RebuildOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::MarkdownParser;
    use crate::hub::{Inbox, outbox};
    use tempfile::TempDir;
    use tungstenite::protocol::Message;

    fn setup(content: &str) -> (TempDir, PathBuf, Arc<DeckStore>, Arc<Hub>, Inbox) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("talk.md");
        std::fs::write(&source, content).unwrap();

        let hub = Arc::new(Hub::new(8));
        let (tx, inbox) = outbox(8);
        hub.register(tx);
        (temp, source, Arc::new(DeckStore::new()), hub, inbox)
    }

    fn reloads(inbox: &Inbox) -> usize {
        let mut n = 0;
        while let Some(msg) = inbox.try_pop() {
            if let Message::Text(t) = msg
                && SyncMessage::from_json(t.as_str()) == Some(SyncMessage::Reload)
            {
                n += 1;
            }
        }
        n
    }

    #[test]
    fn test_success_installs_and_broadcasts() {
        let (_temp, source, store, hub, inbox) = setup("# A\n---\n# B\n");

        let outcome = rebuild_now(&MarkdownParser, &source, &store, &hub);
        assert_eq!(outcome, RebuildOutcome::Installed(1));
        assert_eq!(store.current().unwrap().len(), 2);
        assert_eq!(reloads(&inbox), 1);
    }

    #[test]
    fn test_failure_keeps_last_good_without_broadcast() {
        let (_temp, source, store, hub, inbox) = setup("# A\n---\n# B\n");
        rebuild_now(&MarkdownParser, &source, &store, &hub);
        reloads(&inbox);

        std::fs::write(&source, "# A\n```\nunclosed\n").unwrap();
        let outcome = rebuild_now(&MarkdownParser, &source, &store, &hub);

        assert_eq!(outcome, RebuildOutcome::Failed);
        assert_eq!(store.current().unwrap().len(), 2);
        assert!(store.last_failure().is_some());
        assert_eq!(reloads(&inbox), 0);
    }

    #[test]
    fn test_initial_failure_leaves_store_empty() {
        let (_temp, source, store, hub, inbox) = setup("");

        assert_eq!(
            rebuild_now(&MarkdownParser, &source, &store, &hub),
            RebuildOutcome::Failed
        );
        assert!(!store.is_loaded());
        assert_eq!(reloads(&inbox), 0);
    }

    #[tokio::test]
    async fn test_queued_requests_collapse() {
        let (_temp, source, store, hub, inbox) = setup("# A\n");
        let (tx, rx) = mpsc::channel(8);
        let actor = RebuildActor::new(
            rx,
            source,
            Arc::new(MarkdownParser),
            Arc::clone(&store),
            Arc::clone(&hub),
        );

        for _ in 0..3 {
            tx.send(RebuildMsg::Rebuild { changed: vec![] }).await.unwrap();
        }
        tx.send(RebuildMsg::Shutdown).await.unwrap();
        actor.run().await;

        assert_eq!(store.current().unwrap().version, 1);
        assert_eq!(reloads(&inbox), 1);
    }
}
