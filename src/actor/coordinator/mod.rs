//! Actor Coordinator - Wires up the live rebuild pipeline
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Wires up actors
//! - Runs them until shutdown

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::RebuildMsg;
use super::rebuild::RebuildActor;
use crate::deck::{DeckParser, DeckStore};
use crate::hub::Hub;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    source: PathBuf,
    parser: Arc<dyn DeckParser>,
    store: Arc<DeckStore>,
    hub: Arc<Hub>,
    debounce: Duration,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        source: PathBuf,
        parser: Arc<dyn DeckParser>,
        store: Arc<DeckStore>,
        hub: Arc<Hub>,
    ) -> Self {
        Self {
            source,
            parser,
            store,
            hub,
            debounce: Duration::from_millis(crate::config::section::DEFAULT_DEBOUNCE_MS),
            shutdown_rx: None,
        }
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (rebuild_tx, rebuild_rx) = mpsc::channel::<RebuildMsg>(CHANNEL_BUFFER);

        let fs_actor = FsActor::new(
            &self.source,
            Arc::clone(&self.store),
            self.debounce,
            rebuild_tx.clone(),
        )
        .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;

        let rebuild_actor = RebuildActor::new(
            rebuild_rx,
            self.source.clone(),
            Arc::clone(&self.parser),
            Arc::clone(&self.store),
            Arc::clone(&self.hub),
        );

        crate::debug!("actor"; "start (debounce {:?})", self.debounce);
        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actor, rebuild_actor, rebuild_tx, shutdown_rx).await?;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
