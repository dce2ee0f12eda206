use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::RebuildMsg;
use crate::actor::rebuild::RebuildActor;

/// Interval for polling the shutdown signal
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run all actors concurrently.
pub(super) async fn run_actors(
    fs: FsActor,
    rebuild: RebuildActor,
    rebuild_tx: mpsc::Sender<RebuildMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let rebuild_handle = tokio::spawn(async move { rebuild.run().await });
    let fs_handle = tokio::spawn(async move { fs.run().await });

    match shutdown_rx {
        Some(rx) => loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL).await;
        },
        None => {
            let _ = fs_handle.await;
        }
    }

    // Let an in-flight rebuild finish before exiting.
    let _ = rebuild_tx.send(RebuildMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), rebuild_handle).await;

    Ok(())
}
