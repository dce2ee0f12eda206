//! Server lifecycle management.

use crate::{
    actor::Coordinator,
    config::DeckConfig,
    core::register_server,
    deck::{DeckParser, DeckStore},
    hub::Hub,
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
///
/// Port `0` asks the OS for a free port.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    let mut last_error = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        attempts,
        base_port,
        base_port.saturating_add(attempts - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed, the handler unblocks the server and notifies actors.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Everything the watch pipeline needs.
pub struct ActorSetup {
    pub source: PathBuf,
    pub parser: Arc<dyn DeckParser>,
    pub store: Arc<DeckStore>,
    pub hub: Arc<Hub>,
    pub debounce: Duration,
}

/// Spawn the actor system for file watching and live reload.
pub fn spawn_actors(
    config: &DeckConfig,
    setup: ActorSetup,
    shutdown_rx: Receiver<()>,
) -> Result<Option<JoinHandle<()>>> {
    if !config.watch.enabled {
        return Ok(None);
    }

    let handle = thread::Builder::new()
        .name("actors".into())
        .spawn(move || run_actor_system(setup, shutdown_rx))
        .context("failed to spawn actor thread")?;
    Ok(Some(handle))
}

fn run_actor_system(setup: ActorSetup, shutdown_rx: Receiver<()>) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let coordinator = Coordinator::new(setup.source, setup.parser, setup.store, setup.hub)
            .with_debounce(setup.debounce)
            .with_shutdown_signal(shutdown_rx);
        if let Err(e) = coordinator.run().await {
            log!("error"; "watcher stopped: {}", e);
        }
    });
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
