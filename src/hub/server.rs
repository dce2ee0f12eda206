//! WebSocket server for the broadcast hub.
//!
//! An acceptor thread hands each incoming socket to its own connection
//! thread; the hub never touches sockets directly.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::Hub;
use super::connection::serve_connection;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the hub's WebSocket server, returning the bound port.
///
/// Port `0` asks the OS for a free port.
pub fn start_hub_server(interface: IpAddr, base_port: u16, hub: Arc<Hub>) -> Result<u16> {
    let retries = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    let (listener, actual_port) = try_bind_port(interface, base_port, retries)?;
    listener.set_nonblocking(true)?;

    std::thread::Builder::new()
        .name("hub-acceptor".into())
        .spawn(move || accept_loop(listener, hub))?;

    Ok(actual_port)
}

fn accept_loop(listener: TcpListener, hub: Arc<Hub>) {
    loop {
        if crate::core::is_shutdown() {
            hub.close_all();
            break;
        }

        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("hub"; "incoming connection: {}", addr);
                // Handshake and I/O run blocking, with a read timeout.
                let _ = stream.set_nonblocking(false);

                let hub = Arc::clone(&hub);
                let spawned = std::thread::Builder::new()
                    .name(format!("hub-conn-{}", addr))
                    .spawn(move || serve_connection(stream, hub));
                if let Err(e) = spawned {
                    crate::log!("hub"; "failed to spawn connection thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                crate::log!("hub"; "accept error: {}", e);
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                if offset > 0 {
                    crate::log!("hub"; "port {} in use, using {}", base_port, actual_port);
                }
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
