//! Per-connection I/O thread.
//!
//! Each accepted socket gets one thread that owns its `WebSocket`. The thread
//! alternates between flushing queued outbound frames and a short blocking
//! read, so neither direction starves the other.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

use super::{ConnId, Hub, Inbox, outbox};
use crate::sync::SyncMessage;

/// Read timeout between outbox drains
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Why a connection loop ended
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    ClientClosed,
    Unregistered,
    Shutdown,
    Failed,
}

/// Handshake and serve one client until it disconnects.
pub(super) fn serve_connection(stream: TcpStream, hub: Arc<Hub>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());

    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("hub"; "handshake failed ({}): {}", peer, e);
            return;
        }
    };

    if let Err(e) = ws.get_ref().set_read_timeout(Some(POLL_INTERVAL)) {
        crate::log!("hub"; "failed to configure socket ({}): {}", peer, e);
        return;
    }

    // `connected` goes out before registration so it precedes any broadcast.
    let hello = Message::Text(SyncMessage::Connected.to_json().into());
    if let Err(e) = ws.send(hello) {
        crate::debug!("hub"; "failed to greet {}: {}", peer, e);
        return;
    }

    let (tx, inbox) = outbox(hub.outbox_capacity());
    let id = hub.register(tx);
    crate::debug!("hub"; "client {} connected from {}", id, peer);

    let exit = run_loop(&mut ws, &inbox, &hub, id);

    inbox.close();
    hub.unregister(id);
    if exit != Exit::ClientClosed && exit != Exit::Failed {
        let _ = ws.close(None);
        let _ = ws.flush();
    }
    crate::debug!("hub"; "client {} disconnected ({:?})", id, exit);
}

fn run_loop(ws: &mut WebSocket<TcpStream>, inbox: &Inbox, hub: &Hub, id: ConnId) -> Exit {
    loop {
        if crate::core::is_shutdown() {
            return Exit::Shutdown;
        }
        if inbox.is_closed() {
            return Exit::Unregistered;
        }

        while let Some(frame) = inbox.try_pop() {
            if let Err(e) = ws.send(frame) {
                crate::debug!("hub"; "client {} write failed: {}", id, e);
                return Exit::Failed;
            }
        }

        match ws.read() {
            Ok(Message::Text(text)) => hub.on_client_frame(id, text.as_str()),
            Ok(Message::Close(_)) => {
                // tungstenite queued the close reply; push it out.
                let _ = ws.flush();
                return Exit::ClientClosed;
            }
            Ok(_) => {}
            Err(WsError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                return Exit::ClientClosed;
            }
            Err(e) => {
                crate::debug!("hub"; "client {} read failed: {}", id, e);
                return Exit::Failed;
            }
        }
    }
}
