//! Broadcast Hub
//!
//! Registry of open WebSocket connections and the single fan-out point for
//! sync messages. The hub holds no application state beyond the registry.
//!
//! # Architecture
//!
//! ```text
//!                       +--> Outbox --> connection thread --> client A
//! RebuildActor --+      |
//!                +--> Hub --> Outbox --> connection thread --> client B
//! client A slide +      |
//!                       +--> Outbox --> connection thread --> client C
//! ```
//!
//! Every registry mutation happens under one lock. Delivery only pushes into
//! bounded per-connection outboxes, so a slow socket stalls its own thread
//! and never the broadcaster.

mod connection;
pub mod outbox;
pub mod server;

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tungstenite::protocol::Message;

use crate::sync::SyncMessage;
pub use outbox::{Inbox, Outbox, outbox};
pub use server::start_hub_server;

/// Unique identity of a registered connection
pub type ConnId = u64;

/// Connection registry and fan-out point.
pub struct Hub {
    conns: Mutex<FxHashMap<ConnId, Outbox>>,
    next_id: AtomicU64,
    outbox_capacity: usize,
}

impl Hub {
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            conns: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Capacity used for outboxes created by the WebSocket server.
    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
    }

    /// Register a connection's outbox, returning its id.
    pub fn register(&self, outbox: Outbox) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut conns = self.conns.lock();
        conns.insert(id, outbox);
        crate::debug!("hub"; "client {} registered (total: {})", id, conns.len());
        id
    }

    /// Unregister and close a connection. Unknown ids are a no-op.
    pub fn unregister(&self, id: ConnId) -> bool {
        let removed = self.conns.lock().remove(&id);
        match removed {
            Some(outbox) => {
                outbox.close();
                crate::debug!("hub"; "client {} unregistered", id);
                true
            }
            None => false,
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.conns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send `msg` to every connection except `except`.
    ///
    /// Best effort: connections whose outbox is closed are unregistered.
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(&self, msg: &SyncMessage, except: Option<ConnId>) -> usize {
        let frame = Message::Text(msg.to_json().into());
        let mut conns = self.conns.lock();

        if conns.is_empty() {
            crate::debug!("hub"; "no clients connected");
            return 0;
        }

        let mut sent = 0;
        conns.retain(|id, outbox| {
            if Some(*id) == except {
                return true;
            }
            match outbox.push(frame.clone()) {
                Ok(evicted) => {
                    if evicted > 0 {
                        crate::debug!("hub"; "client {} lagging, dropped {} frame(s)", id, evicted);
                    }
                    sent += 1;
                    true
                }
                Err(_) => {
                    crate::debug!("hub"; "client {} gone, unregistering", id);
                    outbox.close();
                    false
                }
            }
        });

        crate::debug!("hub"; "broadcast {} to {} clients", msg.to_json(), sent);
        sent
    }

    /// Handle a text frame received from connection `from`.
    ///
    /// Only `slide` messages are relayed (to everyone but the sender);
    /// anything else a client sends is ignored.
    pub fn on_client_frame(&self, from: ConnId, text: &str) {
        match SyncMessage::from_json(text) {
            Some(msg @ SyncMessage::Slide { .. }) => {
                self.broadcast(&msg, Some(from));
            }
            Some(other) => {
                crate::debug!("hub"; "client {} sent {:?}, ignored", from, other);
            }
            None => {}
        }
    }

    /// Close every connection (shutdown).
    pub fn close_all(&self) {
        let mut conns = self.conns.lock();
        for (_, outbox) in conns.drain() {
            outbox.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(inbox: &Inbox) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(msg) = inbox.try_pop() {
            if let Message::Text(t) = msg {
                out.push(t.as_str().to_string());
            }
        }
        out
    }

    #[test]
    fn test_register_unregister() {
        let hub = Hub::new(4);
        let (a, inbox_a) = outbox(4);
        let (b, _inbox_b) = outbox(4);

        let id_a = hub.register(a);
        let id_b = hub.register(b);
        assert_ne!(id_a, id_b);
        assert_eq!(hub.len(), 2);

        assert!(hub.unregister(id_a));
        assert!(!hub.unregister(id_a));
        assert!(inbox_a.is_closed());
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_broadcast_reaches_all() {
        let hub = Hub::new(4);
        let (a, inbox_a) = outbox(4);
        let (b, inbox_b) = outbox(4);
        hub.register(a);
        hub.register(b);

        assert_eq!(hub.broadcast(&SyncMessage::Reload, None), 2);
        assert_eq!(texts(&inbox_a), vec![r#"{"type":"reload"}"#]);
        assert_eq!(texts(&inbox_b), vec![r#"{"type":"reload"}"#]);
    }

    #[test]
    fn test_slide_relay_skips_originator() {
        let hub = Hub::new(4);
        let (a, inbox_a) = outbox(4);
        let (b, inbox_b) = outbox(4);
        let id_a = hub.register(a);
        hub.register(b);

        hub.on_client_frame(id_a, r#"{"type":"slide","slideIndex":2}"#);

        assert!(texts(&inbox_a).is_empty());
        assert_eq!(texts(&inbox_b), vec![r#"{"type":"slide","slideIndex":2}"#]);
    }

    #[test]
    fn test_client_frames_other_than_slide_ignored() {
        let hub = Hub::new(4);
        let (a, _inbox_a) = outbox(4);
        let (b, inbox_b) = outbox(4);
        let id_a = hub.register(a);
        hub.register(b);

        hub.on_client_frame(id_a, "not json");
        hub.on_client_frame(id_a, r#"{"type":"reload"}"#);
        hub.on_client_frame(id_a, r#"{"type":"unknown"}"#);

        assert!(texts(&inbox_b).is_empty());
        assert_eq!(hub.len(), 2);
    }

    #[test]
    fn test_dead_connection_unregistered_on_broadcast() {
        let hub = Hub::new(4);
        let (a, inbox_a) = outbox(4);
        let (b, inbox_b) = outbox(4);
        hub.register(a);
        hub.register(b);

        inbox_a.close();
        assert_eq!(hub.broadcast(&SyncMessage::Reload, None), 1);
        assert_eq!(hub.len(), 1);
        assert_eq!(texts(&inbox_b).len(), 1);
    }

    #[test]
    fn test_slow_client_does_not_block_others() {
        let hub = Hub::new(2);
        let (slow, slow_inbox) = outbox(2);
        let (fast, fast_inbox) = outbox(2);
        hub.register(slow);
        hub.register(fast);

        for i in 0..10 {
            hub.broadcast(&SyncMessage::slide(i), None);
            texts(&fast_inbox);
        }

        // The slow client only keeps the newest frames.
        assert_eq!(
            texts(&slow_inbox),
            vec![
                r#"{"type":"slide","slideIndex":8}"#,
                r#"{"type":"slide","slideIndex":9}"#
            ]
        );
        assert_eq!(hub.len(), 2);
    }

    #[test]
    fn test_lagging_client_keeps_reload() {
        let hub = Hub::new(2);
        let (lagging, inbox) = outbox(2);
        hub.register(lagging);

        hub.broadcast(&SyncMessage::Reload, None);
        hub.broadcast(&SyncMessage::slide(1), None);
        hub.broadcast(&SyncMessage::slide(2), None);

        assert_eq!(
            texts(&inbox),
            vec![r#"{"type":"reload"}"#, r#"{"type":"slide","slideIndex":2}"#]
        );
    }

    #[test]
    fn test_concurrent_register_broadcast() {
        use std::sync::Arc;

        let hub = Arc::new(Hub::new(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let hub = Arc::clone(&hub);
                std::thread::spawn(move || {
                    let (o, inbox) = outbox(64);
                    let id = hub.register(o);
                    hub.broadcast(&SyncMessage::Reload, Some(id));
                    hub.unregister(id);
                    drop(inbox);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(hub.is_empty());
    }
}
