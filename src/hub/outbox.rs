//! Per-connection outbound queue.
//!
//! Bounded. On overflow the oldest queued `slide` frame goes first, since a
//! later slide supersedes it; a queued `reload` is only dropped when nothing
//! but reloads (or unknown frames) is left.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tungstenite::protocol::Message;

use crate::sync::SyncMessage;

/// Push into a closed outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Sending half handed to the hub, receiving half owned by the connection thread.
///
/// Both halves share one channel; the sender keeps a receiver clone so it can
/// evict queued frames when the queue is full.
#[derive(Clone)]
pub struct Outbox {
    tx: Sender<Message>,
    evict: Receiver<Message>,
    /// Serializes pushes so eviction never interleaves with another push
    push_lock: Arc<Mutex<()>>,
    closed: Arc<AtomicBool>,
}

/// Connection-side view of an [`Outbox`].
pub struct Inbox {
    rx: Receiver<Message>,
    closed: Arc<AtomicBool>,
}

/// Create a connected outbox/inbox pair.
pub fn outbox(capacity: usize) -> (Outbox, Inbox) {
    let (tx, rx) = channel::bounded(capacity.max(1));
    let closed = Arc::new(AtomicBool::new(false));
    (
        Outbox {
            tx,
            evict: rx.clone(),
            push_lock: Arc::new(Mutex::new(())),
            closed: Arc::clone(&closed),
        },
        Inbox { rx, closed },
    )
}

impl Outbox {
    /// Queue a frame, evicting one queued frame when full.
    ///
    /// Returns the number of evicted frames.
    pub fn push(&self, msg: Message) -> Result<usize, Closed> {
        if self.is_closed() {
            return Err(Closed);
        }

        let _guard = self.push_lock.lock();
        let mut msg = msg;
        let mut evicted = 0;
        loop {
            match self.tx.try_send(msg) {
                Ok(()) => return Ok(evicted),
                Err(TrySendError::Full(back)) => {
                    evicted += self.make_room();
                    msg = back;
                }
                Err(TrySendError::Disconnected(_)) => return Err(Closed),
            }
        }
    }

    /// Drop the oldest queued slide frame, or the oldest frame if none is a
    /// slide. The rest are re-queued in order.
    ///
    /// The connection thread may pop concurrently; it only ever frees room.
    fn make_room(&self) -> usize {
        let mut queued: Vec<Message> = self.evict.try_iter().collect();
        if queued.is_empty() {
            return 0;
        }

        let victim = queued.iter().position(is_slide).unwrap_or(0);
        queued.remove(victim);
        for frame in queued {
            if self.tx.try_send(frame).is_err() {
                break;
            }
        }
        1
    }

    /// Mark closed; the connection thread shuts the socket on its next turn.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }
}

fn is_slide(frame: &Message) -> bool {
    match frame {
        Message::Text(text) => {
            matches!(SyncMessage::from_json(text.as_str()), Some(SyncMessage::Slide { .. }))
        }
        _ => false,
    }
}

impl Inbox {
    /// Next queued frame without waiting.
    pub fn try_pop(&self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Close from the connection side (socket died).
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
