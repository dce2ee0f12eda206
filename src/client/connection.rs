//! Reconnecting WebSocket client.
//!
//! One task owns the socket and the [`ReconnectState`]; the rest of the
//! program talks to it through a cloneable [`ClientHandle`] and observes it
//! through a stream of [`ClientEvent`]s.
//!
//! ```text
//! ClientHandle --Command--> ReconnectingClient <--ws--> Hub
//!                                  |
//!                                  +--ClientEvent--> UI root (Session)
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::backoff::{BackoffConfig, ReconnectState};
use super::nav::SlideSink;
use crate::sync::SyncMessage;

/// Connection lifecycle and inbound frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Open,
    Frame(String),
    /// Connection closed or an attempt failed; `retry_in` is the scheduled
    /// reconnect delay, `None` when no attempt is scheduled
    Closed { retry_in: Option<Duration> },
}

#[derive(Debug)]
enum Command {
    Send(SyncMessage),
    Connect,
    Disconnect,
}

/// Cheap handle to a running [`ReconnectingClient`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    /// Send a message; dropped while disconnected.
    pub fn send(&self, msg: SyncMessage) {
        if self.tx.send(Command::Send(msg)).is_err() {
            crate::debug!("client"; "client stopped, dropped {}", msg.to_json());
        }
    }

    /// Re-enable automatic reconnects and connect now.
    pub fn connect(&self) {
        let _ = self.tx.send(Command::Connect);
    }

    /// Close the connection and cancel any pending reconnect.
    pub fn disconnect(&self) {
        let _ = self.tx.send(Command::Disconnect);
    }
}

impl SlideSink for ClientHandle {
    fn send_slide(&mut self, slide_index: usize) {
        self.send(SyncMessage::slide(slide_index));
    }
}

/// The task side: run it with [`ReconnectingClient::run`].
pub struct ReconnectingClient {
    url: String,
    state: ReconnectState,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl ReconnectingClient {
    pub fn new(
        url: impl Into<String>,
        backoff: BackoffConfig,
    ) -> (Self, ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = Self {
            url: url.into(),
            state: ReconnectState::new(backoff),
            commands: cmd_rx,
            events: event_tx,
        };
        (client, ClientHandle { tx: cmd_tx }, event_rx)
    }

    /// Connect and keep reconnecting until disconnected or every handle is dropped.
    pub async fn run(mut self) {
        self.state.connect();

        loop {
            if !self.state.should_reconnect() {
                if !self.idle().await {
                    break;
                }
                continue;
            }

            match self.attempt().await {
                Attempt::Exit => break,
                Attempt::Cancelled => {
                    self.emit(ClientEvent::Closed { retry_in: None });
                    continue;
                }
                Attempt::Ended => {}
            }

            let retry_in = self.state.on_close();
            self.emit(ClientEvent::Closed { retry_in });
            if let Some(delay) = retry_in {
                crate::debug!("client"; "reconnecting in {:?}", delay);
                if !self.wait_retry(delay).await {
                    break;
                }
            }
        }

        crate::debug!("client"; "stopped");
    }

    /// One connection attempt, plus the session if it opens.
    async fn attempt(&mut self) -> Attempt {
        let connecting = tokio_tungstenite::connect_async(self.url.as_str());
        tokio::pin!(connecting);

        let ws = loop {
            tokio::select! {
                result = &mut connecting => match result {
                    Ok((ws, _)) => break ws,
                    Err(e) => {
                        crate::debug!("client"; "connect to {} failed: {}", self.url, e);
                        return Attempt::Ended;
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    None => return Attempt::Exit,
                    Some(Command::Disconnect) => {
                        self.state.disconnect();
                        return Attempt::Cancelled;
                    }
                    Some(Command::Send(msg)) => drop_unsent(&msg),
                    Some(Command::Connect) => {}
                },
            }
        };

        self.state.on_open();
        self.emit(ClientEvent::Open);
        crate::debug!("client"; "connected to {}", self.url);

        let (mut sink, mut stream) = ws.split();
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.emit(ClientEvent::Frame(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Close(_))) | None => return Attempt::Ended,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        crate::debug!("client"; "connection error: {}", e);
                        return Attempt::Ended;
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(msg)) => {
                        let frame = Message::Text(msg.to_json().into());
                        if let Err(e) = sink.send(frame).await {
                            crate::debug!("client"; "send failed: {}", e);
                            return Attempt::Ended;
                        }
                    }
                    Some(Command::Connect) => {}
                    Some(Command::Disconnect) => {
                        self.state.disconnect();
                        let _ = sink.close().await;
                        return Attempt::Ended;
                    }
                    None => {
                        let _ = sink.close().await;
                        return Attempt::Exit;
                    }
                },
            }
        }
    }

    /// Wait out the backoff delay. Returns `false` when the client should exit.
    async fn wait_retry(&mut self, delay: Duration) -> bool {
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = &mut timer => {
                    self.state.timer_fired();
                    return true;
                }
                cmd = self.commands.recv() => match cmd {
                    None => return false,
                    Some(Command::Disconnect) => {
                        self.state.disconnect();
                        return true;
                    }
                    Some(Command::Connect) => {
                        // Skip the rest of the delay.
                        self.state.timer_fired();
                        return true;
                    }
                    Some(Command::Send(msg)) => drop_unsent(&msg),
                },
            }
        }
    }

    /// Disconnected by the user: wait for `connect()`.
    async fn idle(&mut self) -> bool {
        loop {
            match self.commands.recv().await {
                None => return false,
                Some(Command::Connect) => {
                    self.state.connect();
                    return true;
                }
                Some(Command::Disconnect) => {}
                Some(Command::Send(msg)) => drop_unsent(&msg),
            }
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

enum Attempt {
    /// Connection failed or closed
    Ended,
    /// `disconnect()` arrived before the connection opened
    Cancelled,
    /// Every handle was dropped
    Exit,
}

fn drop_unsent(msg: &SyncMessage) {
    crate::debug!("client"; "not connected, dropped {}", msg.to_json());
}
