//! Terminal remote: drive a running deck from the keyboard.
//!
//! The remote is one more window on the hub. Its slide moves reach every
//! browser, and moves made elsewhere are followed silently.
//!
//! ```text
//! → space l j    next        ← h k          previous
//! g / G          first/last  <digits> enter  go to slide
//! q / esc        quit
//! ```

use std::io::{Write, stdout};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType},
};
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use url::Url;

use crate::client::{
    ClientEvent, ClientHandle, Inbound, MemoryLocation, ReconnectingClient, Session, Transition,
};
use crate::config::DeckConfig;
use crate::deck::PresentationSnapshot;
use crate::log;

/// How often the key reader checks whether the remote is still running
const KEY_POLL: Duration = Duration::from_millis(100);

/// Keyboard commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Next,
    Prev,
    First,
    Last,
    Digit(u8),
    Enter,
    Quit,
}

/// Connection status shown in the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Connecting,
    Online,
    Retrying(Duration),
    Offline,
}

type RemoteSession = Session<MemoryLocation, ClientHandle>;

/// Run the remote until the user quits.
pub fn run_remote(
    config: &DeckConfig,
    url: &str,
    ws: Option<&str>,
    start: Option<&str>,
) -> Result<()> {
    let http = parse_http_url(url)?;
    let hub = resolve_hub(config, &http, ws)?;
    let snapshot_url = http
        .join("/snapshot.json")
        .context("invalid deck url")?;

    log!("remote"; "deck {} via {}", http, hub);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let _raw = RawMode::enable()?;
    rt.block_on(remote_loop(
        config,
        hub,
        snapshot_url,
        start.unwrap_or_default(),
    ))
}

async fn remote_loop(
    config: &DeckConfig,
    hub: String,
    snapshot_url: Url,
    start: &str,
) -> Result<()> {
    let (client, handle, mut events) = ReconnectingClient::new(hub, config.client.backoff());
    let client_task = tokio::spawn(client.run());
    let mut keys = spawn_key_reader()?;

    let http = reqwest::Client::new();
    let mut session = Session::new(MemoryLocation::new(start), handle.clone());
    let mut link = Link::Connecting;
    let mut title = String::new();
    let mut typed: Option<usize> = None;

    draw_status(&session, &title, link);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    ClientEvent::Open => {
                        link = Link::Online;
                        // The deck may have changed while we were away.
                        reload(&http, &snapshot_url, &mut session, &mut title).await;
                    }
                    ClientEvent::Frame(text) => {
                        if session.handle_frame(&text) == Inbound::Reload {
                            reload(&http, &snapshot_url, &mut session, &mut title).await;
                        }
                    }
                    ClientEvent::Closed { retry_in: Some(delay) } => link = Link::Retrying(delay),
                    ClientEvent::Closed { retry_in: None } => link = Link::Offline,
                }
            }
            key = keys.recv() => {
                let Some(key) = key else { break };
                match key {
                    Key::Quit => break,
                    Key::Next => { session.next(); }
                    Key::Prev => { session.prev(); }
                    Key::First => { session.go_to(0); }
                    Key::Last => { session.go_to(usize::MAX); }
                    Key::Digit(d) => {
                        typed = Some(typed.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
                    }
                    Key::Enter => {
                        if let Some(number) = typed.take() {
                            if session.go_to(number.saturating_sub(1)) == Transition::None {
                                crate::debug!("remote"; "already on slide {}", number);
                            }
                        }
                    }
                }
            }
        }
        draw_status(&session, &title, link);
    }

    handle.disconnect();
    drop(handle);
    drop(session);
    let _ = tokio::time::timeout(Duration::from_millis(500), client_task).await;

    let mut out = stdout().lock();
    write!(out, "\r\n").ok();
    out.flush().ok();
    Ok(())
}

/// Fetch the snapshot and load it, keeping the old one on failure.
async fn reload(
    http: &reqwest::Client,
    url: &Url,
    session: &mut RemoteSession,
    title: &mut String,
) {
    match fetch_snapshot(http, url).await {
        Ok(snapshot) => {
            session.load(&snapshot);
            *title = snapshot.title;
        }
        Err(e) => crate::debug!("remote"; "snapshot unavailable: {:#}", e),
    }
}

async fn fetch_snapshot(http: &reqwest::Client, url: &Url) -> Result<PresentationSnapshot> {
    let snapshot = http
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .json::<PresentationSnapshot>()
        .await?;
    Ok(snapshot)
}

fn parse_http_url(url: &str) -> Result<Url> {
    let url = Url::parse(url).with_context(|| format!("invalid deck url `{url}`"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("deck url must be http or https, got `{other}`"),
    }
}

/// An explicit `--ws` wins; otherwise the deck host on `serve.ws_port`.
fn resolve_hub(config: &DeckConfig, http: &Url, ws: Option<&str>) -> Result<String> {
    match ws {
        Some(ws) => Ok(ws.to_string()),
        None => hub_url(http, config.serve.ws_port),
    }
}

/// Hub address for a deck served at `http`: same host, hub port.
///
/// The hub speaks plain `ws` even when the pages sit behind TLS.
fn hub_url(http: &Url, ws_port: u16) -> Result<String> {
    let host = http.host_str().context("deck url has no host")?;
    let mut hub = Url::parse(&format!("ws://{host}/"))
        .with_context(|| format!("invalid hub host `{host}`"))?;
    hub.set_port(Some(ws_port))
        .map_err(|()| anyhow::anyhow!("cannot set port on `{hub}`"))?;
    Ok(hub.as_str().trim_end_matches('/').to_string())
}

fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Key::Quit);
    }

    match key.code {
        KeyCode::Right | KeyCode::Down | KeyCode::PageDown => Some(Key::Next),
        KeyCode::Left | KeyCode::Up | KeyCode::PageUp | KeyCode::Backspace => Some(Key::Prev),
        KeyCode::Home => Some(Key::First),
        KeyCode::End => Some(Key::Last),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Quit),
        KeyCode::Char(c) => match c {
            ' ' | 'l' | 'j' | 'n' => Some(Key::Next),
            'h' | 'k' | 'p' => Some(Key::Prev),
            'g' => Some(Key::First),
            'G' => Some(Key::Last),
            'q' => Some(Key::Quit),
            '0'..='9' => Some(Key::Digit(c as u8 - b'0')),
            _ => None,
        },
        _ => None,
    }
}

/// Read terminal keys on a blocking thread.
///
/// The thread exits once the receiver is dropped.
fn spawn_key_reader() -> Result<mpsc::UnboundedReceiver<Key>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("remote-keys".into())
        .spawn(move || {
            while !tx.is_closed() {
                match event::poll(KEY_POLL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        log!("error"; "terminal input failed: {}", e);
                        break;
                    }
                }
                match event::read() {
                    Ok(Event::Key(key)) => {
                        if let Some(key) = map_key(key) {
                            if tx.send(key).is_err() || key == Key::Quit {
                                break;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log!("error"; "terminal input failed: {}", e);
                        break;
                    }
                }
            }
        })
        .context("failed to spawn key reader")?;
    Ok(rx)
}

fn status_line(session: &RemoteSession, title: &str, link: Link) -> String {
    let link = match link {
        Link::Connecting => "connecting".yellow().to_string(),
        Link::Online => "online".green().to_string(),
        Link::Retrying(delay) => format!("retry in {}s", delay.as_secs_f32().ceil())
            .yellow()
            .to_string(),
        Link::Offline => "offline".red().to_string(),
    };

    let Some(nav) = session.navigator() else {
        return format!("[{link}] waiting for presentation");
    };
    let state = nav.state();
    let mut line = format!(
        "[{link}] {} {}/{}",
        title.bold(),
        state.slide_index + 1,
        nav.total()
    );
    let fragments = nav.fragment_count(state.slide_index);
    if fragments > 0 {
        line.push_str(&format!(
            "  fragment {}/{}",
            state.fragment_index + 1,
            fragments
        ));
    }
    line
}

fn draw_status(session: &RemoteSession, title: &str, link: Link) {
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::CurrentLine)).ok();
    write!(out, "\r{}", status_line(session, title, link)).ok();
    out.flush().ok();
}

/// Raw terminal mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
