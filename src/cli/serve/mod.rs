//! Deck server: HTTP pages and snapshots, the sync hub, and the watcher.
//!
//! ```text
//! GET /                  audience page
//! GET /presenter?key=…   presenter page (gated by serve.presenter_secret)
//! GET /snapshot.json     current presentation snapshot (503 until loaded)
//! GET /diagnostics.json  last rebuild failure
//! ```

mod lifecycle;
mod page;
mod response;

use crate::{
    actor::{RebuildOutcome, rebuild_now},
    config::DeckConfig,
    deck::{DeckParser, DeckStore, MarkdownParser, RebuildFailure},
    hub::{Hub, start_hub_server},
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use lifecycle::ActorSetup;
use page::View;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Request handler threads
const REQUEST_THREADS: usize = 4;

/// Shared state for request handlers.
struct ServeContext {
    config: Arc<DeckConfig>,
    store: Arc<DeckStore>,
    ws_port: u16,
}

/// Routed request target
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Audience,
    Presenter { key: Option<String> },
    Snapshot,
    Diagnostics,
    NotFound,
}

#[derive(Serialize)]
struct Diagnostics {
    error: Option<RebuildFailure>,
}

/// Serve `file` until Ctrl+C.
pub fn serve_deck(config: Arc<DeckConfig>, file: &Path) -> Result<()> {
    let source = file
        .canonicalize()
        .with_context(|| format!("deck source not found: {}", file.display()))?;

    let store = Arc::new(DeckStore::new());
    let hub = Arc::new(Hub::new(config.hub.outbox_capacity));
    let parser: Arc<dyn DeckParser> = Arc::new(MarkdownParser);

    let ws_port = start_hub_server(config.serve.interface, config.serve.ws_port, Arc::clone(&hub))?;
    crate::debug!("hub"; "ws://{}:{}", config.serve.interface, ws_port);

    if rebuild_now(parser.as_ref(), &source, &store, &hub) == RebuildOutcome::Failed {
        log!("serve"; "serving without a presentation until the source parses");
    }

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    if !config.serve.presenter_secret.is_empty() {
        log!("serve"; "presenter: http://{}/presenter?key=…", addr);
    }

    let actors = lifecycle::spawn_actors(
        &config,
        ActorSetup {
            source,
            parser,
            store: Arc::clone(&store),
            hub: Arc::clone(&hub),
            debounce: config.watch.debounce(),
        },
        shutdown_rx,
    )?;

    let ctx = Arc::new(ServeContext {
        config,
        store,
        ws_port,
    });
    run_request_loop(&server, ctx)?;

    hub.close_all();
    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

fn run_request_loop(server: &Server, ctx: Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request, "shutting down");
    }
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    match route(request.url()) {
        Route::Audience => respond_page(request, ctx, View::Audience),
        Route::Presenter { key } => {
            if ctx.config.serve.presenter_allowed(key.as_deref()) {
                respond_page(request, ctx, View::Presenter)
            } else {
                response::respond_forbidden(request)
            }
        }
        Route::Snapshot => match ctx.store.current() {
            Some(deck) => response::respond_json(request, &deck.snapshot()),
            None => response::respond_unavailable(request, "presentation not loaded"),
        },
        Route::Diagnostics => response::respond_json(
            request,
            &Diagnostics {
                error: ctx.store.last_failure(),
            },
        ),
        Route::NotFound => response::respond_not_found(request),
    }
}

fn respond_page(request: Request, ctx: &ServeContext, view: View) -> Result<()> {
    match ctx.store.current() {
        Some(deck) => response::respond_html(request, page::render_page(&deck, view, ctx.ws_port)),
        None => response::respond_unavailable(request, "presentation not loaded"),
    }
}

/// Map a request target (path + query) to a route.
fn route(target: &str) -> Route {
    let Ok(url) = url::Url::parse("http://deck.local").and_then(|base| base.join(target)) else {
        return Route::NotFound;
    };

    match url.path() {
        "/" | "/index.html" => Route::Audience,
        "/presenter" => Route::Presenter {
            key: url
                .query_pairs()
                .find(|(name, _)| name == "key")
                .map(|(_, value)| value.into_owned()),
        },
        "/snapshot.json" => Route::Snapshot,
        "/diagnostics.json" => Route::Diagnostics,
        _ => Route::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::deck::{DeckError, Presentation, Slide};
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpStream};

    #[test]
    fn test_routes() {
        assert_eq!(route("/"), Route::Audience);
        assert_eq!(route("/presenter"), Route::Presenter { key: None });
        assert_eq!(
            route("/presenter?key=s%20ecret&x=1"),
            Route::Presenter {
                key: Some("s ecret".into())
            }
        );
        assert_eq!(route("/snapshot.json"), Route::Snapshot);
        assert_eq!(route("/diagnostics.json?t=1"), Route::Diagnostics);
        assert_eq!(route("/favicon.ico"), Route::NotFound);
    }

    /// Start a server on a free port, returning its address.
    fn start(config: &str, store: Arc<DeckStore>) -> std::net::SocketAddr {
        let ctx = Arc::new(ServeContext {
            config: Arc::new(test_parse_config(config)),
            store,
            ws_port: 35729,
        });
        let (server, addr) =
            lifecycle::bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        std::thread::spawn(move || run_request_loop(&server, ctx));
        addr
    }

    fn get(addr: std::net::SocketAddr, target: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        let status = response
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap();
        let body = response
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }

    fn loaded_store() -> Arc<DeckStore> {
        let store = Arc::new(DeckStore::new());
        store.install(Presentation {
            title: "Talk".into(),
            slides: vec![Slide {
                title: Some("One".into()),
                html: "<h1>One</h1>".into(),
                fragments: vec!["<h1>One</h1>".into()],
            }],
            ..Default::default()
        });
        store
    }

    #[test]
    fn test_unloaded_store_is_unavailable() {
        let addr = start("", Arc::new(DeckStore::new()));

        assert_eq!(get(addr, "/snapshot.json").0, 503);
        assert_eq!(get(addr, "/").0, 503);
        let (status, body) = get(addr, "/diagnostics.json");
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"error":null}"#);
    }

    #[test]
    fn test_snapshot_and_pages() {
        let addr = start("", loaded_store());

        let (status, body) = get(addr, "/snapshot.json");
        assert_eq!(status, 200);
        let snapshot: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["version"], 1);
        assert_eq!(snapshot["slides"][0]["title"], "One");

        let (status, body) = get(addr, "/");
        assert_eq!(status, 200);
        assert!(body.contains("<h1>One</h1>"));
        assert_eq!(get(addr, "/nope").0, 404);
    }

    #[test]
    fn test_presenter_secret() {
        let addr = start("[serve]\npresenter_secret = \"k\"", loaded_store());

        assert_eq!(get(addr, "/presenter").0, 403);
        assert_eq!(get(addr, "/presenter?key=wrong").0, 403);
        let (status, body) = get(addr, "/presenter?key=k");
        assert_eq!(status, 200);
        assert!(body.contains("<aside>"));
    }

    #[test]
    fn test_diagnostics_reports_failure() {
        let store = loaded_store();
        let err = DeckError::UnclosedFence { line: 2 };
        store.record_failure(RebuildFailure::new("talk.md".into(), &err));
        let addr = start("", store);

        let (_, body) = get(addr, "/diagnostics.json");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["path"], "talk.md");
        assert!(json["error"]["message"].as_str().unwrap().contains("line 2"));
    }
}
