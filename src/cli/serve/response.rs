//! HTTP response helpers.

use anyhow::Result;
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

pub const HTML: &str = "text/html; charset=utf-8";
pub const JSON: &str = "application/json";
pub const PLAIN: &str = "text/plain; charset=utf-8";

/// Respond with a rendered page.
pub fn respond_html(request: Request, body: String) -> Result<()> {
    send_body(request, 200, HTML, body.into_bytes())
}

/// Respond with a JSON document.
pub fn respond_json<T: Serialize>(request: Request, value: &T) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    send_body(request, 200, JSON, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 403 (presenter key missing or wrong).
pub fn respond_forbidden(request: Request) -> Result<()> {
    send_body(request, 403, PLAIN, b"403 Forbidden".to_vec())
}

/// Respond with 405 for anything but GET/HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 (no presentation yet, or shutting down).
pub fn respond_unavailable(request: Request, reason: &str) -> Result<()> {
    send_body(
        request,
        503,
        PLAIN,
        format!("503 Service Unavailable: {reason}").into_bytes(),
    )
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

/// Send a body, or only the headers for HEAD requests.
fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    if is_head_request(&request) {
        let response = Response::empty(StatusCode(status))
            .with_header(make_header("Content-Type", content_type));
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
