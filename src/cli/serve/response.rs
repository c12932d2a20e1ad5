//! HTTP response handlers.

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file, injecting the reload script into HTML.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type, ws_port);

    send_body(request, 200, content_type, body)
}

/// Respond with 404 page (custom or default).
pub fn respond_not_found(
    request: Request,
    config: &SiteConfig,
    ws_port: Option<u16>,
) -> Result<()> {
    use crate::utils::mime::types::{HTML, PLAIN};

    let custom_404 = config.build.output.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom
        && let Ok(body) = fs::read(&custom_404)
    {
        let body = maybe_inject_reload(body, HTML, ws_port);
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Inject the reload script if the content is HTML and watching is on.
fn maybe_inject_reload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match (content_type.starts_with("text/html"), ws_port) {
        (true, Some(port)) => inject_reload_script(&body, port),
        _ => body,
    }
}

/// Inject the reload script before the `</body>` tag.
fn inject_reload_script(content: &[u8], ws_port: u16) -> Vec<u8> {
    let script = crate::reload::CLIENT_JS.replace("{port}", &ws_port.to_string());
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    // Reverse search for </body> using byte windows
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = Vec::with_capacity(content.len() + script_bytes.len());
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    // No </body> found, append to end (browsers handle this gracefully)
    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    result.extend_from_slice(content);
    result.extend_from_slice(script_bytes);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
