//! WebSocket live-reload channel.
//!
//! The dev server injects a tiny client script into served HTML; the watcher
//! calls `broadcast_reload` after a successful stage re-run and every
//! connected browser refreshes.

use std::net::{TcpListener, TcpStream};
use std::sync::LazyLock;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::{Message, WebSocket};

/// Default WebSocket port for live reload.
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Connected reload clients.
static CLIENTS: LazyLock<Mutex<Vec<WebSocket<TcpStream>>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

/// Client script injected into served HTML. `{port}` is substituted at
/// injection time with the actually-bound WebSocket port.
pub const CLIENT_JS: &str = r#"<script>
(function () {
    var socket = new WebSocket("ws://" + location.hostname + ":{port}");
    socket.onmessage = function (msg) {
        if (msg.data === "reload") location.reload();
    };
})();
</script>"#;

/// Start the reload server; returns the port actually bound.
pub fn start(base_port: u16) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    std::thread::spawn(move || accept_loop(listener));
    Ok(actual_port)
}

fn accept_loop(listener: TcpListener) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => match tungstenite::accept(stream) {
                Ok(ws) => {
                    crate::debug!("reload"; "client connected");
                    CLIENTS.lock().push(ws);
                }
                Err(e) => crate::debug!("reload"; "handshake failed: {}", e),
            },
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
    }
}

/// Broadcast a reload to all connected clients, dropping dead ones.
pub fn broadcast_reload() {
    let mut clients = CLIENTS.lock();
    if clients.is_empty() {
        crate::debug!("reload"; "no clients connected");
        return;
    }

    let count = clients.len();
    clients.retain_mut(|client| match client.send(Message::text("reload")) {
        Ok(()) => true,
        Err(e) => {
            crate::debug!("reload"; "client disconnected: {}", e);
            false
        }
    });
    crate::debug!("reload"; "broadcast to {} clients", count);
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
