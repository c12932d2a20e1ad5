//! Development server with live reload support.

mod path;
mod response;
mod watch;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::{SiteConfig, cfg};
use crate::{core, debug, log, reload};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the server, start the reload channel and watcher, then block on the
/// request loop until Ctrl+C.
pub fn serve(config: &SiteConfig) -> Result<()> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let ws_port = if config.serve.watch {
        let port = reload::start(reload::DEFAULT_WS_PORT)?;
        debug!("reload"; "ws://localhost:{}", port);
        Some(port)
    } else {
        None
    };

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    let watcher = watch::spawn_watcher(config.serve.watch, shutdown_rx);

    run_request_loop(&server, ws_port);
    wait_for_shutdown(watcher);
    Ok(())
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

fn run_request_loop(server: &Server, ws_port: Option<u16>) {
    // Use a small thread pool so one slow request can't block the rest
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        pool.spawn(move || {
            if let Err(e) = handle_request(request, ws_port) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ws_port: Option<u16>) -> Result<()> {
    if core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let config = cfg();
    if let Some(path) = path::resolve_path(request.url(), &config.build.output) {
        return response::respond_file(request, &path, ws_port);
    }

    response::respond_not_found(request, &config, ws_port)
}

/// Wait for the watcher thread to shut down gracefully (max 2 seconds).
fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}
