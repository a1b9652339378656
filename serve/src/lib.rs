//! WebSocket server (§6.1): bridges `protocol::{ClientMessage,
//! ServerMessage}` frames to and from a `kiagent_engine::workflow::Engine`.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod connection;
mod events;

use std::sync::{Arc, Mutex};

use kiagent_engine::workflow::Engine;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use app::{router, AppState};

const DEFAULT_WS_ADDR: &str = "127.0.0.1:8765";

/// Runs the server on an existing listener (used by tests: bind
/// `127.0.0.1:0`, then pass the listener in). When `once` is true, accepts
/// one connection, handles it, then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    engine: Arc<Engine>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("kiagent serve listening on ws://{addr}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = Arc::new(AppState { engine, shutdown_tx: Mutex::new(if once { Some(shutdown_tx) } else { None }) });
    let app = router(state);

    if once {
        axum::serve(listener, app).with_graceful_shutdown(async move { let _ = shutdown_rx.await; }).await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the server, listening on `addr` (default `127.0.0.1:8765`).
pub async fn run_serve(addr: Option<&str>, engine: Arc<Engine>, once: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_WS_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, engine, once).await
}
