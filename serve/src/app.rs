//! Axum app: shared state and the WebSocket upgrade route.

use std::sync::{Arc, Mutex};

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use kiagent_engine::workflow::Engine;
use tokio::sync::oneshot;

use super::connection::handle_socket;

/// When set, the first connection to close sends on this to signal server
/// exit (used by the `once` test/CLI mode).
pub(crate) struct AppState {
    pub(crate) engine: Arc<Engine>,
    pub(crate) shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let shutdown_tx = state.shutdown_tx.lock().ok().and_then(|mut g| g.take());
    let engine = state.engine.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, engine, shutdown_tx))
}
