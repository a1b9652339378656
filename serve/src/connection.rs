//! WebSocket connection lifecycle: recv loop, message-ordering enforcement,
//! and dispatch into `engine::workflow::Engine` (§6.1).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use kiagent_engine::workflow::{Engine, HitlOutcome, RunOutcome};
use kiagent_protocol::{ClientMessage, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::events::to_server_message;

struct Session {
    session_id: String,
    workspace_path: String,
}

pub(crate) async fn handle_socket(socket: WebSocket, engine: Arc<Engine>, shutdown_tx: Option<oneshot::Sender<()>>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&msg) else { continue };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut session: Option<Session> = None;

    while let Some(frame) = receiver.next().await {
        let msg = match frame {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("read error (client closed?): {e}");
                break;
            }
        };
        let text = match msg {
            Message::Text(t) => t,
            Message::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
            Message::Close(_) => break,
            _ => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                let _ = tx.send(ServerMessage::Error {
                    error_kind: "protocol_error".to_string(),
                    message: format!("malformed message: {e}"),
                    recoverable: true,
                });
                continue;
            }
        };

        match client_msg {
            ClientMessage::Init { workspace_path } => {
                let session_id = Uuid::new_v4().to_string();
                let _ = tx.send(ServerMessage::Connected { session_id: session_id.clone() });
                let _ = tx.send(ServerMessage::Initialized);
                session = Some(Session { session_id, workspace_path });
            }
            ClientMessage::Chat { content } => {
                let Some(session) = &session else {
                    let _ = tx.send(reject_before_initialized());
                    continue;
                };
                spawn_run(engine.clone(), session.session_id.clone(), session.workspace_path.clone(), content, tx.clone());
            }
            ClientMessage::HitlResponse { content } => {
                let Some(session) = &session else {
                    let _ = tx.send(reject_before_initialized());
                    continue;
                };
                spawn_resume(engine.clone(), session.session_id.clone(), content, tx.clone());
            }
            ClientMessage::Cancel => {
                if let Some(session) = &session {
                    engine.cancel(&session.session_id);
                }
            }
        }
    }

    writer.abort();
    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}

fn reject_before_initialized() -> ServerMessage {
    ServerMessage::Error {
        error_kind: "protocol_error".to_string(),
        message: "chat received before initialized; send init first".to_string(),
        recoverable: true,
    }
}

/// Runs to completion, or until the workflow suspends for a HITL response
/// (in which case no `workflow_complete` is sent — the client is expected to
/// answer the already-sent `hitl_request`). The HITL callback always defers:
/// the actual suspend/resume round-trip happens over the socket, not inside
/// the callback (§4.8).
fn spawn_run(engine: Arc<Engine>, session_id: String, workspace_path: String, content: String, tx: mpsc::UnboundedSender<ServerMessage>) {
    tokio::spawn(async move {
        let progress = progress_callback(tx.clone());
        let hitl = Arc::new(|_: &kiagent_engine::state::HitlRequest| HitlOutcome::Deferred);
        let outcome = engine.run(&session_id, &content, &workspace_path, progress, hitl).await;
        send_outcome(&tx, outcome);
    });
}

fn spawn_resume(engine: Arc<Engine>, session_id: String, content: String, tx: mpsc::UnboundedSender<ServerMessage>) {
    tokio::spawn(async move {
        let progress = progress_callback(tx.clone());
        let hitl = Arc::new(|_: &kiagent_engine::state::HitlRequest| HitlOutcome::Deferred);
        let outcome = engine.resume(&session_id, Some(content), progress, hitl).await;
        send_outcome(&tx, outcome);
    });
}

fn progress_callback(tx: mpsc::UnboundedSender<ServerMessage>) -> kiagent_engine::workflow::ProgressCallback {
    Arc::new(move |event| {
        let _ = tx.send(to_server_message(event));
    })
}

fn send_outcome(tx: &mpsc::UnboundedSender<ServerMessage>, outcome: Result<RunOutcome, kiagent_engine::AgentError>) {
    match outcome {
        Ok(RunOutcome::Completed(state)) => {
            let success = state.errors.iter().all(|e| e.retriable);
            let result = serde_json::json!({
                "agent_outputs": state.agent_outputs,
                "errors": state.errors,
            });
            let _ = tx.send(ServerMessage::WorkflowComplete { success, result });
        }
        Ok(RunOutcome::Suspended { .. }) => {}
        Err(e) => {
            let _ = tx.send(ServerMessage::Error { error_kind: "workflow_error".to_string(), message: e.to_string(), recoverable: false });
            let _ = tx.send(ServerMessage::WorkflowComplete { success: false, result: serde_json::json!({}) });
        }
    }
}
