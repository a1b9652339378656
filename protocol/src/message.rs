//! Inbound/outbound message enums (§6.1). Each variant maps to a JSON object
//! with `"type": "<variant_name>"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-to-server message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// MUST be the first message on a connection; engine responds with
    /// `connected` then `initialized`.
    Init { workspace_path: String },
    /// Submits a user query; engine begins workflow execution.
    Chat { content: String },
    /// Resumes a suspended workflow awaiting a HITL response.
    HitlResponse { content: String },
    /// Cancels the in-flight workflow for this session.
    Cancel,
}

/// Server-to-client message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `init`: assigns the session id.
    Connected { session_id: String },
    /// Sent once the session is ready to accept `chat`.
    Initialized,
    /// Coarse progress update.
    Status { status: String, message: String },
    /// Fine-grained per-agent event.
    AgentEvent { agent: String, event: String, payload: Value },
    /// Forwarded from an MCP `$/progress` notification.
    McpProgress { server: String, payload: Value },
    /// Awaits a `hitl_response` from the client.
    HitlRequest { prompt: String, #[serde(skip_serializing_if = "Option::is_none")] options: Option<Vec<String>> },
    /// Terminal: the workflow has finished (successfully or not).
    WorkflowComplete { success: bool, result: Value },
    /// Recoverable (`recoverable: true`) or fatal per-message error.
    Error { error_kind: String, message: String, recoverable: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: `init` serializes with a `"type":"init"` tag and round-trips.
    #[test]
    fn client_message_init_roundtrip() {
        let msg = ClientMessage::Init { workspace_path: "/tmp/ws".to_string() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"init\""));
        assert!(json.contains("\"workspace_path\":\"/tmp/ws\""));
        let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ClientMessage::Init { .. }));
    }

    /// **Scenario**: a tagless `cancel` message parses as a unit variant.
    #[test]
    fn client_message_cancel_roundtrip() {
        let json = r#"{"type":"cancel"}"#;
        let parsed: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, ClientMessage::Cancel));
    }

    /// **Scenario**: `hitl_request` omits `options` from the JSON when absent.
    #[test]
    fn server_message_hitl_request_omits_absent_options() {
        let msg = ServerMessage::HitlRequest { prompt: "continue?".to_string(), options: None };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("options"));
    }

    /// **Scenario**: `workflow_complete` carries a `success` flag and an arbitrary result payload.
    #[test]
    fn server_message_workflow_complete_roundtrip() {
        let msg = ServerMessage::WorkflowComplete { success: true, result: serde_json::json!({"response": "done"}) };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: ServerMessage = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMessage::WorkflowComplete { success, result } => {
                assert!(success);
                assert_eq!(result["response"], "done");
            }
            _ => panic!("expected WorkflowComplete"),
        }
    }
}
