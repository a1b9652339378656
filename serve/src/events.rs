//! Maps `engine::workflow::ProgressEvent` onto outbound `ServerMessage`
//! frames (§6.1, §4.8).

use kiagent_engine::workflow::ProgressEvent;
use kiagent_protocol::ServerMessage;

pub(crate) fn to_server_message(event: ProgressEvent) -> ServerMessage {
    match event {
        ProgressEvent::AgentStart { node_id, .. } => {
            ServerMessage::Status { status: "agent_start".to_string(), message: node_id }
        }
        ProgressEvent::AgentComplete { node_id, state_snapshot, .. } => {
            ServerMessage::AgentEvent { agent: node_id, event: "complete".to_string(), payload: state_snapshot }
        }
        ProgressEvent::RoutingDecision { from, to, .. } => ServerMessage::AgentEvent {
            agent: "supervisor".to_string(),
            event: "routing_decision".to_string(),
            payload: serde_json::json!({ "from": from, "to": to }),
        },
        ProgressEvent::ValidatorRun { validator_name, passed, .. } => ServerMessage::AgentEvent {
            agent: "reviewfix".to_string(),
            event: "validator_run".to_string(),
            payload: serde_json::json!({ "validator_name": validator_name, "passed": passed }),
        },
        ProgressEvent::HitlRequest { prompt, options, .. } => ServerMessage::HitlRequest { prompt, options },
        ProgressEvent::WorkflowComplete { response_ready, .. } => {
            ServerMessage::Status { status: "workflow_step_complete".to_string(), message: response_ready.to_string() }
        }
        ProgressEvent::Error { message, .. } => {
            ServerMessage::Error { error_kind: "workflow_error".to_string(), message, recoverable: true }
        }
    }
}
