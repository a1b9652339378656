//! Progress events streamed to the client channel throughout a run (§4.8).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    AgentStart { session_id: String, node_id: String },
    AgentComplete { session_id: String, node_id: String, state_snapshot: Value },
    RoutingDecision { session_id: String, from: Option<String>, to: String },
    ValidatorRun { session_id: String, validator_name: String, passed: bool },
    HitlRequest { session_id: String, prompt: String, options: Option<Vec<String>> },
    WorkflowComplete { session_id: String, response_ready: bool },
    Error { session_id: String, message: String },
}
