//! Agent Nodes (C5, §4.5) and the ReviewFix loop (§4.6).
//!
//! Each node has the same shape: prepare inputs from state, invoke C1 (LLM)
//! or C2 (MCP), parse outputs, return an updated state.

mod architect;
mod codesmith;
mod file_tools;
mod research;
mod responder;
mod review_fix;

pub use architect::ArchitectNode;
pub use codesmith::CodesmithNode;
pub use file_tools::{read_file_via_mcp, write_file_via_mcp, GeneratedFile};
pub use research::ResearchNode;
pub use responder::ResponderNode;
pub use review_fix::ReviewFixNode;

use crate::error::AgentError;
use crate::graph::Next;
use crate::state::WorkflowState;

/// Converts a node-internal failure into a structured error record on
/// `state.errors` rather than propagating it out of the graph (§7
/// Propagation policy: "errors raised inside a node are caught by the
/// engine ... and surfaced to the Supervisor for routing decisions").
/// The node does not call `record_agent` on this path, so the Supervisor's
/// routing table still treats the failing agent as not-yet-completed.
pub(crate) fn catch(mut state: WorkflowState, agent_name: &str, err: AgentError) -> (WorkflowState, Next) {
    let retriable = err.retriable();
    state.push_error(Some(agent_name), err.kind(), err.to_string(), retriable);
    (state, Next::Continue)
}

/// When the Supervisor re-selects the same agent after a retriable failure
/// (§4.7: "the same agent is re-selected with the prior error appended to
/// its input"), the regenerated prompt must surface that failure instead of
/// rebuilding the exact same prompt that just failed. Returns `None` on a
/// clean first attempt.
pub(crate) fn retry_note(state: &WorkflowState, agent_name: &str) -> Option<String> {
    state
        .errors
        .iter()
        .rev()
        .find(|e| e.retriable && e.agent_name.as_deref() == Some(agent_name))
        .map(|e| format!("\n\nThe previous attempt failed with a {} error: {}\nTake this into account and try a different approach.", e.kind, e.message))
}

/// Populates the `agent_name`/`timestamp` keys §4.3 requires in every
/// memory-store metadata map, on top of caller-supplied keys.
pub(crate) fn memory_metadata(agent_name: &str, mut extra: std::collections::HashMap<String, serde_json::Value>) -> std::collections::HashMap<String, serde_json::Value> {
    extra.insert("agent_name".to_string(), serde_json::json!(agent_name));
    extra.insert("timestamp".to_string(), serde_json::json!(chrono::Utc::now().to_rfc3339()));
    extra
}
