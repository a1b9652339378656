//! `WorkflowState`: the canonical shared state threaded through the graph.
//!
//! Immutable per node execution; nodes return a `StateUpdate` that the
//! engine merges in (never a full-state replacement), per §3.1/§4.5.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known agent names, in the order the table-driven router visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    Research,
    Architect,
    Codesmith,
    ReviewFix,
    Responder,
}

impl AgentName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Research => "research",
            AgentName::Architect => "architect",
            AgentName::Codesmith => "codesmith",
            AgentName::ReviewFix => "reviewfix",
            AgentName::Responder => "responder",
        }
    }
}

/// A structured error record appended to `WorkflowState.errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub agent_name: Option<String>,
    pub kind: String,
    pub message: String,
    pub retriable: bool,
    pub timestamp: DateTime<Utc>,
}

/// A structured prompt presented to a human for HITL approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlRequest {
    pub prompt: String,
    pub options: Option<Vec<String>>,
}

/// The canonical shared state threaded through the graph (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub session_id: String,
    pub workspace_path: String,
    pub user_query: String,

    pub last_agent: Option<String>,
    pub agent_history: Vec<String>,

    pub supervisor_iteration: u32,
    pub response_ready: bool,

    pub agent_outputs: HashMap<String, serde_json::Value>,

    pub review_iteration: u32,
    pub max_review_iterations: u32,

    pub last_quality_score: f64,
    pub quality_threshold: f64,

    pub build_validation_passed: bool,
    pub build_errors: HashMap<String, String>,

    pub hitl_pending: bool,
    pub hitl_request: Option<HitlRequest>,
    pub hitl_response: Option<String>,

    pub errors: Vec<ErrorRecord>,
}

impl WorkflowState {
    /// Starts a fresh session. `quality_threshold` defaults to the
    /// no-detectable-language fallback (0.75, §4.6) until validators run.
    pub fn new(session_id: impl Into<String>, workspace_path: impl Into<String>, user_query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            workspace_path: workspace_path.into(),
            user_query: user_query.into(),
            last_agent: None,
            agent_history: Vec::new(),
            supervisor_iteration: 0,
            response_ready: false,
            agent_outputs: HashMap::new(),
            review_iteration: 0,
            max_review_iterations: 3,
            last_quality_score: 0.0,
            quality_threshold: 0.75,
            build_validation_passed: false,
            build_errors: HashMap::new(),
            hitl_pending: false,
            hitl_request: None,
            hitl_response: None,
            errors: Vec::new(),
        }
    }

    /// Appends `agent` to the history and sets it as `last_agent`.
    /// `agent_history` is append-only (§3.1 invariant); never call this to
    /// remove or reorder entries.
    pub fn record_agent(&mut self, agent: AgentName) {
        self.agent_history.push(agent.as_str().to_string());
        self.last_agent = Some(agent.as_str().to_string());
    }

    pub fn last_agent_name(&self) -> Option<AgentName> {
        match self.last_agent.as_deref() {
            Some("research") => Some(AgentName::Research),
            Some("architect") => Some(AgentName::Architect),
            Some("codesmith") => Some(AgentName::Codesmith),
            Some("reviewfix") => Some(AgentName::ReviewFix),
            Some("responder") => Some(AgentName::Responder),
            _ => None,
        }
    }

    pub fn push_error(&mut self, agent_name: Option<&str>, kind: &str, message: impl Into<String>, retriable: bool) {
        self.errors.push(ErrorRecord {
            agent_name: agent_name.map(|s| s.to_string()),
            kind: kind.to_string(),
            message: message.into(),
            retriable,
            timestamp: Utc::now(),
        });
    }

    /// Count of retriable failures recorded so far, for the combined HITL
    /// escalation rule (§9 Open Question, §4.7).
    pub fn retriable_failure_count(&self) -> usize {
        self.errors.iter().filter(|e| e.retriable).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a fresh state has an empty, append-only agent_history.
    #[test]
    fn new_state_starts_with_empty_history() {
        let state = WorkflowState::new("s1", "/tmp/ws", "do the thing");
        assert!(state.agent_history.is_empty());
        assert!(state.last_agent.is_none());
        assert_eq!(state.quality_threshold, 0.75);
    }

    /// **Scenario**: record_agent appends, never replaces.
    #[test]
    fn record_agent_appends_to_history() {
        let mut state = WorkflowState::new("s1", "/tmp/ws", "q");
        state.record_agent(AgentName::Research);
        state.record_agent(AgentName::Architect);
        assert_eq!(state.agent_history, vec!["research", "architect"]);
        assert_eq!(state.last_agent_name(), Some(AgentName::Architect));
    }
}
