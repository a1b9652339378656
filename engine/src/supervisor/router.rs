//! Table-driven Router (C6, §4.7): after every agent node, decide what
//! happens next. The node itself (`SupervisorNode`) mutates bookkeeping
//! state (iteration count, HITL escalation, routing trace); the actual
//! next-hop decision is a pure function of the resulting state, used both
//! here and as the graph's conditional router closure.

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::{AgentName, HitlRequest, WorkflowState};

use super::config::SupervisorConfig;

pub const SUPERVISOR_NODE_ID: &str = "supervisor";

pub struct SupervisorNode {
    pub config: SupervisorConfig,
}

#[async_trait]
impl Node<WorkflowState> for SupervisorNode {
    fn id(&self) -> &str {
        SUPERVISOR_NODE_ID
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        state.supervisor_iteration += 1;

        if state.response_ready {
            record_trace(&mut state, "response_ready, terminating");
            return Ok((state, Next::Continue));
        }

        if state.supervisor_iteration >= self.config.hard_iteration_cap {
            state.push_error(
                None,
                "iteration_budget_exceeded",
                format!("supervisor_iteration {} reached hard cap {}", state.supervisor_iteration, self.config.hard_iteration_cap),
                false,
            );
            state.response_ready = true;
            record_trace(&mut state, "iteration budget exceeded, forcing completion");
            return Ok((state, Next::Continue));
        }

        if state.hitl_pending && state.hitl_response.is_none() {
            record_trace(&mut state, "hitl pending with no response yet, suspending");
            return Ok((state, Next::Continue));
        }

        if state.hitl_pending && state.hitl_response.is_some() {
            // A resumed HITL response clears the pending flag so routing
            // can proceed normally on the next pass.
            state.hitl_pending = false;
        } else if should_escalate_to_hitl(&state, &self.config) {
            state.hitl_pending = true;
            state.hitl_request = Some(HitlRequest {
                prompt: format!(
                    "The workflow has accumulated {} retriable failures over {} iterations. Continue, retry, or abandon?",
                    state.retriable_failure_count(),
                    state.supervisor_iteration
                ),
                options: Some(vec!["continue".into(), "retry".into(), "abandon".into()]),
            });
            record_trace(&mut state, "escalating to HITL");
            return Ok((state, Next::Continue));
        }

        let next_agent = select_next_agent(&state, &self.config);
        record_trace(&mut state, &format!("routing to {next_agent:?}"));
        Ok((state, Next::Continue))
    }
}

/// Combined HITL escalation rule (§9 Open Question decision): too many
/// retriable failures, or the iteration budget is mostly consumed.
fn should_escalate_to_hitl(state: &WorkflowState, config: &SupervisorConfig) -> bool {
    state.retriable_failure_count() >= config.hitl_failure_threshold
        || (state.supervisor_iteration as f64) >= config.hitl_iteration_fraction * config.hard_iteration_cap as f64
}

/// Table-driven selection (§4.7): either retry the failed agent (if its
/// last failure was retriable and under the retry cap) or advance to the
/// next stage in the pipeline.
fn select_next_agent(state: &WorkflowState, config: &SupervisorConfig) -> AgentName {
    if let Some(last) = state.last_agent_name() {
        let retry_count = state.errors.iter().filter(|e| e.retriable && e.agent_name.as_deref() == Some(last.as_str())).count();
        if retry_count > 0 && (retry_count as u32) < config.max_agent_retries {
            return last;
        }
    }

    match state.last_agent_name() {
        None => AgentName::Research,
        Some(AgentName::Research) => AgentName::Architect,
        Some(AgentName::Architect) => AgentName::Codesmith,
        Some(AgentName::Codesmith) => AgentName::ReviewFix,
        Some(AgentName::ReviewFix) => AgentName::Responder,
        Some(AgentName::Responder) => AgentName::Responder,
    }
}

fn record_trace(state: &mut WorkflowState, message: &str) {
    let entry = json!({ "iteration": state.supervisor_iteration, "message": message });
    let trace = state.agent_outputs.entry("supervisor".to_string()).or_insert_with(|| json!({ "trace": [] }));
    if let Some(array) = trace.get_mut("trace").and_then(|t| t.as_array_mut()) {
        array.push(entry);
    }
}

/// The graph's conditional-edge path function for the `"supervisor"` node:
/// resolves to a node id string, or `END`, purely from state already
/// mutated by [`SupervisorNode::run`].
pub fn resolve_route(state: &WorkflowState, config: &SupervisorConfig) -> String {
    use crate::graph::END;

    if state.response_ready {
        return END.to_string();
    }
    if state.hitl_pending && state.hitl_response.is_none() {
        return END.to_string();
    }
    select_next_agent(state, config).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AgentName;

    fn base_state() -> WorkflowState {
        WorkflowState::new("s1", "/tmp/ws", "build a thing")
    }

    /// **Scenario**: an empty history routes to Research first (§4.7 rule 1).
    #[tokio::test]
    async fn supervisor_routes_to_research_first() {
        let node = SupervisorNode { config: SupervisorConfig::default() };
        let (state, _) = node.run(base_state()).await.unwrap();
        assert_eq!(select_next_agent(&state, &SupervisorConfig::default()), AgentName::Research);
    }

    /// **Scenario**: the full happy-path chain routes Research → Architect
    /// → Codesmith → ReviewFix → Responder.
    #[test]
    fn select_next_agent_follows_the_pipeline_order() {
        let config = SupervisorConfig::default();
        let mut state = base_state();
        assert_eq!(select_next_agent(&state, &config), AgentName::Research);
        state.record_agent(AgentName::Research);
        assert_eq!(select_next_agent(&state, &config), AgentName::Architect);
        state.record_agent(AgentName::Architect);
        assert_eq!(select_next_agent(&state, &config), AgentName::Codesmith);
        state.record_agent(AgentName::Codesmith);
        assert_eq!(select_next_agent(&state, &config), AgentName::ReviewFix);
        state.record_agent(AgentName::ReviewFix);
        assert_eq!(select_next_agent(&state, &config), AgentName::Responder);
    }

    /// **Scenario**: a retriable failure on the current agent re-selects it,
    /// up to the retry cap.
    #[test]
    fn select_next_agent_retries_retriable_failure() {
        let config = SupervisorConfig::default();
        let mut state = base_state();
        state.record_agent(AgentName::Research);
        state.push_error(Some("research"), "provider_timeout", "timed out", true);
        assert_eq!(select_next_agent(&state, &config), AgentName::Research);
    }

    /// **Scenario**: `response_ready` routes straight to END regardless of history.
    #[test]
    fn resolve_route_ends_when_response_ready() {
        let config = SupervisorConfig::default();
        let mut state = base_state();
        state.response_ready = true;
        assert_eq!(resolve_route(&state, &config), crate::graph::END);
    }

    /// **Scenario**: hitl_pending with no response yet suspends (routes to END).
    #[test]
    fn resolve_route_suspends_on_pending_hitl() {
        let config = SupervisorConfig::default();
        let mut state = base_state();
        state.hitl_pending = true;
        assert_eq!(resolve_route(&state, &config), crate::graph::END);
    }

    /// **Scenario**: accumulating 3 retriable failures escalates to HITL.
    #[tokio::test]
    async fn supervisor_escalates_to_hitl_after_failure_threshold() {
        let node = SupervisorNode { config: SupervisorConfig::default() };
        let mut state = base_state();
        for _ in 0..3 {
            state.push_error(Some("research"), "provider_unavailable", "down", true);
        }
        let (state, _) = node.run(state).await.unwrap();
        assert!(state.hitl_pending);
        assert!(state.hitl_request.is_some());
    }

    /// **Scenario**: reaching the hard iteration cap force-terminates with
    /// an error rather than looping forever.
    #[tokio::test]
    async fn supervisor_terminates_at_hard_iteration_cap() {
        let config = SupervisorConfig { hard_iteration_cap: 2, ..SupervisorConfig::default() };
        let node = SupervisorNode { config };
        let mut state = base_state();
        state.supervisor_iteration = 1;
        let (state, _) = node.run(state).await.unwrap();
        assert!(state.response_ready);
        assert!(state.errors.iter().any(|e| e.kind == "iteration_budget_exceeded"));
    }
}
