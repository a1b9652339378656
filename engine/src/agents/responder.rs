//! Responder node (§4.5): synthesizes the final user-facing response and
//! sets `response_ready=true`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::catch;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::ProviderRegistry;
use crate::state::{AgentName, WorkflowState};

const SYSTEM_PROMPT: &str = "You are summarizing the outcome of a multi-agent coding workflow for the end user. \
Be concise: what was built, where, and whether it passed validation. Mention degraded quality explicitly if present.";

pub struct ResponderNode {
    pub provider_registry: Arc<ProviderRegistry>,
}

#[async_trait]
impl Node<WorkflowState> for ResponderNode {
    fn id(&self) -> &str {
        "responder"
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let generated_files = state
            .agent_outputs
            .get("codesmith")
            .and_then(|v| v.get("generated_files"))
            .cloned()
            .unwrap_or_else(|| json!([]));

        let prompt = format!(
            "User request:\n{}\n\nGenerated files:\n{generated_files}\n\nQuality score: {:.2} (threshold {:.2}).\nBuild validation passed: {}.",
            state.user_query, state.last_quality_score, state.quality_threshold, state.build_validation_passed
        );

        let result = match self.provider_registry.generate("responder", &prompt, Some(SYSTEM_PROMPT), None, None).await {
            Ok(r) => r,
            Err(e) => return Ok(catch(state, "responder", e.into())),
        };

        state.agent_outputs.insert(
            "responder".into(),
            json!({
                "response": result.content,
                "degraded": !state.build_validation_passed,
            }),
        );
        state.response_ready = true;
        state.record_agent(AgentName::Responder);
        // The Supervisor (not this node) owns the terminal decision: every
        // agent edges back to it, and its conditional router ends the graph
        // once `response_ready` is observed (§4.7).
        Ok((state, Next::Continue))
    }
}
