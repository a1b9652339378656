//! Research node (§4.5): produces findings + citations from the user query.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{catch, memory_metadata, retry_note};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::ProviderRegistry;
use crate::memory::Store;
use crate::state::{AgentName, WorkflowState};

const SYSTEM_PROMPT: &str = "You are a research agent. Given a user request, produce concise findings \
relevant to implementing it, with citations where applicable. Respond as plain prose; a summary is enough.";

pub struct ResearchNode {
    pub provider_registry: Arc<ProviderRegistry>,
    pub memory: Arc<dyn Store>,
}

#[async_trait]
impl Node<WorkflowState> for ResearchNode {
    fn id(&self) -> &str {
        "research"
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let mut prompt = format!("User request:\n{}\n\nWorkspace: {}", state.user_query, state.workspace_path);
        if let Some(note) = retry_note(&state, "research") {
            prompt.push_str(&note);
        }
        let result = match self.provider_registry.generate("research", &prompt, Some(SYSTEM_PROMPT), None, None).await {
            Ok(r) => r,
            Err(e) => return Ok(catch(state, "research", e.into())),
        };

        state.agent_outputs.insert("research".into(), json!({ "findings": result.content, "citations": Vec::<String>::new() }));

        let mut extra = HashMap::new();
        extra.insert("kind".to_string(), json!("research_highlight"));
        extra.insert("session_id".to_string(), json!(state.session_id));
        let metadata = memory_metadata("research", extra);
        if let Err(e) = self.memory.store(&result.content, metadata).await {
            tracing::warn!(error = %e, "failed to store research highlights in memory");
        }

        state.record_agent(AgentName::Research);
        Ok((state, Next::Continue))
    }
}
