//! Architect node (§4.5): turns research + user query into a structured
//! design (file layout, components, dependencies).

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

const SYSTEM_PROMPT: &str = "You are a software architect. Given research findings and a user request, produce a \
design: the file layout, the components involved, and their dependencies. Be concrete about file paths \
so a code-generation agent can act on them directly.";

pub struct ArchitectNode {
    pub provider_registry: Arc<ProviderRegistry>,
    pub memory: Arc<dyn Store>,
}

#[async_trait]
impl Node<WorkflowState> for ArchitectNode {
    fn id(&self) -> &str {
        "architect"
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let research = state.agent_outputs.get("research").and_then(|v| v.get("findings")).and_then(|v| v.as_str()).unwrap_or_default().to_string();

        let mut prompt = format!("User request:\n{}\n\nResearch findings:\n{}", state.user_query, research);
        if let Some(note) = retry_note(&state, "architect") {
            prompt.push_str(&note);
        }
        let result = match self.provider_registry.generate("architect", &prompt, Some(SYSTEM_PROMPT), None, None).await {
            Ok(r) => r,
            Err(e) => return Ok(catch(state, "architect", e.into())),
        };

        state.agent_outputs.insert("architect".into(), json!({ "design": result.content }));

        let mut extra = HashMap::new();
        extra.insert("kind".to_string(), json!("adr_summary"));
        extra.insert("session_id".to_string(), json!(state.session_id));
        let metadata = memory_metadata("architect", extra);
        let adr_summary = format!("ADR for session {}: {}", state.session_id, result.content);
        if let Err(e) = self.memory.store(&adr_summary, metadata).await {
            tracing::warn!(error = %e, "failed to store ADR summary in memory");
        }

        state.record_agent(AgentName::Architect);
        Ok((state, Next::Continue))
    }
}
