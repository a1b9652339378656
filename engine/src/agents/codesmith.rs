//! Codesmith node (§4.5): turns the architect design into file-write
//! operations via MCP file tools, all constrained to `workspace_path`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{catch, file_tools::write_file_via_mcp, retry_note};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::ProviderRegistry;
use crate::mcp::McpClient;
use crate::state::{AgentName, WorkflowState};

const SYSTEM_PROMPT: &str = "You are a code generation agent. Given a design document, emit the files to create. \
Respond with ONLY a JSON array of objects shaped {\"path\": string, \"content\": string}, paths relative to the \
workspace root. Do not wrap the array in markdown fences or add commentary.";

#[derive(Debug, Deserialize)]
struct FileSpec {
    path: String,
    content: String,
}

pub struct CodesmithNode {
    pub provider_registry: Arc<ProviderRegistry>,
    pub mcp: Arc<McpClient>,
    pub file_server: String,
}

#[async_trait]
impl Node<WorkflowState> for CodesmithNode {
    fn id(&self) -> &str {
        "codesmith"
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let design = state.agent_outputs.get("architect").and_then(|v| v.get("design")).and_then(|v| v.as_str()).unwrap_or_default().to_string();

        let mut prompt = format!("Design document:\n{design}");
        if let Some(note) = retry_note(&state, "codesmith") {
            prompt.push_str(&note);
        }
        let result = match self.provider_registry.generate("codesmith", &prompt, Some(SYSTEM_PROMPT), None, None).await {
            Ok(r) => r,
            Err(e) => return Ok(catch(state, "codesmith", e.into())),
        };

        let specs: Vec<FileSpec> = parse_file_specs(&result.content).map_err(|e| {
            AgentError::Invariant(format!("codesmith produced unparseable file specs: {e}"))
        })?;

        let workspace_path = Path::new(&state.workspace_path).to_path_buf();
        let mut generated_files = Vec::with_capacity(specs.len());
        for spec in specs {
            let written = match write_file_via_mcp(&self.mcp, &self.file_server, &workspace_path, &spec.path, &spec.content).await {
                Ok(w) => w,
                Err(e @ AgentError::Mcp(_)) => return Ok(catch(state, "codesmith", e)),
                Err(e) => return Err(e),
            };
            generated_files.push(written);
        }

        state.agent_outputs.insert("codesmith".into(), json!({ "generated_files": generated_files }));
        state.record_agent(AgentName::Codesmith);
        Ok((state, Next::Continue))
    }
}

fn parse_file_specs(content: &str) -> Result<Vec<FileSpec>, serde_json::Error> {
    let trimmed = content.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
    serde_json::from_str(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_file_specs_strips_markdown_fence() {
        let content = "```json\n[{\"path\": \"a.rs\", \"content\": \"fn main() {}\"}]\n```";
        let specs = parse_file_specs(content).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].path, "a.rs");
    }

    #[test]
    fn parse_file_specs_rejects_non_json() {
        assert!(parse_file_specs("not json at all").is_err());
    }
}
