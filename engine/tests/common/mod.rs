//! Shared fixtures for end-to-end engine tests: a scripted `LlmProvider`
//! (adapted from `llm::registry::tests::FlakyProvider` to toggle rather than
//! count down, since these tests drive two separate `Engine::run`/`resume`
//! calls) and the wiring to stand up a real `Engine` against a temp
//! workspace and the `fake_mcp_server` fixture binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kiagent_engine::checkpoint::MemorySaver;
use kiagent_engine::llm::{
    AgentBinding, CompletionRequest, CompletionResponse, LlmProvider, ProviderError, ProviderRegistry, TokenUsage,
};
use kiagent_engine::mcp::{McpClient, McpServerConfig};
use kiagent_engine::memory::{Embedder, EmbedderError, InMemoryStore};
use kiagent_engine::supervisor::SupervisorConfig;
use kiagent_engine::workflow::Engine;

pub const FILE_SERVER: &str = "filesystem";

/// A provider whose per-model canned response can be toggled to fail with a
/// retriable `Timeout` — no backoff sleep on that path (§4.1), so flipping
/// `failing` lets a test drive a node through several real failures without
/// waiting out the registry's rate-limit backoff.
pub struct ScriptedProvider {
    pub failing_model: String,
    pub failing: Arc<AtomicBool>,
    pub responses: HashMap<String, &'static str>,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        if request.model == self.failing_model && self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Timeout { provider: "fake".into(), timeout_seconds: 1 });
        }
        let content = self.responses.get(request.model.as_str()).copied().unwrap_or_default();
        Ok(CompletionResponse { content: content.to_string(), usage: TokenUsage::default() })
    }
}

pub struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
        Ok(vec![1.0, 0.0, 0.0])
    }
    fn dimension(&self) -> usize {
        3
    }
}

fn bindings() -> Vec<AgentBinding> {
    let entry = |agent_name: &str, model: &str| AgentBinding {
        agent_name: agent_name.to_string(),
        provider: "fake".to_string(),
        model: model.to_string(),
        temperature: 0.2,
        max_tokens: 1024,
        timeout_seconds: 5,
        description: None,
    };
    vec![
        entry("research", "fake-research"),
        entry("architect", "fake-architect"),
        entry("codesmith", "fake-codesmith"),
        entry("reviewer", "fake-reviewer"),
        entry("fixer", "fake-fixer"),
        entry("responder", "fake-responder"),
    ]
}

fn canned_responses() -> HashMap<String, &'static str> {
    let mut m = HashMap::new();
    m.insert("fake-research".to_string(), "REST APIs in Rust typically use axum or actix-web.");
    m.insert("fake-architect".to_string(), "Create a single binary crate with one main.rs implementing a hello-world HTTP handler.");
    m.insert("fake-codesmith".to_string(), r#"[{"path": "src/greeting.rs", "content": "pub fn greeting() -> &'static str { \"hello\" }\n"}]"#);
    m.insert("fake-reviewer".to_string(), r#"{"score": 0.9, "feedback": "clean and minimal"}"#);
    m.insert("fake-fixer".to_string(), "[]");
    m.insert("fake-responder".to_string(), "Built src/greeting.rs and it passed review.");
    m
}

/// Builds an `Engine` wired to a `ScriptedProvider` (`failing_model`/`failing`
/// control one binding's behavior) and the `fake_mcp_server` fixture,
/// rooted at `workspace`.
pub fn build_test_engine(workspace: &std::path::Path, failing_model: &str, failing: Arc<AtomicBool>) -> Arc<Engine> {
    let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
    providers.insert(
        "fake".to_string(),
        Arc::new(ScriptedProvider { failing_model: failing_model.to_string(), failing, responses: canned_responses() }),
    );
    let provider_registry = Arc::new(ProviderRegistry::new(bindings(), providers));

    let mut mcp_registry = HashMap::new();
    mcp_registry.insert(
        FILE_SERVER.to_string(),
        McpServerConfig { command: env!("CARGO_BIN_EXE_fake_mcp_server").to_string(), args: vec![], env: HashMap::new() },
    );
    let mcp = Arc::new(McpClient::new(workspace.to_path_buf(), mcp_registry));

    let memory = Arc::new(InMemoryStore::new(workspace.to_string_lossy().to_string(), Arc::new(FixedEmbedder)));
    let checkpointer = Arc::new(MemorySaver::new());

    let engine = Engine::new(provider_registry, mcp, memory, checkpointer, SupervisorConfig::default(), FILE_SERVER).expect("graph compiles");
    Arc::new(engine)
}
