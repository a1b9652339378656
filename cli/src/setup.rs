//! Assembles an `Engine` from on-disk config and environment secrets (§6.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiagent_engine::checkpoint::SqliteSaver;
use kiagent_engine::llm::{AgentBinding, AnthropicProvider, LlmProvider, OpenAiProvider, PerplexityProvider, ProviderRegistry};
use kiagent_engine::mcp::{McpClient, McpServerConfig};
use kiagent_engine::memory::{OpenAiEmbedder, SqliteVecStore};
use kiagent_engine::supervisor::SupervisorConfig;
use kiagent_engine::workflow::Engine;
use kiagent_engine::workspace::WorkspaceLayout;

#[derive(Debug, Clone)]
pub struct StartArgs {
    pub workspace_path: PathBuf,
    pub bindings_path: PathBuf,
    pub mcp_registry_path: PathBuf,
    pub file_server: String,
}

/// Fatal at startup (§7 Configuration errors): missing config, invalid
/// binding, missing API key.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] kiagent_config::ConfigError),
    #[error("missing environment variable {0}")]
    MissingEnv(String),
    #[error("binding {agent_name:?} references unknown provider {provider:?}")]
    UnknownProvider { agent_name: String, provider: String },
    #[error("checkpoint store init: {0}")]
    Checkpoint(#[from] kiagent_engine::checkpoint::CheckpointError),
    #[error("memory store init: {0}")]
    Memory(#[from] kiagent_engine::memory::StoreError),
}

fn env_var(name: &str) -> Result<String, SetupError> {
    std::env::var(name).map_err(|_| SetupError::MissingEnv(name.to_string()))
}

fn build_providers() -> Result<HashMap<String, Arc<dyn LlmProvider>>, SetupError> {
    let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
    if let Ok(key) = env_var("OPENAI_API_KEY") {
        providers.insert("openai".to_string(), Arc::new(OpenAiProvider::new(key)));
    }
    if let Ok(key) = env_var("ANTHROPIC_API_KEY") {
        providers.insert("anthropic".to_string(), Arc::new(AnthropicProvider::new(key)));
    }
    if let Ok(key) = env_var("PERPLEXITY_API_KEY") {
        providers.insert("perplexity".to_string(), Arc::new(PerplexityProvider::new(key)));
    }
    Ok(providers)
}

/// Builds the engine from `args`: loads bindings/MCP registry, validates
/// every binding names a configured provider, opens the checkpoint and
/// memory stores under the workspace layout, starts the MCP client.
pub fn build_engine(args: &StartArgs) -> Result<Arc<Engine>, SetupError> {
    let layout = WorkspaceLayout::new(&args.workspace_path);
    layout.ensure().map_err(|e| SetupError::MissingEnv(format!("workspace init: {e}")))?;

    let bindings_specs = kiagent_config::load_bindings(&args.bindings_path)?;
    let mcp_specs = kiagent_config::load_mcp_registry(&args.mcp_registry_path)?;

    let providers = build_providers()?;
    let mut bindings = Vec::with_capacity(bindings_specs.len());
    for (agent_name, spec) in bindings_specs {
        if !providers.contains_key(&spec.provider) {
            return Err(SetupError::UnknownProvider { agent_name, provider: spec.provider });
        }
        bindings.push(AgentBinding {
            agent_name,
            provider: spec.provider,
            model: spec.model,
            temperature: spec.temperature,
            max_tokens: spec.max_tokens,
            timeout_seconds: spec.timeout_seconds,
            description: spec.description,
        });
    }
    let provider_registry = Arc::new(ProviderRegistry::new(bindings, providers));

    let mcp_registry: HashMap<String, McpServerConfig> = mcp_specs
        .into_iter()
        .map(|(name, spec)| (name, McpServerConfig { command: spec.command, args: spec.args, env: spec.env }))
        .collect();
    let mcp = Arc::new(McpClient::new(args.workspace_path.clone(), mcp_registry));

    let checkpointer = Arc::new(SqliteSaver::new(layout.checkpoint_db())?);

    let embedder = Arc::new(OpenAiEmbedder::new(env_var("OPENAI_API_KEY")?, "text-embedding-3-small", 1536));
    let memory = Arc::new(SqliteVecStore::new(layout.memory_db(), args.workspace_path.to_string_lossy().to_string(), embedder)?);

    let engine = Engine::new(provider_registry, mcp, memory, checkpointer, SupervisorConfig::default(), args.file_server.clone())
        .map_err(|e| SetupError::MissingEnv(format!("graph compile: {e}")))?;
    Ok(Arc::new(engine))
}

pub fn default_bindings_path(workspace: &Path) -> PathBuf {
    workspace.join(".ki_autoagent_ws").join("bindings.json")
}

pub fn default_mcp_registry_path(workspace: &Path) -> PathBuf {
    workspace.join(".ki_autoagent_ws").join("mcp_registry.json")
}
