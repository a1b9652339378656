//! Provider SDK boundary (§6, out-of-scope collaborators): thin wrappers
//! around the OpenAI/Anthropic/Perplexity HTTP APIs behind one trait so the
//! registry never branches on provider identity beyond dispatch.

use async_trait::async_trait;
use serde_json::Value;

use super::error::ProviderError;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub tools: Option<Vec<Value>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// One provider SDK's chat-completion surface, reduced to what the registry
/// needs (§4.1's uniform `generate` depends on this, not on provider
/// specifics).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

pub struct OpenAiProvider {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self { client: async_openai::Client::with_config(config) }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        use async_openai::types::chat::{
            ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
            CreateChatCompletionRequestArgs,
        };

        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(system.as_str())));
        }
        messages.push(ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(request.prompt.as_str())));

        let body = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| ProviderError::MalformedResponse { provider: "openai".into(), message: e.to_string() })?;

        let response = self.client.chat().create(body).await.map_err(|e| classify_openai_error(e))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| TokenUsage { input_tokens: Some(u.prompt_tokens), output_tokens: Some(u.completion_tokens) })
            .unwrap_or_default();

        Ok(CompletionResponse { content, usage })
    }
}

fn classify_openai_error(error: async_openai::error::OpenAIError) -> ProviderError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("invalid api key") {
        ProviderError::Auth { provider: "openai".into(), message }
    } else if lower.contains("429") || lower.contains("rate limit") {
        ProviderError::RateLimit { provider: "openai".into(), message }
    } else if lower.contains("timed out") || lower.contains("timeout") {
        ProviderError::Timeout { provider: "openai".into(), timeout_seconds: 0 }
    } else {
        ProviderError::Unavailable { provider: "openai".into(), message }
    }
}

/// Anthropic Messages API, called directly via `reqwest` (no official SDK
/// in the teacher's dependency stack).
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into() }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system_prompt.unwrap_or_default(),
            "messages": [{ "role": "user", "content": request.prompt }],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable { provider: "anthropic".into(), message: e.to_string() })?;

        classify_http_status("anthropic", response.status())?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse { provider: "anthropic".into(), message: e.to_string() })?;

        let content = payload["content"][0]["text"].as_str().unwrap_or_default().to_string();
        let usage = TokenUsage {
            input_tokens: payload["usage"]["input_tokens"].as_u64().map(|n| n as u32),
            output_tokens: payload["usage"]["output_tokens"].as_u64().map(|n| n as u32),
        };

        Ok(CompletionResponse { content, usage })
    }
}

/// Perplexity's OpenAI-compatible chat completions endpoint.
pub struct PerplexityProvider {
    client: reqwest::Client,
    api_key: String,
}

impl PerplexityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into() }
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post("https://api.perplexity.ai/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable { provider: "perplexity".into(), message: e.to_string() })?;

        classify_http_status("perplexity", response.status())?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse { provider: "perplexity".into(), message: e.to_string() })?;

        let content = payload["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string();
        let usage = TokenUsage {
            input_tokens: payload["usage"]["prompt_tokens"].as_u64().map(|n| n as u32),
            output_tokens: payload["usage"]["completion_tokens"].as_u64().map(|n| n as u32),
        };

        Ok(CompletionResponse { content, usage })
    }
}

fn classify_http_status(provider: &'static str, status: reqwest::StatusCode) -> Result<(), ProviderError> {
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        401 | 403 => Err(ProviderError::Auth { provider: provider.into(), message: status.to_string() }),
        429 => Err(ProviderError::RateLimit { provider: provider.into(), message: status.to_string() }),
        408 => Err(ProviderError::Timeout { provider: provider.into(), timeout_seconds: 0 }),
        _ => Err(ProviderError::Unavailable { provider: provider.into(), message: status.to_string() }),
    }
}
