//! LLM Provider Registry (C1, §4.1): per-agent binding, retry, and cost
//! accounting over the provider trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ProviderError;
use super::metrics::{CallStatus, LlmCallMetrics};
use super::pricing::{compute_cost, pricing_for};
use super::provider::{CompletionRequest, LlmProvider};
use crate::graph::retry::provider_retry_policy;

/// `{agent_name, provider, model, temperature, max_tokens, timeout_seconds}`
/// (§3.1). One binding per agent name, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBinding {
    pub agent_name: String,
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: rust_decimal::Decimal,
    pub latency_ms: u64,
    pub model: String,
    pub provider: String,
}

/// Binds agent names to provider SDK instances and enforces §4.1's uniform
/// `generate` contract: retry policy by error kind, metrics on every call.
pub struct ProviderRegistry {
    bindings: HashMap<String, AgentBinding>,
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    metrics: Mutex<Vec<LlmCallMetrics>>,
}

impl ProviderRegistry {
    pub fn new(bindings: Vec<AgentBinding>, providers: HashMap<String, Arc<dyn LlmProvider>>) -> Self {
        let bindings = bindings.into_iter().map(|b| (b.agent_name.clone(), b)).collect();
        Self { bindings, providers, metrics: Mutex::new(Vec::new()) }
    }

    pub fn metrics(&self) -> Vec<LlmCallMetrics> {
        self.metrics.lock().unwrap().clone()
    }

    /// `generate(agent_name, prompt, system_prompt?, tools?, timeout?)`
    /// (§4.1). Retries per the error-kind table, appends one
    /// `LlmCallMetrics` record regardless of outcome.
    pub async fn generate(
        &self,
        agent_name: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        tools: Option<Vec<Value>>,
        timeout_override: Option<u64>,
    ) -> Result<GenerateResult, ProviderError> {
        let binding = self.bindings.get(agent_name).ok_or_else(|| ProviderError::UnknownAgent(agent_name.to_string()))?;
        let provider = self.providers.get(&binding.provider).ok_or_else(|| ProviderError::UnknownAgent(binding.provider.clone()))?;
        let timeout_seconds = timeout_override.unwrap_or(binding.timeout_seconds);

        tracing::info!(agent_name, provider = %binding.provider, model = %binding.model, "llm call starting");
        let total_start = Instant::now();

        let request = CompletionRequest {
            model: binding.model.clone(),
            system_prompt: system_prompt.map(str::to_string),
            prompt: prompt.to_string(),
            tools,
            temperature: binding.temperature,
            max_tokens: binding.max_tokens,
        };

        let result = self.call_with_retry(provider.as_ref(), request, timeout_seconds).await;
        let total_latency_ms = total_start.elapsed().as_millis() as u64;

        match result {
            Ok((response, api_latency_ms)) => {
                let (input_tokens, estimated_in) = response.usage.input_tokens.map(|t| (t, false)).unwrap_or_else(|| (estimate_tokens(prompt), true));
                let (output_tokens, estimated_out) =
                    response.usage.output_tokens.map(|t| (t, false)).unwrap_or_else(|| (estimate_tokens(&response.content), true));
                let pricing = pricing_for(&binding.provider, &binding.model);
                let cost_usd = compute_cost(pricing, input_tokens, output_tokens);

                self.metrics.lock().unwrap().push(LlmCallMetrics {
                    agent_name: agent_name.to_string(),
                    provider: binding.provider.clone(),
                    model: binding.model.clone(),
                    input_tokens,
                    output_tokens,
                    estimated: estimated_in || estimated_out,
                    api_latency_ms,
                    total_latency_ms,
                    cost_usd,
                    memory_rss_delta_bytes: 0,
                    status: CallStatus::Success,
                    error_kind: None,
                    timestamp: Utc::now(),
                });
                tracing::info!(agent_name, cost_usd = %cost_usd, "llm call succeeded");

                Ok(GenerateResult {
                    content: response.content,
                    input_tokens,
                    output_tokens,
                    cost_usd,
                    latency_ms: api_latency_ms,
                    model: binding.model.clone(),
                    provider: binding.provider.clone(),
                })
            }
            Err(error) => {
                self.metrics.lock().unwrap().push(LlmCallMetrics {
                    agent_name: agent_name.to_string(),
                    provider: binding.provider.clone(),
                    model: binding.model.clone(),
                    input_tokens: 0,
                    output_tokens: 0,
                    estimated: false,
                    api_latency_ms: total_latency_ms,
                    total_latency_ms,
                    cost_usd: rust_decimal::Decimal::ZERO,
                    memory_rss_delta_bytes: 0,
                    status: CallStatus::Error,
                    error_kind: Some(error_kind_label(&error)),
                    timestamp: Utc::now(),
                });
                tracing::warn!(agent_name, error = %error, "llm call failed");
                Err(error)
            }
        }
    }

    async fn call_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: CompletionRequest,
        timeout_seconds: u64,
    ) -> Result<(super::provider::CompletionResponse, u64), ProviderError> {
        // §4.1: rate limit / unavailable use the shared exponential backoff;
        // timeout retries exactly once; auth never retries.
        let backoff = provider_retry_policy();
        let mut attempt: u32 = 0;
        let mut timeout_retried = false;

        loop {
            attempt += 1;
            let call_start = Instant::now();
            let outcome = tokio::time::timeout(std::time::Duration::from_secs(timeout_seconds.max(1)), provider.complete(request.clone()))
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout { provider: provider.name().to_string(), timeout_seconds }));
            let api_latency_ms = call_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => return Ok((response, api_latency_ms)),
                Err(error @ ProviderError::Auth { .. }) => return Err(error),
                Err(ProviderError::Timeout { provider: p, timeout_seconds: t }) => {
                    if !timeout_retried {
                        timeout_retried = true;
                        continue;
                    }
                    return Err(ProviderError::Timeout { provider: p, timeout_seconds: t });
                }
                Err(error @ (ProviderError::RateLimit { .. } | ProviderError::Unavailable { .. })) => {
                    if backoff.should_retry(attempt as usize) {
                        tokio::time::sleep(backoff.delay(attempt as usize)).await;
                        continue;
                    }
                    return Err(error);
                }
                Err(other) => return Err(other),
            }
        }
    }
}

/// Character-count ÷ 4 token estimate for responses that omit usage (§4.1).
fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() as u32 / 4).max(1)
}

fn error_kind_label(error: &ProviderError) -> String {
    match error {
        ProviderError::UnknownAgent(_) => "unknown_agent".into(),
        ProviderError::RateLimit { .. } => "rate_limit".into(),
        ProviderError::Timeout { .. } => "timeout".into(),
        ProviderError::Auth { .. } => "auth".into(),
        ProviderError::Unavailable { .. } => "unavailable".into(),
        ProviderError::MalformedResponse { .. } => "malformed_response".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        fail_times: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "openai"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<super::super::provider::CompletionResponse, ProviderError> {
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(ProviderError::RateLimit { provider: "openai".into(), message: "slow down".into() });
            }
            Ok(super::super::provider::CompletionResponse { content: "ok".into(), usage: Default::default() })
        }
    }

    fn binding() -> AgentBinding {
        AgentBinding {
            agent_name: "research".into(),
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_seconds: 30,
            description: None,
        }
    }

    /// **Scenario**: a rate-limited call succeeds after retrying within the
    /// backoff budget.
    #[tokio::test]
    async fn generate_retries_rate_limit_then_succeeds() {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert("openai".into(), Arc::new(FlakyProvider { fail_times: AtomicU32::new(2) }));
        let registry = ProviderRegistry::new(vec![binding()], providers);

        let result = registry.generate("research", "hello", None, None, None).await.unwrap();
        assert_eq!(result.content, "ok");
        assert_eq!(registry.metrics().len(), 1);
        assert_eq!(registry.metrics()[0].status as u8, CallStatus::Success as u8);
    }

    #[tokio::test]
    async fn generate_unknown_agent_fails_without_provider_call() {
        let registry = ProviderRegistry::new(vec![], HashMap::new());
        let err = registry.generate("ghost", "hi", None, None, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownAgent(_)));
    }
}
