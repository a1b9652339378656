//! Provider error taxonomy (§4.1, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown agent binding: {0}")]
    UnknownAgent(String),

    #[error("rate limited by {provider}: {message}")]
    RateLimit { provider: String, message: String },

    #[error("timed out calling {provider} after {timeout_seconds}s")]
    Timeout { provider: String, timeout_seconds: u64 },

    #[error("authentication failed for {provider}: {message}")]
    Auth { provider: String, message: String },

    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },
}

impl ProviderError {
    /// Retriable subset per §4.1: rate limit and unavailable retry on the
    /// shared exponential backoff; timeout retries exactly once (enforced by
    /// the registry's attempt counter, not by this flag); auth never
    /// retries.
    pub fn retriable(&self) -> bool {
        matches!(self, ProviderError::RateLimit { .. } | ProviderError::Unavailable { .. } | ProviderError::Timeout { .. })
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            ProviderError::RateLimit { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::Auth { provider, .. }
            | ProviderError::Unavailable { provider, .. }
            | ProviderError::MalformedResponse { provider, .. } => Some(provider),
            ProviderError::UnknownAgent(_) => None,
        }
    }
}
