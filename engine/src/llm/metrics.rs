//! `LLMCallMetrics` (§3.1): one record appended per provider call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallMetrics {
    pub agent_name: String,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// True when token counts were estimated (chars / 4) because the
    /// provider response didn't report usage (§4.1).
    pub estimated: bool,
    pub api_latency_ms: u64,
    pub total_latency_ms: u64,
    pub cost_usd: Decimal,
    pub memory_rss_delta_bytes: i64,
    pub status: CallStatus,
    pub error_kind: Option<String>,
    pub timestamp: DateTime<Utc>,
}
