//! Error taxonomy shared across the engine.
//!
//! Kinds mirror the error taxonomy of the workflow contract: configuration,
//! protocol, provider, MCP, validator, workflow, and invariant-violation
//! errors all surface through `AgentError` so a node's `run` can return a
//! single error type regardless of which subsystem it called into.

use thiserror::Error;

/// Error returned by a graph node's `run`, or by engine-internal operations
/// that a node propagates.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("provider error: {0}")]
    Provider(#[from] crate::llm::ProviderError),

    #[error("mcp error: {0}")]
    Mcp(#[from] crate::mcp::McpError),

    #[error("validator error: {0}")]
    Validator(#[from] crate::validators::ValidatorError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("workspace path escape: {attempted} is outside {workspace}")]
    PathEscape { attempted: String, workspace: String },

    #[error("iteration budget exceeded at {iteration}")]
    IterationBudgetExceeded { iteration: u32 },

    #[error("cancelled")]
    Cancelled,

    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl AgentError {
    /// Whether the Supervisor should consider retrying the node that raised
    /// this error (§4.7 failure semantics).
    pub fn retriable(&self) -> bool {
        match self {
            AgentError::Provider(e) => e.retriable(),
            AgentError::Mcp(e) => e.retriable(),
            AgentError::Validator(_) => false,
            AgentError::Checkpoint(_) => false,
            AgentError::UnknownAgent(_) => false,
            AgentError::PathEscape { .. } => false,
            AgentError::IterationBudgetExceeded { .. } => false,
            AgentError::Cancelled => false,
            AgentError::Invariant(_) => false,
        }
    }

    /// Stable label for `ErrorRecord.kind` (§3.1), independent of the
    /// `Display` message.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Provider(_) => "provider_error",
            AgentError::Mcp(_) => "mcp_error",
            AgentError::Validator(_) => "validator_error",
            AgentError::Checkpoint(_) => "checkpoint_error",
            AgentError::UnknownAgent(_) => "unknown_agent",
            AgentError::PathEscape { .. } => "path_escape",
            AgentError::IterationBudgetExceeded { .. } => "iteration_budget_exceeded",
            AgentError::Cancelled => "cancelled",
            AgentError::Invariant(_) => "invariant_violation",
        }
    }
}
