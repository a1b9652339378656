//! MCP error taxonomy (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("server crashed: {0}")]
    ServerCrashed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("tool not found: {tool} on server {server}")]
    ToolNotFound { server: String, tool: String },

    #[error("tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("initialize handshake failed: {0}")]
    Initialize(String),

    #[error("cancelled")]
    Cancelled,
}

impl McpError {
    /// A crashed server is retriable (the next `call` transparently
    /// restarts it, §4.2); malformed/protocol errors are not.
    pub fn retriable(&self) -> bool {
        matches!(self, McpError::ServerCrashed(_) | McpError::Timeout(_))
    }
}
