//! MCP Client (C2, §4.2): JSON-RPC 2.0 over child-process stdio, with
//! server lifecycle management and crash recovery.

mod client;
mod error;
mod protocol;

pub use client::{McpClient, McpServerConfig, McpServerState};
pub use error::McpError;
pub use protocol::{JsonRpcMessage, JsonRpcNotificationOut, JsonRpcRequest, RawMessage, RequestId};
