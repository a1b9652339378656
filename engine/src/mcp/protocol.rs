//! JSON-RPC 2.0 wire types for the MCP stdio transport (§4.2).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request id, either a number or a string — MCP servers may use either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self { jsonrpc: "2.0", id, method: method.into(), params }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotificationOut {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotificationOut {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self { jsonrpc: "2.0", method: method.into(), params }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Raw shape of any line read from a server's stdout. Classified into
/// [`JsonRpcMessage`] afterwards: a tagged `#[serde(untagged)]` enum can't
/// reliably distinguish "response with no result/error yet filled in" from
/// "request" since both carry an optional-looking `id` + extra fields, so
/// classification is done explicitly by presence of `method` vs
/// `result`/`error`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// One line read from a server's stdout, classified.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Response { id: RequestId, result: Option<Value>, error: Option<JsonRpcError> },
    Request { id: RequestId, method: String, params: Value },
    Notification { method: String, params: Value },
}

impl JsonRpcMessage {
    pub fn classify(raw: RawMessage) -> Option<Self> {
        match (raw.id, raw.method) {
            (Some(id), Some(method)) => Some(JsonRpcMessage::Request { id, method, params: raw.params.unwrap_or(Value::Null) }),
            (Some(id), None) => Some(JsonRpcMessage::Response { id, result: raw.result, error: raw.error }),
            (None, Some(method)) => Some(JsonRpcMessage::Notification { method, params: raw.params.unwrap_or(Value::Null) }),
            (None, None) => None,
        }
    }
}
