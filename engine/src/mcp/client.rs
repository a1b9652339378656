//! MCP Client (C2, §4.2): JSON-RPC 2.0 over child-process stdio.
//!
//! Reimplemented directly on `tokio::process` rather than wrapping an
//! external MCP SDK, since the transport is core spec surface (see
//! DESIGN.md). Grounded on the teacher's `McpSession` for the handshake and
//! request/response correlation shape, rebuilt as a background reader task
//! dispatching to `oneshot` channels keyed by request id instead of a
//! blocking `mpsc::recv_timeout` poll loop.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use super::error::McpError;
use super::protocol::{JsonRpcMessage, JsonRpcNotificationOut, JsonRpcRequest, RawMessage, RequestId};

const PROTOCOL_VERSION: &str = "2025-06-18";

/// Static configuration for one named MCP server (§6.2 MCP server registry).
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Lifecycle state of a server's subprocess (§3.1 `MCPServerHandle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpServerState {
    Starting,
    Ready,
    Degraded,
    Closed,
}

type Pending = Arc<std::sync::Mutex<HashMap<RequestId, oneshot::Sender<Result<Value, McpError>>>>>;
type ProgressCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

struct ServerProcess {
    server_name: String,
    child: AsyncMutex<Child>,
    stdin: AsyncMutex<ChildStdin>,
    next_request_id: AtomicI64,
    pending: Pending,
    available_tools: std::sync::Mutex<HashSet<String>>,
    state: std::sync::Mutex<McpServerState>,
    reader_task: AsyncMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ServerProcess {
    fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_request_id.fetch_add(1, Ordering::SeqCst))
    }

    fn set_state(&self, state: McpServerState) {
        *self.state.lock().unwrap() = state;
    }

    fn state(&self) -> McpServerState {
        *self.state.lock().unwrap()
    }
}

/// Implements `call`/`call_many`/`list_tools`/`close` (§4.2 public operations).
pub struct McpClient {
    workspace_path: PathBuf,
    registry: HashMap<String, McpServerConfig>,
    servers: AsyncMutex<HashMap<String, Arc<ServerProcess>>>,
    progress_callback: Option<ProgressCallback>,
}

impl McpClient {
    pub fn new(workspace_path: impl Into<PathBuf>, registry: HashMap<String, McpServerConfig>) -> Self {
        Self { workspace_path: workspace_path.into(), registry, servers: AsyncMutex::new(HashMap::new()), progress_callback: None }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// `call(server, tool, arguments, timeout?) → result` (§4.2).
    pub async fn call(&self, server: &str, tool: &str, arguments: Value, timeout: Option<Duration>) -> Result<Value, McpError> {
        let process = self.ensure_server(server).await?;
        let fut = self.call_on(&process, "tools/call", json!({ "name": tool, "arguments": arguments }));
        match timeout {
            Some(duration) => tokio::time::timeout(duration, fut).await.map_err(|_| McpError::Timeout(duration))?,
            None => fut.await,
        }
    }

    /// `call_many([(server, tool, arguments), …]) → [results]`, dispatched
    /// in parallel (§4.2, §5 parallelism).
    pub async fn call_many(&self, calls: Vec<(String, String, Value)>) -> Vec<Result<Value, McpError>> {
        let futures = calls.into_iter().map(|(server, tool, args)| async move { self.call(&server, &tool, args, None).await });
        futures::future::join_all(futures).await
    }

    pub async fn list_tools(&self, server: &str) -> Result<HashSet<String>, McpError> {
        let process = self.ensure_server(server).await?;
        Ok(process.available_tools.lock().unwrap().clone())
    }

    /// Closes stdin on every running server (graceful EOF shutdown, §4.2).
    pub async fn close(&self) -> Result<(), McpError> {
        let mut servers = self.servers.lock().await;
        for (_, process) in servers.drain() {
            process.set_state(McpServerState::Closed);
            let mut stdin = process.stdin.lock().await;
            let _ = stdin.shutdown().await;
            if let Some(handle) = process.reader_task.lock().await.take() {
                handle.abort();
            }
            let mut child = process.child.lock().await;
            let _ = child.start_kill();
        }
        Ok(())
    }

    async fn ensure_server(&self, server: &str) -> Result<Arc<ServerProcess>, McpError> {
        let mut servers = self.servers.lock().await;
        if let Some(process) = servers.get(server) {
            if process.state() != McpServerState::Degraded {
                return Ok(process.clone());
            }
            // Transparent restart (§4.2): a degraded server is respawned
            // on the next call rather than surfaced to the caller.
        }

        let config = self.registry.get(server).ok_or_else(|| McpError::UnknownServer(server.to_string()))?;
        let process = self.spawn_server(server, config).await?;
        self.initialize(&process).await?;
        servers.insert(server.to_string(), process.clone());
        Ok(process)
    }

    async fn spawn_server(&self, server: &str, config: &McpServerConfig) -> Result<Arc<ServerProcess>, McpError> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .current_dir(&self.workspace_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| McpError::Transport(e.to_string()))?;
        let stdin = child.stdin.take().ok_or_else(|| McpError::Transport("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::Transport("no stdout".into()))?;
        let stderr = child.stderr.take();

        let pending: Pending = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let process = Arc::new(ServerProcess {
            server_name: server.to_string(),
            child: AsyncMutex::new(child),
            stdin: AsyncMutex::new(stdin),
            next_request_id: AtomicI64::new(1),
            pending: pending.clone(),
            available_tools: std::sync::Mutex::new(HashSet::new()),
            state: std::sync::Mutex::new(McpServerState::Starting),
            reader_task: AsyncMutex::new(None),
        });

        if let Some(stderr) = stderr {
            let server_name = server.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(server = %server_name, "mcp stderr: {line}");
                }
            });
        }

        let progress_callback = self.progress_callback.clone();
        let reader_process = process.clone();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let raw: RawMessage = match serde_json::from_str(&line) {
                            Ok(r) => r,
                            Err(e) => {
                                tracing::warn!("malformed mcp line: {e}");
                                continue;
                            }
                        };
                        match JsonRpcMessage::classify(raw) {
                            Some(JsonRpcMessage::Response { id, result, error }) => {
                                if let Some(sender) = reader_process.pending.lock().unwrap().remove(&id) {
                                    let resolved = match error {
                                        Some(e) => Err(McpError::ToolCallFailed(e.message)),
                                        None => Ok(result.unwrap_or(Value::Null)),
                                    };
                                    let _ = sender.send(resolved);
                                }
                                // A late response for an id no caller is
                                // awaiting (cancelled, §4.2) is dropped.
                            }
                            Some(JsonRpcMessage::Notification { method, params }) => {
                                if method == "$/progress" {
                                    if let Some(cb) = &progress_callback {
                                        cb(&reader_process.server_name, &params);
                                    }
                                }
                            }
                            Some(JsonRpcMessage::Request { id, method, .. }) if method == "roots/list" => {
                                let response = json!({ "jsonrpc": "2.0", "id": id, "result": { "roots": [] } });
                                if let Ok(text) = serde_json::to_string(&response) {
                                    let mut stdin = reader_process.stdin.lock().await;
                                    let _ = stdin.write_all(text.as_bytes()).await;
                                    let _ = stdin.write_all(b"\n").await;
                                }
                            }
                            _ => {}
                        }
                    }
                    Ok(None) => {
                        // EOF: server exited. Fail all pending calls and
                        // mark degraded for transparent restart (§4.2).
                        reader_process.set_state(McpServerState::Degraded);
                        let mut pending = reader_process.pending.lock().unwrap();
                        for (_, sender) in pending.drain() {
                            let _ = sender.send(Err(McpError::ServerCrashed(reader_process.server_name.clone())));
                        }
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("mcp stdout read error: {e}");
                        reader_process.set_state(McpServerState::Degraded);
                        break;
                    }
                }
            }
        });
        *process.reader_task.lock().await = Some(handle);

        Ok(process)
    }

    async fn initialize(&self, process: &Arc<ServerProcess>) -> Result<(), McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "clientInfo": { "name": "kiagent-mcp", "version": env!("CARGO_PKG_VERSION") }
        });
        let result = tokio::time::timeout(Duration::from_secs(20), self.call_on(process, "initialize", params))
            .await
            .map_err(|_| McpError::Initialize("timeout waiting for initialize".into()))??;
        let _ = result;

        let notification = JsonRpcNotificationOut::new("notifications/initialized", json!({}));
        self.send_line(process, &notification).await?;

        let tools_result = self.call_on(process, "tools/list", json!({})).await?;
        let tools = parse_tool_names(&tools_result);
        *process.available_tools.lock().unwrap() = tools;
        process.set_state(McpServerState::Ready);
        Ok(())
    }

    async fn call_on(&self, process: &Arc<ServerProcess>, method: &str, params: Value) -> Result<Value, McpError> {
        let id = process.next_id();
        let (tx, rx) = oneshot::channel();
        process.pending.lock().unwrap().insert(id.clone(), tx);

        let request = JsonRpcRequest::new(id.clone(), method, params);
        if let Err(e) = self.send_line(process, &request).await {
            process.pending.lock().unwrap().remove(&id);
            return Err(e);
        }

        rx.await.unwrap_or(Err(McpError::Cancelled))
    }

    async fn send_line<T: serde::Serialize>(&self, process: &Arc<ServerProcess>, message: &T) -> Result<(), McpError> {
        let text = serde_json::to_string(message).map_err(|e| McpError::MalformedResponse(e.to_string()))?;
        let mut stdin = process.stdin.lock().await;
        stdin.write_all(text.as_bytes()).await.map_err(|e| McpError::Transport(e.to_string()))?;
        stdin.write_all(b"\n").await.map_err(|e| McpError::Transport(e.to_string()))?;
        stdin.flush().await.map_err(|e| McpError::Transport(e.to_string()))
    }
}

fn parse_tool_names(result: &Value) -> HashSet<String> {
    result
        .get("tools")
        .and_then(|t| t.as_array())
        .map(|tools| tools.iter().filter_map(|t| t.get("name").and_then(|n| n.as_str()).map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: calling an unregistered server fails fast without
    /// spawning anything.
    #[tokio::test]
    async fn call_unknown_server_fails() {
        let client = McpClient::new("/tmp", HashMap::new());
        let err = client.call("missing", "tool", json!({}), None).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownServer(_)));
    }

    #[test]
    fn parse_tool_names_extracts_names() {
        let result = json!({ "tools": [{ "name": "write_file" }, { "name": "read_file" }] });
        let names = parse_tool_names(&result);
        assert!(names.contains("write_file"));
        assert!(names.contains("read_file"));
    }
}
