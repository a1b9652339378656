//! File write/read operations via an MCP filesystem server, constrained to
//! `workspace_path` (§4.5: "All file operations are constrained to
//! workspace_path").

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AgentError;
use crate::mcp::McpClient;
use crate::workspace::resolve_path_under;

/// `{path, bytes_written}` (§4.5 `agent_outputs["codesmith"].generated_files`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub bytes_written: usize,
}

const FILE_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn write_file_via_mcp(
    mcp: &McpClient,
    server: &str,
    workspace_path: &Path,
    relative_path: &str,
    content: &str,
) -> Result<GeneratedFile, AgentError> {
    let resolved = resolve_path_under(workspace_path, relative_path)?;
    mcp.call(server, "write_file", json!({ "path": resolved.to_string_lossy(), "content": content }), Some(FILE_TOOL_TIMEOUT)).await?;
    Ok(GeneratedFile { path: relative_path.to_string(), bytes_written: content.len() })
}

pub async fn read_file_via_mcp(mcp: &McpClient, server: &str, workspace_path: &Path, relative_path: &str) -> Result<String, AgentError> {
    let resolved = resolve_path_under(workspace_path, relative_path)?;
    let result = mcp.call(server, "read_file", json!({ "path": resolved.to_string_lossy() }), Some(FILE_TOOL_TIMEOUT)).await?;
    Ok(result.get("content").and_then(|v| v.as_str()).unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a relative path that escapes the workspace is rejected
    /// before any MCP call is attempted.
    #[tokio::test]
    async fn write_file_rejects_path_escape() {
        let dir = tempfile::tempdir().unwrap();
        let mcp = McpClient::new(dir.path(), std::collections::HashMap::new());
        let err = write_file_via_mcp(&mcp, "filesystem", dir.path(), "../outside.txt", "x").await.unwrap_err();
        assert!(matches!(err, AgentError::PathEscape { .. }));
    }
}
