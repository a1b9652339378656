//! MCP server registry (§6.2): `{server_name -> {command, args, env?}}`. The
//! MCP client starts these subprocesses on demand, never eagerly.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Loads and validates `path` as a JSON map of server name to [`McpServerSpec`].
pub fn load_mcp_registry(path: &Path) -> Result<HashMap<String, McpServerSpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    let registry: HashMap<String, McpServerSpec> =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;

    for (server_name, spec) in &registry {
        if spec.command.trim().is_empty() {
            return Err(ConfigError::InvalidMcpServer { server_name: server_name.to_string(), message: "command must not be empty".into() });
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a well-formed registry file loads one entry per server name.
    #[test]
    fn load_mcp_registry_parses_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, r#"{"filesystem": {"command": "mcp-server-filesystem", "args": ["--root", "."]}}"#).unwrap();

        let registry = load_mcp_registry(&path).unwrap();
        assert_eq!(registry["filesystem"].command, "mcp-server-filesystem");
        assert_eq!(registry["filesystem"].args, vec!["--root".to_string(), ".".to_string()]);
    }

    /// **Scenario**: an empty command is rejected at load time.
    #[test]
    fn load_mcp_registry_rejects_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, r#"{"bad": {"command": ""}}"#).unwrap();

        let err = load_mcp_registry(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMcpServer { .. }));
    }
}
