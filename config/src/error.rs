//! Configuration error taxonomy (§7): fatal at startup, surfaced immediately.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(#[from] dotenv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("agent binding {agent_name:?}: {message}")]
    InvalidBinding { agent_name: String, message: String },
    #[error("mcp server {server_name:?}: {message}")]
    InvalidMcpServer { server_name: String, message: String },
}
