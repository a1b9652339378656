//! `kiagent-engine`: the multi-agent workflow runtime — state graph,
//! checkpointing, memory store, MCP client, LLM provider registry,
//! validators, agent nodes, the Supervisor/Router, and the workflow engine
//! that drives a run end to end.

pub mod agents;
pub mod checkpoint;
pub mod error;
pub mod graph;
pub mod llm;
pub mod mcp;
pub mod memory;
pub mod state;
pub mod supervisor;
pub mod validators;
pub mod workflow;
pub mod workspace;

pub use error::AgentError;
pub use state::WorkflowState;
