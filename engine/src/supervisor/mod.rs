//! Supervisor & Router (C6, §4.7): table-driven routing after every agent.

mod config;
mod router;

pub use config::SupervisorConfig;
pub use router::{resolve_route, SupervisorNode, SUPERVISOR_NODE_ID};
