//! Interrupt mechanism for human-in-the-loop suspension (§4.8 HITL).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AgentError;

/// An interrupt raised by a node (e.g. the Supervisor when `hitl_pending`
/// is set with no response yet). Execution pauses until resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interrupt {
    pub value: serde_json::Value,
    pub id: Option<String>,
}

impl Interrupt {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value, id: None }
    }

    pub fn with_id(value: serde_json::Value, id: String) -> Self {
        Self { value, id: Some(id) }
    }
}

/// Error raised when a graph is interrupted; caught by the workflow engine
/// and turned into a `suspended` run result.
#[derive(Debug, Clone, Error)]
#[error("graph interrupted: {0:?}")]
pub struct GraphInterrupt(pub Interrupt);

impl From<Interrupt> for GraphInterrupt {
    fn from(interrupt: Interrupt) -> Self {
        GraphInterrupt(interrupt)
    }
}

/// Handles an interrupt raised during graph execution.
pub trait InterruptHandler: Send + Sync {
    fn handle_interrupt(&self, interrupt: &Interrupt) -> Result<serde_json::Value, AgentError>;
}

/// Default handler: returns the interrupt value unchanged.
#[derive(Debug, Clone)]
pub struct DefaultInterruptHandler;

impl InterruptHandler for DefaultInterruptHandler {
    fn handle_interrupt(&self, interrupt: &Interrupt) -> Result<serde_json::Value, AgentError> {
        Ok(interrupt.value.clone())
    }
}
