//! Graph node trait: one step in a `StateGraph`.
//!
//! Receives state `S`, returns updated `S` and `Next` (continue, jump, or
//! end). Agent nodes (Research/Architect/Codesmith/ReviewFix/Responder) and
//! the Supervisor all implement this trait over `WorkflowState`.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"research"`, `"supervisor"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
