//! `CompiledStateGraph<S>`: the executable graph produced by `StateGraph::compile`.
//!
//! `invoke` runs nodes starting at the first node, following `next_map`
//! (conditional or linear) until a node returns `Next::End` or the chain
//! runs out, checkpointing after every node completion.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::checkpoint::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};
use crate::error::AgentError;

use super::conditional::NextEntry;
use super::interrupt::InterruptHandler;
use super::next::Next;
use super::node::Node;
use super::retry::RetryPolicy;
use super::state_graph::END;

/// A callback invoked after every node completes, used to stream progress
/// events to the client channel (§4.8).
pub type StepObserver<S> = Arc<dyn Fn(&str, &S) + Send + Sync>;

pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    #[allow(dead_code)]
    pub(super) edge_order: Vec<String>,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) retry_policy: RetryPolicy,
    #[allow(dead_code)]
    pub(super) interrupt_handler: Option<Arc<dyn InterruptHandler>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    /// Runs the graph to completion (or until a node returns `Next::End`),
    /// starting at the first node, persisting a checkpoint after each step
    /// when a checkpointer is configured. `cancel_flag`, if given, is polled
    /// before every node dispatch; once set the run stops with
    /// `AgentError::Cancelled` instead of starting another node (§4.8, §5).
    pub async fn invoke(
        &self,
        initial_state: S,
        config: &RunnableConfig,
        on_step: Option<StepObserver<S>>,
        cancel_flag: Option<Arc<AtomicBool>>,
    ) -> Result<S, AgentError> {
        let mut state = initial_state;
        let mut current = config.resume_from_node_id.clone().unwrap_or_else(|| self.first_node_id.clone());
        let mut step: u32 = 0;

        loop {
            if let Some(flag) = &cancel_flag {
                if flag.load(Ordering::SeqCst) {
                    return Err(AgentError::Cancelled);
                }
            }

            let node = self.nodes.get(&current).ok_or_else(|| AgentError::Invariant(format!("node not found at runtime: {current}")))?;

            let (new_state, next) = self.run_node_with_retry(node.as_ref(), state).await?;
            state = new_state;

            if let Some(checkpointer) = &self.checkpointer {
                let checkpoint = Checkpoint::from_state(state.clone(), current.clone(), step, CheckpointSource::Loop, None);
                checkpointer.put(config, checkpoint).await?;
            }
            if let Some(cb) = &on_step {
                cb(&current, &state);
            }
            step += 1;

            let resolved_next = match self.next_map.get(&current) {
                Some(NextEntry::Conditional(router)) => router.resolve_next(&state),
                Some(NextEntry::Unconditional(to)) => match next {
                    Next::Node(id) => id,
                    Next::End => END.to_string(),
                    Next::Continue => to.clone(),
                },
                None => match next {
                    Next::Node(id) => id,
                    _ => END.to_string(),
                },
            };

            if resolved_next == END {
                return Ok(state);
            }
            current = resolved_next;
        }
    }

    async fn run_node_with_retry(&self, node: &dyn Node<S>, state: S) -> Result<(S, Next), AgentError> {
        let mut attempt = 0usize;
        loop {
            match node.run(state.clone()).await {
                Ok(result) => return Ok(result),
                Err(err) if self.retry_policy.should_retry(attempt) && err.retriable() => {
                    let delay = self.retry_policy.delay(attempt);
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
