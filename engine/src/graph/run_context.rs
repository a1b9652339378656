//! Run-scoped context bundled for graph nodes: the `RunnableConfig` plus a
//! stream writer for progress events.
//!
//! Grounded on the teacher's `Runtime<C, S>`; narrowed to what the workflow
//! engine's nodes actually need (no generic `context`/`store` slots, since
//! C3's `Store` is reached through `Engine` directly rather than injected
//! per node).

use std::fmt::Debug;

use crate::checkpoint::RunnableConfig;

/// A single progress event emitted by a node mid-run (forwarded to the
/// client channel as `agent_event`, §6.1).
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub node_id: String,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Run-scoped context injected into graph nodes alongside state.
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub config: RunnableConfig,
    stream_writer: Option<Box<dyn Fn(StreamEvent) + Send + Sync>>,
    _marker: std::marker::PhantomData<S>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self { config, stream_writer: None, _marker: std::marker::PhantomData }
    }

    pub fn with_stream_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.stream_writer = Some(Box::new(writer));
        self
    }

    /// Emits a progress event; a no-op when no writer is attached (default).
    pub fn emit(&self, node_id: &str, kind: &str, payload: serde_json::Value) {
        if let Some(writer) = &self.stream_writer {
            writer(StreamEvent { node_id: node_id.to_string(), kind: kind.to_string(), payload });
        }
    }
}

impl<S> Debug for RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext").field("config", &self.config).field("stream_writer", &self.stream_writer.is_some()).finish()
    }
}
