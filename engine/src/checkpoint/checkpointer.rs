//! `Checkpointer<S>`: durable checkpoint storage, keyed by thread id.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointTuple};
use super::config::RunnableConfig;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread_id is required")]
    ThreadIdRequired,
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("checkpoint not found for thread {0}")]
    NotFound(String),
}

/// Durable checkpoint storage for a graph run, keyed by `RunnableConfig::thread_id`.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Persists `checkpoint` for the thread named in `config`.
    async fn put(&self, config: &RunnableConfig, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError>;

    /// Fetches the latest (or a specific, if `config.checkpoint_id` is set)
    /// checkpoint for the thread.
    async fn get_tuple(&self, config: &RunnableConfig) -> Result<Option<CheckpointTuple<S>>, CheckpointError>;

    /// Lists checkpoint summaries for a thread, newest first.
    async fn list(&self, config: &RunnableConfig) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_error_display() {
        assert_eq!(CheckpointError::ThreadIdRequired.to_string(), "thread_id is required");
        assert!(CheckpointError::NotFound("s1".into()).to_string().contains("s1"));
    }
}
