//! `RunnableConfig`: identifies a single graph run for checkpointing.

use serde::{Deserialize, Serialize};

/// Configuration carried through a graph run: which thread/checkpoint to
/// read from and resume at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnableConfig {
    /// Stable session identifier; equals `WorkflowState.session_id`.
    pub thread_id: Option<String>,
    /// Specific checkpoint to resume from; `None` means "latest".
    pub checkpoint_id: Option<String>,
    /// Checkpoint namespace (used to separate sub-graphs); empty by default.
    pub checkpoint_ns: String,
    pub user_id: Option<String>,
    /// Node id to resume execution at, for HITL resume (§4.8).
    pub resume_from_node_id: Option<String>,
}

impl RunnableConfig {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self { thread_id: Some(thread_id.into()), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_thread_sets_thread_id_only() {
        let config = RunnableConfig::for_thread("s1");
        assert_eq!(config.thread_id.as_deref(), Some("s1"));
        assert!(config.checkpoint_id.is_none());
    }
}
