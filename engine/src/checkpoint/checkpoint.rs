//! `Checkpoint<S>`: a persisted snapshot of graph state keyed by session id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current checkpoint schema version, bumped on breaking storage changes.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Why a checkpoint was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSource {
    /// The initial checkpoint created from the user's input.
    Input,
    /// Written after a normal node completion inside the run loop.
    Loop,
    /// Written by an explicit state update (e.g. HITL response applied).
    Update,
    /// Written when branching off an earlier checkpoint (not currently used
    /// by the workflow engine, kept for checkpointer API parity).
    Fork,
}

/// Metadata attached to a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Monotonically increasing step counter within the session.
    pub step: u32,
    pub created_at: DateTime<Utc>,
    /// Parent checkpoint ids (usually a single entry).
    pub parents: Vec<String>,
}

/// A persisted snapshot of state `S`, identified by a monotonic UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub channel_values: S,
    /// Graph position at the time of writing (the node id that just ran).
    pub graph_position: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    pub fn from_state(state: S, graph_position: impl Into<String>, step: u32, source: CheckpointSource, parent: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            ts: now,
            channel_values: state,
            graph_position: graph_position.into(),
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: now,
                parents: parent.into_iter().collect(),
            },
        }
    }
}

/// A checkpoint plus the writes pending against it, as returned by
/// `Checkpointer::get_tuple`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointTuple<S> {
    pub checkpoint: Checkpoint<S>,
    pub parent_checkpoint_id: Option<String>,
}

/// Summary row returned by `Checkpointer::list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointListItem {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub source: CheckpointSource,
    pub step: u32,
}

/// Maps a writes-channel name to its index, preserved for checkpointer
/// backends that version individual channels rather than the whole state.
pub type WritesIdxMap = HashMap<String, usize>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_state_generates_unique_ids() {
        let a = Checkpoint::from_state(1u32, "research", 0, CheckpointSource::Input, None);
        let b = Checkpoint::from_state(2u32, "architect", 1, CheckpointSource::Loop, Some(a.id.clone()));
        assert_ne!(a.id, b.id);
        assert_eq!(b.metadata.parents, vec![a.id]);
    }
}
