//! Checkpointing: durable snapshots of `WorkflowState` keyed by session id,
//! enabling resumable execution (§3.1, §4.8).
//!
//! - [`Checkpoint`] / [`CheckpointMetadata`] / [`CheckpointSource`]: the
//!   persisted snapshot shape.
//! - [`Checkpointer`]: the storage trait nodes and the workflow engine
//!   depend on.
//! - [`SqliteSaver`]: the production backend (SQLite, one row per
//!   checkpoint).
//! - [`MemorySaver`]: an in-process backend used by tests.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource, CheckpointTuple, CHECKPOINT_VERSION};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use sqlite_saver::SqliteSaver;
