//! The Memory Store contract (C3, §4.3): workspace-scoped semantic storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("embedding dimension mismatch: store is {expected}, record is {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding provider error: {0}")]
    Embedding(String),
}

/// A stored record (§3.1 `MemoryRecord`). Embeddings are fixed-dimension,
/// set once at store creation; `store` fails a mismatched dimension rather
/// than silently truncating or padding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub workspace_path: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// A metadata predicate used to post-filter search results.
#[derive(Debug, Clone)]
pub enum MetadataFilter {
    Equals(String, serde_json::Value),
}

impl MetadataFilter {
    fn matches(&self, metadata: &HashMap<String, serde_json::Value>) -> bool {
        match self {
            MetadataFilter::Equals(key, value) => metadata.get(key) == Some(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub count: usize,
    pub dimensions: usize,
    pub size_bytes: u64,
}

/// Workspace-scoped vector+metadata store (§4.3).
#[async_trait]
pub trait Store: Send + Sync {
    /// Embeds `content`, appends to the vector index, persists metadata.
    /// `metadata` MUST include `agent_name` and `timestamp` (§4.3 invariant)
    /// — callers populate these before calling `store`.
    async fn store(&self, content: &str, metadata: HashMap<String, serde_json::Value>) -> Result<String, StoreError>;

    /// Embeds `query`, runs approximate nearest-neighbor, post-filters by
    /// `filters`, returns the top `k` `(record, score)` pairs ordered by
    /// descending score.
    async fn search(&self, query: &str, k: usize, filters: &[MetadataFilter]) -> Result<Vec<(MemoryRecord, f32)>, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

pub(crate) fn apply_filters<'a>(records: impl Iterator<Item = &'a MemoryRecord>, filters: &[MetadataFilter]) -> Vec<&'a MemoryRecord> {
    records.filter(|r| filters.iter().all(|f| f.matches(&r.metadata))).collect()
}
