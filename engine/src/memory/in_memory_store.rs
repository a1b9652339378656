//! In-process `Store` implementation; used in tests and as a store for
//! sessions that opt out of persistence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::embedder::Embedder;
use super::store::{apply_filters, MemoryRecord, MetadataFilter, Store, StoreError, StoreStats};

pub struct InMemoryStore {
    embedder: Arc<dyn Embedder>,
    workspace_path: String,
    records: Mutex<Vec<MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new(workspace_path: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, workspace_path: workspace_path.into(), records: Mutex::new(Vec::new()) }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn store(&self, content: &str, metadata: HashMap<String, serde_json::Value>) -> Result<String, StoreError> {
        let embedding = self.embedder.embed(content).await.map_err(|e| StoreError::Embedding(e.to_string()))?;
        if embedding.len() != self.embedder.dimension() {
            return Err(StoreError::DimensionMismatch { expected: self.embedder.dimension(), actual: embedding.len() });
        }
        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            workspace_path: self.workspace_path.clone(),
            content: content.to_string(),
            embedding,
            metadata,
            timestamp: Utc::now(),
        };
        let id = record.id.clone();
        self.records.lock().unwrap().push(record);
        Ok(id)
    }

    async fn search(&self, query: &str, k: usize, filters: &[MetadataFilter]) -> Result<Vec<(MemoryRecord, f32)>, StoreError> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| StoreError::Embedding(e.to_string()))?;
        let records = self.records.lock().unwrap();
        let mut scored: Vec<(MemoryRecord, f32)> = apply_filters(records.iter(), filters)
            .into_iter()
            .map(|r| (r.clone(), cosine_similarity(&query_embedding, &r.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(StoreStats { count: records.len(), dimensions: self.embedder.dimension(), size_bytes: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as at;
    use crate::memory::embedder::EmbedderError;

    struct FixedEmbedder(Vec<f32>);

    #[at]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(self.0.clone())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    /// **Scenario**: store then search returns a record with identical content
    /// and a near-1.0 score (round-trip property, §8).
    #[tokio::test]
    async fn store_then_search_round_trips() {
        let embedder = Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0]));
        let store = InMemoryStore::new("/tmp/ws", embedder);
        let mut metadata = HashMap::new();
        metadata.insert("agent_name".to_string(), serde_json::json!("research"));
        metadata.insert("timestamp".to_string(), serde_json::json!(Utc::now().to_rfc3339()));
        store.store("hello world", metadata.clone()).await.unwrap();

        let results = store.search("hello world", 1, &[]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.content, "hello world");
        assert!(results[0].1 >= 0.999);
    }

    /// **Scenario**: mismatched embedding dimension is rejected (§4.3 invariant).
    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        struct WrongDimEmbedder;
        #[at]
        impl Embedder for WrongDimEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
                Ok(vec![1.0, 2.0])
            }
            fn dimension(&self) -> usize {
                3
            }
        }
        let store = InMemoryStore::new("/tmp/ws", Arc::new(WrongDimEmbedder));
        let err = store.store("x", HashMap::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
    }
}
