//! SQLite-backed `Store` with vector search, via the `sqlite-vec` extension.
//!
//! Dual-table design: `memory_meta` holds id/content/metadata/timestamp,
//! `memory_vec` (a `vec0` virtual table) holds the embedding for KNN search
//! — grounded on the teacher's `SqliteVecStore`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::embedder::Embedder;
use super::store::{MemoryRecord, MetadataFilter, Store, StoreError, StoreStats};

static SQLITE_VEC_INIT: Once = Once::new();

fn vector_to_json(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|f| f.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Single-writer-per-workspace SQLite store with vector search.
pub struct SqliteVecStore {
    db_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    workspace_path: String,
}

impl SqliteVecStore {
    pub fn new(path: impl AsRef<Path>, workspace_path: impl Into<String>, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        SQLITE_VEC_INIT.call_once(|| unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(sqlite_vec::sqlite3_vec_init as *const ())));
        });

        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        let dimension = embedder.dimension();
        let conn = rusqlite::Connection::open(&db_path).map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS memory_meta (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            )
            "#,
            [],
        )
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute(
            &format!("CREATE VIRTUAL TABLE IF NOT EXISTS memory_vec USING vec0(id TEXT PRIMARY KEY, embedding FLOAT[{dimension}])"),
            [],
        )
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db_path, embedder, workspace_path: workspace_path.into() })
    }
}

#[async_trait]
impl Store for SqliteVecStore {
    async fn store(&self, content: &str, metadata: HashMap<String, serde_json::Value>) -> Result<String, StoreError> {
        let embedding = self.embedder.embed(content).await.map_err(|e| StoreError::Embedding(e.to_string()))?;
        if embedding.len() != self.embedder.dimension() {
            return Err(StoreError::DimensionMismatch { expected: self.embedder.dimension(), actual: embedding.len() });
        }

        let id = Uuid::new_v4().to_string();
        let content = content.to_string();
        let metadata_json = serde_json::to_string(&metadata).map_err(|e| StoreError::Storage(e.to_string()))?;
        let created_at_ms = Utc::now().timestamp_millis();
        let db_path = self.db_path.clone();
        let embedding_json = vector_to_json(&embedding);
        let id_for_task = id.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| StoreError::Storage(e.to_string()))?;
            conn.execute(
                "INSERT INTO memory_meta (id, content, metadata, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
                params![id_for_task, content, metadata_json, created_at_ms],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            conn.execute("INSERT INTO memory_vec (id, embedding) VALUES (?1, ?2)", params![id_for_task, embedding_json])
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))??;

        Ok(id)
    }

    async fn search(&self, query: &str, k: usize, filters: &[MetadataFilter]) -> Result<Vec<(MemoryRecord, f32)>, StoreError> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| StoreError::Embedding(e.to_string()))?;
        let embedding_json = vector_to_json(&query_embedding);
        let db_path = self.db_path.clone();
        let workspace_path = self.workspace_path.clone();
        // Over-fetch before post-filtering by metadata, since sqlite-vec's KNN
        // operates before the metadata predicate is known to it.
        let fetch_k = (k * 4).max(k).max(10);

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(String, String, String, i64, f32)>, StoreError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| StoreError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT m.id, m.content, m.metadata, m.created_at_ms, v.distance
                     FROM memory_vec v JOIN memory_meta m ON m.id = v.id
                     WHERE v.embedding MATCH ?1 AND k = ?2
                     ORDER BY v.distance ASC",
                )
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![embedding_json, fetch_k as i64], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, i64>(3)?, row.get::<_, f32>(4)?))
                })
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|e| StoreError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))??;

        let mut results = Vec::new();
        for (id, content, metadata_json, created_at_ms, distance) in rows {
            let metadata: HashMap<String, serde_json::Value> = serde_json::from_str(&metadata_json).map_err(|e| StoreError::Storage(e.to_string()))?;
            if !filters.iter().all(|f| match f {
                MetadataFilter::Equals(key, value) => metadata.get(key) == Some(value),
            }) {
                continue;
            }
            let record = MemoryRecord {
                id,
                workspace_path: workspace_path.clone(),
                content,
                embedding: Vec::new(),
                metadata,
                timestamp: chrono::DateTime::from_timestamp_millis(created_at_ms).unwrap_or_else(Utc::now),
            };
            // vec0 returns L2 distance; convert to a bounded similarity score.
            let score = 1.0 / (1.0 + distance);
            results.push((record, score));
            if results.len() >= k {
                break;
            }
        }
        Ok(results)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let db_path = self.db_path.clone();
        let dimensions = self.embedder.dimension();
        let (count, size_bytes) = tokio::task::spawn_blocking(move || -> Result<(usize, u64), StoreError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| StoreError::Storage(e.to_string()))?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM memory_meta", [], |row| row.get(0)).map_err(|e| StoreError::Storage(e.to_string()))?;
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
            Ok((count as usize, size_bytes))
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))??;
        Ok(StoreStats { count, dimensions, size_bytes })
    }
}
