//! SQLite-backed checkpointer. Persistent across process restarts.
//!
//! Key: `(thread_id, checkpoint_ns, checkpoint_id)`. Blocking `rusqlite`
//! calls are offloaded to `tokio::task::spawn_blocking` (§5 suspension
//! points), matching the teacher's `SqliteSaver`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::params;
use serde::{de::DeserializeOwned, Serialize};

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource, CheckpointTuple};
use super::checkpointer::{CheckpointError, Checkpointer};
use super::config::RunnableConfig;

fn source_to_str(s: CheckpointSource) -> &'static str {
    match s {
        CheckpointSource::Input => "Input",
        CheckpointSource::Loop => "Loop",
        CheckpointSource::Update => "Update",
        CheckpointSource::Fork => "Fork",
    }
}

fn str_to_source(s: &str) -> CheckpointSource {
    match s {
        "Input" => CheckpointSource::Input,
        "Loop" => CheckpointSource::Loop,
        "Fork" => CheckpointSource::Fork,
        _ => CheckpointSource::Update,
    }
}

/// SQLite-backed checkpointer, used as `Arc<dyn Checkpointer<S>>` in
/// `StateGraph::compile_with_checkpointer`.
pub struct SqliteSaver<S> {
    db_path: PathBuf,
    _marker: std::marker::PhantomData<S>,
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Opens (creating if absent) the checkpoint database and ensures the
    /// schema exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        }
        let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                checkpoint_ns TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL,
                ts TEXT NOT NULL,
                payload TEXT NOT NULL,
                graph_position TEXT NOT NULL,
                metadata_source TEXT NOT NULL,
                metadata_step INTEGER NOT NULL,
                metadata_created_at INTEGER NOT NULL,
                metadata_parents TEXT NOT NULL,
                PRIMARY KEY (thread_id, checkpoint_ns, checkpoint_id)
            )
            "#,
            [],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self { db_path, _marker: std::marker::PhantomData })
    }

    fn thread_id_required(config: &RunnableConfig) -> Result<String, CheckpointError> {
        config.thread_id.as_deref().ok_or(CheckpointError::ThreadIdRequired).map(String::from)
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn put(&self, config: &RunnableConfig, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let payload = serde_json::to_string(&checkpoint.channel_values).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let metadata_parents = serde_json::to_string(&checkpoint.metadata.parents).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let db_path = self.db_path.clone();
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.to_rfc3339();
        let graph_position = checkpoint.graph_position.clone();
        let metadata_source = source_to_str(checkpoint.metadata.source).to_string();
        let metadata_step = checkpoint.metadata.step as i64;
        let metadata_created_at = checkpoint.metadata.created_at.timestamp_millis();

        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.execute(
                r#"
                INSERT OR REPLACE INTO checkpoints
                (thread_id, checkpoint_ns, checkpoint_id, ts, payload, graph_position,
                 metadata_source, metadata_step, metadata_created_at, metadata_parents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![thread_id, checkpoint_ns, id, ts, payload, graph_position, metadata_source, metadata_step, metadata_created_at, metadata_parents],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok::<(), CheckpointError>(())
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn get_tuple(&self, config: &RunnableConfig) -> Result<Option<CheckpointTuple<S>>, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let want_id = config.checkpoint_id.clone();
        let db_path = self.db_path.clone();

        type RowData = (String, String, String, String, String, i64, i64, String);
        let row: Option<RowData> = tokio::task::spawn_blocking(move || -> Result<Option<RowData>, CheckpointError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let sql = if want_id.is_some() {
                "SELECT checkpoint_id, ts, payload, graph_position, metadata_source, metadata_step, metadata_created_at, metadata_parents
                 FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND checkpoint_id = ?3"
            } else {
                "SELECT checkpoint_id, ts, payload, graph_position, metadata_source, metadata_step, metadata_created_at, metadata_parents
                 FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2
                 ORDER BY metadata_created_at DESC LIMIT 1"
            };
            let mut stmt = conn.prepare(sql).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut rows = if let Some(ref cid) = want_id {
                stmt.query(params![thread_id, checkpoint_ns, cid])
            } else {
                stmt.query(params![thread_id, checkpoint_ns])
            }
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let row = match rows.next().map_err(|e| CheckpointError::Storage(e.to_string()))? {
                Some(r) => r,
                None => return Ok(None),
            };
            Ok(Some((
                row.get(0).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(1).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(2).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(3).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(4).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(5).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(6).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(7).map_err(|e| CheckpointError::Storage(e.to_string()))?,
            )))
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))??;

        let (checkpoint_id, ts, payload, graph_position, metadata_source, metadata_step, metadata_created_at, metadata_parents) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let channel_values: S = serde_json::from_str(&payload).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let parents: Vec<String> = serde_json::from_str(&metadata_parents).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let checkpoint = Checkpoint {
            id: checkpoint_id,
            ts: chrono::DateTime::parse_from_rfc3339(&ts).map_err(|e| CheckpointError::Serialization(e.to_string()))?.with_timezone(&chrono::Utc),
            channel_values,
            graph_position,
            metadata: CheckpointMetadata {
                source: str_to_source(&metadata_source),
                step: metadata_step as u32,
                created_at: chrono::DateTime::from_timestamp_millis(metadata_created_at).unwrap_or_else(chrono::Utc::now),
                parents,
            },
        };
        Ok(Some(CheckpointTuple { parent_checkpoint_id: checkpoint.metadata.parents.first().cloned(), checkpoint }))
    }

    async fn list(&self, config: &RunnableConfig) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, metadata_source, metadata_step, metadata_created_at
                     FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2
                     ORDER BY metadata_created_at DESC",
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![thread_id, checkpoint_ns], |row| {
                    let created_at_ms: i64 = row.get(3)?;
                    Ok(CheckpointListItem {
                        id: row.get(0)?,
                        source: str_to_source(&row.get::<_, String>(1)?),
                        step: row.get::<_, i64>(2)? as u32,
                        ts: chrono::DateTime::from_timestamp_millis(created_at_ms).unwrap_or_else(chrono::Utc::now),
                    })
                })
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|e| CheckpointError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    /// **Scenario**: put followed by get_tuple returns the same state.
    #[tokio::test]
    async fn put_then_get_tuple_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let saver: SqliteSaver<WorkflowState> = SqliteSaver::new(dir.path().join("workflow.db")).unwrap();
        let config = RunnableConfig::for_thread("s1");
        let state = WorkflowState::new("s1", "/tmp/ws", "hello");
        let checkpoint = Checkpoint::from_state(state.clone(), "research", 0, CheckpointSource::Loop, None);
        saver.put(&config, checkpoint.clone()).await.unwrap();

        let tuple = saver.get_tuple(&config).await.unwrap().expect("checkpoint present");
        assert_eq!(tuple.checkpoint.channel_values.session_id, state.session_id);
        assert_eq!(tuple.checkpoint.graph_position, "research");
    }

    /// **Scenario**: listing returns newest-first summaries for the thread.
    #[tokio::test]
    async fn list_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let saver: SqliteSaver<WorkflowState> = SqliteSaver::new(dir.path().join("workflow.db")).unwrap();
        let config = RunnableConfig::for_thread("s1");
        let state = WorkflowState::new("s1", "/tmp/ws", "hello");
        for step in 0..3u32 {
            let checkpoint = Checkpoint::from_state(state.clone(), "research", step, CheckpointSource::Loop, None);
            saver.put(&config, checkpoint).await.unwrap();
        }
        let items = saver.list(&config).await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].ts >= items[1].ts);
    }
}
