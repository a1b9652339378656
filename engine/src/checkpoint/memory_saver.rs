//! In-memory checkpointer; used in tests and for the no-persistence case.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointTuple};
use super::checkpointer::{CheckpointError, Checkpointer};
use super::config::RunnableConfig;

#[derive(Default)]
pub struct MemorySaver<S> {
    by_thread: Mutex<HashMap<String, Vec<Checkpoint<S>>>>,
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self { by_thread: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn put(&self, config: &RunnableConfig, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError> {
        let thread_id = config.thread_id.clone().ok_or(CheckpointError::ThreadIdRequired)?;
        let mut guard = self.by_thread.lock().unwrap();
        guard.entry(thread_id).or_default().push(checkpoint);
        Ok(())
    }

    async fn get_tuple(&self, config: &RunnableConfig) -> Result<Option<CheckpointTuple<S>>, CheckpointError> {
        let thread_id = config.thread_id.clone().ok_or(CheckpointError::ThreadIdRequired)?;
        let guard = self.by_thread.lock().unwrap();
        let entries = match guard.get(&thread_id) {
            Some(e) => e,
            None => return Ok(None),
        };
        let checkpoint = if let Some(id) = &config.checkpoint_id {
            entries.iter().find(|c| &c.id == id).cloned()
        } else {
            entries.last().cloned()
        };
        Ok(checkpoint.map(|checkpoint| {
            let parent_checkpoint_id = checkpoint.metadata.parents.first().cloned();
            CheckpointTuple { checkpoint, parent_checkpoint_id }
        }))
    }

    async fn list(&self, config: &RunnableConfig) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = config.thread_id.clone().ok_or(CheckpointError::ThreadIdRequired)?;
        let guard = self.by_thread.lock().unwrap();
        let mut items: Vec<CheckpointListItem> = guard
            .get(&thread_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|c| CheckpointListItem { id: c.id.clone(), ts: c.ts, source: c.metadata.source, step: c.metadata.step })
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| b.ts.cmp(&a.ts));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::checkpoint::CheckpointSource;

    #[tokio::test]
    async fn put_then_get_tuple_round_trips() {
        let saver: MemorySaver<u32> = MemorySaver::new();
        let config = RunnableConfig::for_thread("s1");
        let checkpoint = Checkpoint::from_state(7u32, "research", 0, CheckpointSource::Loop, None);
        saver.put(&config, checkpoint).await.unwrap();
        let tuple = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(tuple.checkpoint.channel_values, 7);
    }
}
