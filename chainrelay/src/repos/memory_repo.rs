use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::repo::{CheckpointStore, RepoError};
use crate::checkpoints::{Checkpoint, ProcessedEvent};

type CheckpointKey = (String, String);

/// Process-local store, for development and tests.
/// Progress does not survive a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepo {
    checkpoints: Arc<Mutex<HashMap<CheckpointKey, Checkpoint>>>,
    processed_events: Arc<Mutex<HashMap<String, ProcessedEvent>>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn checkpoint_key(chain_id: &str, contract_address: &str) -> CheckpointKey {
        (chain_id.to_string(), contract_address.to_lowercase())
    }
}

#[async_trait::async_trait]
impl CheckpointStore for MemoryRepo {
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RepoError> {
        let mut checkpoints = self.checkpoints.lock().await;

        checkpoints.insert(
            Self::checkpoint_key(&checkpoint.chain_id, &checkpoint.contract_address),
            checkpoint.clone(),
        );

        Ok(())
    }

    async fn get_checkpoint(
        &self,
        chain_id: &str,
        contract_address: &str,
    ) -> Result<Option<Checkpoint>, RepoError> {
        let checkpoints = self.checkpoints.lock().await;

        Ok(checkpoints.get(&Self::checkpoint_key(chain_id, contract_address)).cloned())
    }

    async fn mark_event_processed(&self, event: &ProcessedEvent) -> Result<bool, RepoError> {
        let mut processed_events = self.processed_events.lock().await;

        match processed_events.entry(event.event_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(event.clone());

                Ok(true)
            }
        }
    }

    async fn is_event_processed(&self, event_id: &str) -> Result<bool, RepoError> {
        Ok(self.processed_events.lock().await.contains_key(event_id))
    }

    async fn get_processed_events(
        &self,
        chain_id: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ProcessedEvent>, RepoError> {
        let processed_events = self.processed_events.lock().await;

        let mut events: Vec<_> = processed_events
            .values()
            .filter(|event| event.chain_id == chain_id)
            .filter(|event| (from_block..=to_block).contains(&event.get_block_number()))
            .cloned()
            .collect();
        events.sort_by_key(|event| (event.get_block_number(), event.get_log_index()));

        Ok(events)
    }

    async fn cleanup_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut processed_events = self.processed_events.lock().await;

        let count_before = processed_events.len();
        processed_events.retain(|_, event| event.processed_at >= cutoff);

        Ok((count_before - processed_events.len()) as u64)
    }
}
