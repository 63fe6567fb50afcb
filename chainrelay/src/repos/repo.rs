use chrono::{DateTime, Utc};
use derive_more::Display;
use std::fmt::Debug;

use crate::checkpoints::{Checkpoint, ProcessedEvent};

#[derive(Debug, Display, Clone, PartialEq)]
pub enum RepoError {
    #[display("Repo is not connected: {_0}")]
    NotConnected(String),
    #[display("Repo error: {_0}")]
    Unknown(String),
}

impl std::error::Error for RepoError {}

/// Durable progress and dedup ledger of the relayer.
///
/// Every operation is atomic on its own. The relayer is the only writer,
/// so no locking beyond the store's upsert/insert semantics is needed.
#[async_trait::async_trait]
pub trait CheckpointStore: Sync + Send + Debug {
    /// Inserts or overwrites the checkpoint of `(chain_id, contract_address)`
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RepoError>;

    async fn get_checkpoint(
        &self,
        chain_id: &str,
        contract_address: &str,
    ) -> Result<Option<Checkpoint>, RepoError>;

    /// Returns `true` only when this call created the ledger entry.
    /// A second call with the same `event_id` is a no-op returning `false`.
    async fn mark_event_processed(&self, event: &ProcessedEvent) -> Result<bool, RepoError>;

    async fn is_event_processed(&self, event_id: &str) -> Result<bool, RepoError>;

    /// Events of `chain_id` with `from_block <= block_number <= to_block`,
    /// ordered by block number then log index
    async fn get_processed_events(
        &self,
        chain_id: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ProcessedEvent>, RepoError>;

    /// Deletes ledger entries processed strictly before `cutoff`. Checkpoints are untouched.
    async fn cleanup_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError>;
}

pub struct SQLikeMigrations;

impl SQLikeMigrations {
    pub fn create_checkpoints() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS relayer_checkpoints (
                chain_id VARCHAR NOT NULL,
                contract_address VARCHAR NOT NULL,
                last_processed_block BIGINT NOT NULL,
                last_processed_timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                total_events_processed BIGINT NOT NULL DEFAULT 0,
                event_metadata JSON NOT NULL DEFAULT '{}',
                PRIMARY KEY (chain_id, contract_address)
        )"]
    }

    pub fn create_processed_events() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS relayer_processed_events (
                event_id VARCHAR PRIMARY KEY,
                chain_id VARCHAR NOT NULL,
                contract_address VARCHAR NOT NULL,
                block_number BIGINT NOT NULL,
                transaction_hash VARCHAR NOT NULL,
                log_index BIGINT NOT NULL,
                event_name VARCHAR NOT NULL,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                published BOOLEAN NOT NULL DEFAULT TRUE,
                event_metadata JSON NOT NULL DEFAULT '{}'
            )",
            "CREATE INDEX IF NOT EXISTS relayer_processed_events_chain_block_index
            ON relayer_processed_events(chain_id, block_number)",
            "CREATE INDEX IF NOT EXISTS relayer_processed_events_processed_at_index
            ON relayer_processed_events(processed_at)",
        ]
    }

    pub fn get_internal_migrations() -> Vec<&'static str> {
        [Self::create_checkpoints(), Self::create_processed_events()].concat()
    }
}
