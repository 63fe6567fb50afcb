use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};

use crate::diesels::schema::relayer_checkpoints;

/// Highest block fully processed for a (chain_id, contract_address) pair.
///
/// N/B: The field order has to match ../diesels/schema.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = relayer_checkpoints)]
pub struct Checkpoint {
    pub chain_id: String,
    pub contract_address: String,
    last_processed_block: i64,
    pub last_processed_timestamp: DateTime<Utc>,
    total_events_processed: i64,
    pub event_metadata: serde_json::Value,
}

impl Checkpoint {
    pub fn new(
        chain_id: &str,
        contract_address: &str,
        last_processed_block: u64,
        total_events_processed: u64,
    ) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            contract_address: contract_address.to_lowercase(),
            last_processed_block: last_processed_block as i64,
            last_processed_timestamp: Utc::now(),
            total_events_processed: total_events_processed as i64,
            event_metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_event_metadata(mut self, event_metadata: serde_json::Value) -> Self {
        self.event_metadata = event_metadata;

        self
    }

    pub fn get_last_processed_block(&self) -> u64 {
        self.last_processed_block as u64
    }
    pub fn get_total_events_processed(&self) -> u64 {
        self.total_events_processed as u64
    }

    /// First block the relayer should fetch after resuming from this checkpoint
    pub fn get_next_block(&self) -> u64 {
        self.get_last_processed_block() + 1
    }
}
