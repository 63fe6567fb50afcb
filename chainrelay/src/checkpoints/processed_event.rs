use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};

use crate::diesels::schema::relayer_processed_events;
use crate::events::RawEvent;

/// Dedup ledger entry recording that an event was forwarded to the bus.
///
/// N/B: The field order has to match ../diesels/schema.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = relayer_processed_events)]
pub struct ProcessedEvent {
    pub event_id: String,
    pub chain_id: String,
    pub contract_address: String,
    block_number: i64,
    pub transaction_hash: String,
    log_index: i64,
    pub event_name: String,
    pub processed_at: DateTime<Utc>,
    pub published: bool,
    pub event_metadata: serde_json::Value,
}

impl ProcessedEvent {
    pub fn new(
        chain_id: &str,
        contract_address: &str,
        block_number: u64,
        transaction_hash: &str,
        log_index: u64,
        event_name: &str,
    ) -> Self {
        Self {
            event_id: crate::events::event_id(chain_id, transaction_hash, log_index),
            chain_id: chain_id.to_string(),
            contract_address: contract_address.to_lowercase(),
            block_number: block_number as i64,
            transaction_hash: transaction_hash.to_lowercase(),
            log_index: log_index as i64,
            event_name: event_name.to_string(),
            processed_at: Utc::now(),
            published: true,
            event_metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn from_raw_event(chain_id: &str, raw_event: &RawEvent) -> Self {
        Self::new(
            chain_id,
            &raw_event.contract_address,
            raw_event.block_number,
            &raw_event.transaction_hash,
            raw_event.log_index,
            &raw_event.event_name,
        )
    }

    pub fn with_processed_at(mut self, processed_at: DateTime<Utc>) -> Self {
        self.processed_at = processed_at;

        self
    }

    pub fn with_event_metadata(mut self, event_metadata: serde_json::Value) -> Self {
        self.event_metadata = event_metadata;

        self
    }

    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
    pub fn get_log_index(&self) -> u64 {
        self.log_index as u64
    }
}
