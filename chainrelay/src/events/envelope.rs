use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RawEvent;

/// The message forwarded to the bus. Carries enough provenance for consumers
/// to reconstruct the original event and to dedupe on `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub event_name: String,
    pub chain_id: String,
    pub contract_address: String,
    pub block_number: u64,
    pub block_hash: Option<String>,
    pub transaction_hash: String,
    pub log_index: u64,
    pub args: serde_json::Value,
    pub relayed_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(chain_id: &str, raw_event: &RawEvent) -> Self {
        Self {
            event_id: raw_event.get_event_id(chain_id),
            event_name: raw_event.event_name.clone(),
            chain_id: chain_id.to_string(),
            contract_address: raw_event.contract_address.clone(),
            block_number: raw_event.block_number,
            block_hash: raw_event.block_hash.clone(),
            transaction_hash: raw_event.transaction_hash.clone(),
            log_index: raw_event.log_index,
            args: raw_event.args.clone(),
            relayed_at: Utc::now(),
        }
    }

    /// Bus-level attributes, so subscribers can filter without decoding the payload
    pub fn get_attributes(&self) -> HashMap<String, String> {
        HashMap::from([
            ("event_id".to_string(), self.event_id.clone()),
            ("event_name".to_string(), self.event_name.clone()),
            ("chain_id".to_string(), self.chain_id.clone()),
            ("contract_address".to_string(), self.contract_address.clone()),
            ("block_number".to_string(), self.block_number.to_string()),
        ])
    }
}
