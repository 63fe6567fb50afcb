use ethers::types::Log;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contracts::{ContractEvents, DecodeError};
use crate::hashes::Hashes;

#[derive(Debug, Error)]
pub enum RawEventError {
    #[error("Log is missing {0}, it is likely still pending")]
    MissingField(&'static str),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A contract log fetched from the chain and decoded against the contract ABI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub contract_address: String,
    pub event_name: String,
    pub block_number: u64,
    pub block_hash: Option<String>,
    pub transaction_hash: String,
    pub transaction_index: Option<u64>,
    pub log_index: u64,
    pub args: serde_json::Value,
    pub removed: bool,
}

impl RawEvent {
    pub fn from_log(log: &Log, contract_events: &ContractEvents) -> Result<Self, RawEventError> {
        let decoded_log = contract_events.decode(log)?;

        let block_number = log.block_number.ok_or(RawEventError::MissingField("block_number"))?;
        let transaction_hash =
            log.transaction_hash.ok_or(RawEventError::MissingField("transaction_hash"))?;
        let log_index = log.log_index.ok_or(RawEventError::MissingField("log_index"))?;

        Ok(Self {
            contract_address: Hashes::h160_to_string(&log.address),
            event_name: decoded_log.event_name,
            block_number: block_number.as_u64(),
            block_hash: log.block_hash.as_ref().map(Hashes::h256_to_string),
            transaction_hash: Hashes::h256_to_string(&transaction_hash),
            transaction_index: log.transaction_index.map(|index| index.as_u64()),
            log_index: log_index.low_u64(),
            args: decoded_log.args,
            removed: log.removed.unwrap_or(false),
        })
    }

    pub fn get_event_id(&self, chain_id: &str) -> String {
        super::event_id(chain_id, &self.transaction_hash, self.log_index)
    }
}
