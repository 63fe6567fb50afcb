mod envelope;
mod raw_event;

pub use envelope::EventEnvelope;
pub use raw_event::{RawEvent, RawEventError};

/// Globally unique identifier of an on-chain event:
/// `{chain_id}:{transaction_hash}:{log_index}`.
pub fn event_id(chain_id: &str, transaction_hash: &str, log_index: u64) -> String {
    format!("{chain_id}:{}:{log_index}", transaction_hash.to_lowercase())
}
