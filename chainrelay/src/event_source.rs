//! Fetching contract events from the chain, behind the [`ChainEventSource`] capability.
mod backoff;
mod error;
pub mod provider;
mod rpc_event_source;

pub use backoff::Backoff;
pub use error::EventSourceError;
pub use provider::{Provider, ProviderError};
pub use rpc_event_source::RpcEventSource;

use std::fmt::Debug;

use crate::events::RawEvent;

#[async_trait::async_trait]
pub trait ChainEventSource: Send + Sync + Debug {
    async fn get_current_block_height(&self) -> Result<u64, EventSourceError>;

    /// Decoded events of `contract_address` emitted within `from_block..=to_block`.
    /// Holds no mutable state, so disjoint ranges may be fetched concurrently.
    async fn fetch_logs(
        &self,
        contract_address: &str,
        event_names: &[String],
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawEvent>, EventSourceError>;
}
