//! Durable progress of the relayer: one [`Checkpoint`] per (chain, contract) and
//! one [`ProcessedEvent`] per forwarded event (the dedup ledger).
mod checkpoint;
mod processed_event;

pub use checkpoint::Checkpoint;
pub use processed_event::ProcessedEvent;
