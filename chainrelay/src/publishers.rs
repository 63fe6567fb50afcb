//! Forwarding envelopes to the message bus, behind the [`EventPublisher`] capability.
mod channel_publisher;
mod http_publisher;

pub use channel_publisher::ChannelPublisher;
pub use http_publisher::HttpPublisher;

use std::fmt::Debug;

use thiserror::Error;

use crate::events::EventEnvelope;

/// Acknowledgement id returned by the bus for a published message
pub type MessageId = String;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Message bus request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Message bus rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Message bus acknowledged without a message id")]
    MissingMessageId,
    #[error("Could not serialize envelope: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Consumer channel is closed")]
    ChannelClosed,
}

/// Makes exactly one delivery attempt per call.
/// Retrying is left to the caller, which has to keep the dedup ledger in step.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync + Debug {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<MessageId, PublishError>;

    fn get_topic(&self) -> String;
}
