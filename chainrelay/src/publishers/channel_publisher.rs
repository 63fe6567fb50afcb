use tokio::sync::mpsc;
use uuid::Uuid;

use super::{EventPublisher, MessageId, PublishError};
use crate::events::EventEnvelope;

/// Hands envelopes to a consumer on the same runtime through a bounded channel.
/// A full channel applies backpressure to the relayer.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    topic: String,
    sender: mpsc::Sender<EventEnvelope>,
}

impl ChannelPublisher {
    pub fn new(topic: &str, buffer: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (sender, receiver) = mpsc::channel(buffer);

        (
            Self {
                topic: topic.to_string(),
                sender,
            },
            receiver,
        )
    }
}

#[async_trait::async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<MessageId, PublishError> {
        self.sender
            .send(envelope.clone())
            .await
            .map_err(|_| PublishError::ChannelClosed)?;

        Ok(Uuid::new_v4().to_string())
    }

    fn get_topic(&self) -> String {
        self.topic.clone()
    }
}
