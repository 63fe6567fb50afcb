use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EventPublisher, MessageId, PublishError};
use crate::config::MessageBusConfig;
use crate::events::EventEnvelope;

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    messages: Vec<OutgoingMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    data: &'a EventEnvelope,
    attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<MessageId>,
}

/// Publishes each envelope with a single `POST {endpoint}/v1/{topic_path}:publish`.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    message_bus: MessageBusConfig,
}

impl HttpPublisher {
    pub fn new(message_bus: &MessageBusConfig, request_timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            message_bus: message_bus.clone(),
        })
    }

    pub fn get_publish_url(&self) -> String {
        format!(
            "{}/v1/{}:publish",
            self.message_bus.endpoint,
            self.message_bus.topic_path()
        )
    }
}

#[async_trait::async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<MessageId, PublishError> {
        let request = PublishRequest {
            messages: vec![OutgoingMessage {
                data: envelope,
                attributes: envelope.get_attributes(),
            }],
        };

        let response = self.client.post(self.get_publish_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let PublishResponse { message_ids } = response.json().await?;
        let message_id = message_ids.into_iter().next().ok_or(PublishError::MissingMessageId)?;

        debug!(event_id = %envelope.event_id, message_id = %message_id, "Published event");

        Ok(message_id)
    }

    fn get_topic(&self) -> String {
        self.message_bus.topic_path()
    }
}
