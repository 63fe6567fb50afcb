use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chainrelay::{EventEnvelope, EventPublisher, MessageId, PublishError};

/// Records published envelopes, optionally rejecting the next few or those of one block
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<EventEnvelope>>,
    failures_left: AtomicU32,
    failing_block_number: Mutex<Option<u64>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Rejects every envelope of `block_number` until called again with `None`
    pub fn fail_at_block(&self, block_number: Option<u64>) {
        *self.failing_block_number.lock().unwrap() = block_number;
    }

    pub fn get_published(&self) -> Vec<EventEnvelope> {
        self.published.lock().unwrap().clone()
    }

    pub fn get_published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<MessageId, PublishError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
            || *self.failing_block_number.lock().unwrap() == Some(envelope.block_number);

        if should_fail {
            return Err(PublishError::Rejected {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }

        let mut published = self.published.lock().unwrap();
        published.push(envelope.clone());

        Ok(format!("message-{}", published.len()))
    }

    fn get_topic(&self) -> String {
        "projects/chainrelay/topics/bayc-transfers".to_string()
    }
}
