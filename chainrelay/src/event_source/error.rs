use std::time::Duration;

use thiserror::Error;

use super::provider::ProviderError;
use crate::config::ConfigError;
use crate::events::RawEventError;

#[derive(Debug, Error)]
pub enum EventSourceError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("RPC call timed out after {0:?}")]
    Timeout(Duration),
    #[error("RPC call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: Box<EventSourceError>,
    },
    #[error("Contract {0} is not relayed by this event source")]
    UnknownContract(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    RawEvent(#[from] RawEventError),
}

impl EventSourceError {
    /// Transport failures, throttling and timeouts are worth retrying.
    /// Misconfiguration and undecodable logs will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            EventSourceError::Provider(provider_error) => matches!(
                provider_error,
                ProviderError::HTTPError(_) | ProviderError::JsonRpcClientError(_)
            ),
            EventSourceError::Timeout(_) | EventSourceError::RetriesExhausted { .. } => true,
            EventSourceError::UnknownContract(_)
            | EventSourceError::Config(_)
            | EventSourceError::RawEvent(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{HttpClientError, JsonRpcError};

    #[test]
    fn classifies_throttling_and_timeouts_as_retryable() {
        let throttled = ProviderError::JsonRpcClientError(Box::new(HttpClientError::JsonRpcError(
            JsonRpcError {
                code: 429,
                message: "Too Many Requests".to_string(),
                data: None,
            },
        )));

        assert!(EventSourceError::from(throttled).is_retryable());
        assert!(EventSourceError::Timeout(Duration::from_secs(30)).is_retryable());
    }

    #[test]
    fn classifies_misconfiguration_as_fatal() {
        assert!(!EventSourceError::from(ConfigError::UnknownEvent("Transfer".to_string()))
            .is_retryable());
        assert!(!EventSourceError::from(ProviderError::UnsupportedRPC).is_retryable());
    }
}
