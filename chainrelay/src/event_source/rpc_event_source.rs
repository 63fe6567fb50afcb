use std::fmt::Debug;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, Filter};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::backoff::Backoff;
use super::error::EventSourceError;
use super::provider::{Provider, ProviderError};
use super::ChainEventSource;
use crate::config::{ConfigError, RelayerConfig};
use crate::contracts::ContractEvents;
use crate::events::RawEvent;

/// [`ChainEventSource`] over a JSON-RPC [`Provider`].
///
/// Every call sleeps `rpc_rate_limit_delay` first, is raced against
/// `rpc_timeout`, and transient failures are retried up to `rpc_max_retries`
/// times with exponential [`Backoff`].
pub struct RpcEventSource<P: Provider> {
    provider: Arc<P>,
    contract_events: ContractEvents,
    rate_limit_delay: Duration,
    timeout: Duration,
    max_retries: u32,
    backoff: Backoff,
}

impl<P: Provider> Debug for RpcEventSource<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEventSource")
            .field("contract_address", &self.contract_events.address)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl<P: Provider> RpcEventSource<P> {
    pub fn new(provider: Arc<P>, config: &RelayerConfig) -> Result<Self, ConfigError> {
        let contract_events = ContractEvents::parse(
            &config.contract_address,
            &config.contract_abi,
            &config.event_names,
        )?;

        Ok(Self {
            provider,
            contract_events,
            rate_limit_delay: config.get_rpc_rate_limit_delay(),
            timeout: config.get_rpc_timeout(),
            max_retries: config.rpc_max_retries,
            backoff: Backoff::from_config(config),
        })
    }

    async fn call_with_retries<T, F, Fut>(
        &self,
        method: &'static str,
        call: F,
    ) -> Result<T, EventSourceError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ProviderError>> + Send,
    {
        let mut attempt = 0;

        loop {
            if !self.rate_limit_delay.is_zero() {
                sleep(self.rate_limit_delay).await;
            }

            let error = match timeout(self.timeout, call()).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(provider_error)) => EventSourceError::from(provider_error),
                Err(_elapsed) => EventSourceError::Timeout(self.timeout),
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= self.max_retries {
                return Err(EventSourceError::RetriesExhausted {
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            let delay = self.backoff.delay_for(attempt);
            warn!(
                method,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "RPC call failed, backing off"
            );

            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait::async_trait]
impl<P: Provider> ChainEventSource for RpcEventSource<P> {
    async fn get_current_block_height(&self) -> Result<u64, EventSourceError> {
        let block_number =
            self.call_with_retries("eth_blockNumber", || self.provider.get_block_number()).await?;

        Ok(block_number.as_u64())
    }

    async fn fetch_logs(
        &self,
        contract_address: &str,
        event_names: &[String],
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawEvent>, EventSourceError> {
        let address = Address::from_str(contract_address.trim())
            .map_err(|_| ConfigError::InvalidContractAddress(contract_address.to_string()))?;

        if address != self.contract_events.address {
            return Err(EventSourceError::UnknownContract(contract_address.to_string()));
        }

        let topics = self.contract_events.get_topics(event_names)?;
        let filter = Filter::new()
            .address(address)
            .topic0(topics)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.call_with_retries("eth_getLogs", || self.provider.get_logs(&filter)).await?;

        debug!(
            contract_address,
            from_block,
            to_block,
            logs_count = logs.len(),
            "Fetched logs"
        );

        // Logs dropped by a reorg are never relayed
        logs.iter()
            .filter(|log| !log.removed.unwrap_or(false))
            .map(|log| RawEvent::from_log(log, &self.contract_events).map_err(EventSourceError::from))
            .collect()
    }
}
