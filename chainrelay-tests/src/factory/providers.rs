use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chainrelay::event_source::{Provider, ProviderError};
use ethers::providers::{HttpClientError, JsonRpcError};
use ethers::types::{Filter, Log, U64};

use super::logs_within;

pub fn empty_provider() -> impl Provider {
    struct EmptyProvider;
    #[async_trait::async_trait]
    impl Provider for EmptyProvider {
        async fn get_block_number(&self) -> Result<U64, ProviderError> {
            Ok(U64::from(0))
        }

        async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, ProviderError> {
            Ok(vec![])
        }
    }

    EmptyProvider
}

pub fn throttled_error() -> ProviderError {
    ProviderError::JsonRpcClientError(Box::new(HttpClientError::JsonRpcError(JsonRpcError {
        code: 429,
        message: "Too Many Requests".to_string(),
        data: None,
    })))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    /// Transient, worth retrying
    Throttled,
    /// Fails the same way on every retry
    Unsupported,
}

impl Failure {
    fn to_provider_error(self) -> ProviderError {
        match self {
            Failure::Throttled => throttled_error(),
            Failure::Unsupported => ProviderError::UnsupportedRPC,
        }
    }
}

/// A node whose height, logs, latency and failures are set by the test.
/// Records every `eth_getLogs` range it serves.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    current_block_number: AtomicU64,
    logs: Mutex<Vec<Log>>,
    latency: Mutex<Duration>,
    failure: Mutex<Option<Failure>>,
    failures_left: AtomicU32,
    get_logs_calls: AtomicU32,
    requested_ranges: Mutex<Vec<(u64, u64)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(current_block_number: u64) -> Self {
        let provider = Self::default();
        provider.set_current_block_number(current_block_number);

        provider
    }

    pub fn with_logs(self, logs: Vec<Log>) -> Self {
        *self.logs.lock().unwrap() = logs;

        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = latency;

        self
    }

    pub fn set_current_block_number(&self, current_block_number: u64) {
        self.current_block_number.store(current_block_number, Ordering::SeqCst);
    }

    pub fn add_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    /// Fails the next `count` calls, whichever method they hit
    pub fn fail_next(&self, count: u32, failure: Failure) {
        *self.failure.lock().unwrap() = Some(failure);
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn get_logs_calls(&self) -> u32 {
        self.get_logs_calls.load(Ordering::SeqCst)
    }

    pub fn get_requested_ranges(&self) -> Vec<(u64, u64)> {
        let mut requested_ranges = self.requested_ranges.lock().unwrap().clone();
        requested_ranges.sort();

        requested_ranges
    }

    pub fn get_max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self) -> Result<(), ProviderError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        match *self.failure.lock().unwrap() {
            Some(failure) if should_fail => Err(failure.to_provider_error()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        self.maybe_fail()?;

        Ok(U64::from(self.current_block_number.load(Ordering::SeqCst)))
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        self.get_logs_calls.fetch_add(1, Ordering::SeqCst);

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        tokio::time::sleep(latency.max(Duration::from_millis(5))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.maybe_fail()?;

        if let (Some(from_block), Some(to_block)) = (filter.get_from_block(), filter.get_to_block())
        {
            self.requested_ranges.lock().unwrap().push((from_block.as_u64(), to_block.as_u64()));
        }

        Ok(logs_within(&self.logs.lock().unwrap(), filter))
    }
}

#[macro_export]
macro_rules! provider_with_logs {
    ($logs:expr) => {{
        use $crate::provider_with_logs;

        provider_with_logs!($logs, 17774490)
    }};
    ($logs:expr, $current_block_number:expr) => {{
        use chainrelay::event_source::{Provider, ProviderError};
        use ethers::types::{Filter, Log, U64};
        use $crate::factory::logs_within;

        struct StubProvider {
            logs: Vec<Log>,
            current_block_number: u64,
        }
        #[async_trait::async_trait]
        impl Provider for StubProvider {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from(self.current_block_number))
            }

            async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                Ok(logs_within(&self.logs, filter))
            }
        }

        StubProvider {
            logs: $logs,
            current_block_number: $current_block_number,
        }
    }};
}

#[macro_export]
macro_rules! provider_with_filter_stubber {
    ($current_block_number:expr, $filter_stubber:expr) => {{
        use chainrelay::event_source::{Provider, ProviderError};
        use ethers::types::{Filter, Log, U64};

        struct StubProvider<F: Fn(&Filter) + Send + Sync> {
            filter_stubber: F,
            current_block_number: u64,
        }
        #[async_trait::async_trait]
        impl<F: Fn(&Filter) + Send + Sync> Provider for StubProvider<F> {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from(self.current_block_number))
            }

            async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                (self.filter_stubber)(filter);

                Ok(vec![])
            }
        }

        StubProvider {
            filter_stubber: $filter_stubber,
            current_block_number: $current_block_number,
        }
    }};
}
