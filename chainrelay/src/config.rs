use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("A contract address is required")]
    NoContractAddress,
    #[error("An RPC URL is required")]
    NoRpcUrl,
    #[error("A chain id is required")]
    NoChainId,
    #[error("At least one event name is required")]
    NoEventNames,
    #[error("A message bus topic is required")]
    NoTopic,
    #[error("{0} must be greater than 0")]
    MustBePositive(&'static str),
    #[error("Backoff factor must be at least 1.0, got {0}")]
    InvalidBackoffFactor(f64),
    #[error("{0} must be a finite, non-negative number of seconds")]
    InvalidDelay(&'static str),
    #[error("Invalid contract address: {0}")]
    InvalidContractAddress(String),
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),
    #[error("Invalid contract ABI: {0}")]
    InvalidAbi(String),
    #[error("Event {0} is not declared in the contract ABI")]
    UnknownEvent(String),
}

/// Where processed-event ledger rows and checkpoints are persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CheckpointStoreConfig {
    Postgres(String),
    Memory,
}

/// Topic coordinates of the downstream message bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageBusConfig {
    pub endpoint: String,
    pub project_id: String,
    pub topic_id: String,
}

impl MessageBusConfig {
    pub fn new(endpoint: &str, project_id: &str, topic_id: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            topic_id: topic_id.to_string(),
        }
    }

    /// Fully qualified topic name, e.g. `projects/relayer/topics/transfers`
    pub fn topic_path(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.topic_id)
    }
}

/// Process-wide relayer configuration. Built once at startup and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayerConfig {
    pub chain_id: String,
    pub rpc_url: String,
    pub contract_address: String,
    /// JSON ABI, or newline separated human-readable event signatures
    pub contract_abi: String,
    pub event_names: Vec<String>,
    pub message_bus: MessageBusConfig,
    pub checkpoint_store: CheckpointStoreConfig,
    pub start_block: u64,
    pub poll_interval_seconds: u64,
    /// Blocks fetched per poll iteration
    pub batch_size: u64,
    pub checkpoint_interval_blocks: u64,
    /// Floor delay before every RPC call. Unit in seconds.
    pub rpc_rate_limit_delay: f64,
    /// First retry delay. Unit in seconds.
    pub rpc_base_delay: f64,
    pub rpc_max_retries: u32,
    pub rpc_backoff_factor: f64,
    /// Cap applied to every retry delay. Unit in seconds.
    pub rpc_max_backoff: f64,
    /// Unit in seconds.
    pub rpc_timeout: f64,
    pub max_concurrent_requests: usize,
    pub cleanup_interval_hours: u64,
    pub processed_event_retention_days: u64,
}

impl RelayerConfig {
    pub fn new(chain_id: &str, rpc_url: &str, contract_address: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            rpc_url: rpc_url.to_string(),
            contract_address: contract_address.to_string(),
            contract_abi: String::new(),
            event_names: vec![],
            message_bus: MessageBusConfig::new("http://localhost:8085", "chainrelay", "events"),
            checkpoint_store: CheckpointStoreConfig::Memory,
            start_block: 0,
            poll_interval_seconds: 12,
            batch_size: 1_000,
            checkpoint_interval_blocks: 100,
            rpc_rate_limit_delay: 0.0,
            rpc_base_delay: 1.0,
            rpc_max_retries: 5,
            rpc_backoff_factor: 2.0,
            rpc_max_backoff: 60.0,
            rpc_timeout: 30.0,
            max_concurrent_requests: 5,
            cleanup_interval_hours: 24,
            processed_event_retention_days: 7,
        }
    }

    pub fn with_contract_abi(mut self, contract_abi: &str) -> Self {
        self.contract_abi = contract_abi.to_string();

        self
    }

    pub fn add_event_name(mut self, event_name: &str) -> Self {
        self.event_names.push(event_name.to_string());

        self
    }

    pub fn with_message_bus(mut self, message_bus: MessageBusConfig) -> Self {
        self.message_bus = message_bus;

        self
    }

    pub fn with_checkpoint_store(mut self, checkpoint_store: CheckpointStoreConfig) -> Self {
        self.checkpoint_store = checkpoint_store;

        self
    }

    pub fn with_start_block(mut self, start_block: u64) -> Self {
        self.start_block = start_block;

        self
    }

    pub fn with_poll_interval_seconds(mut self, poll_interval_seconds: u64) -> Self {
        self.poll_interval_seconds = poll_interval_seconds;

        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;

        self
    }

    pub fn with_checkpoint_interval_blocks(mut self, checkpoint_interval_blocks: u64) -> Self {
        self.checkpoint_interval_blocks = checkpoint_interval_blocks;

        self
    }

    pub fn with_rpc_rate_limit_delay(mut self, rpc_rate_limit_delay: f64) -> Self {
        self.rpc_rate_limit_delay = rpc_rate_limit_delay;

        self
    }

    pub fn with_rpc_base_delay(mut self, rpc_base_delay: f64) -> Self {
        self.rpc_base_delay = rpc_base_delay;

        self
    }

    pub fn with_rpc_max_retries(mut self, rpc_max_retries: u32) -> Self {
        self.rpc_max_retries = rpc_max_retries;

        self
    }

    pub fn with_rpc_backoff_factor(mut self, rpc_backoff_factor: f64) -> Self {
        self.rpc_backoff_factor = rpc_backoff_factor;

        self
    }

    pub fn with_rpc_max_backoff(mut self, rpc_max_backoff: f64) -> Self {
        self.rpc_max_backoff = rpc_max_backoff;

        self
    }

    pub fn with_rpc_timeout(mut self, rpc_timeout: f64) -> Self {
        self.rpc_timeout = rpc_timeout;

        self
    }

    pub fn with_max_concurrent_requests(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests;

        self
    }

    pub fn with_cleanup_interval_hours(mut self, cleanup_interval_hours: u64) -> Self {
        self.cleanup_interval_hours = cleanup_interval_hours;

        self
    }

    pub fn with_processed_event_retention_days(mut self, retention_days: u64) -> Self {
        self.processed_event_retention_days = retention_days;

        self
    }

    pub fn get_poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
    pub fn get_rpc_rate_limit_delay(&self) -> Duration {
        secs_to_duration(self.rpc_rate_limit_delay)
    }
    pub fn get_rpc_base_delay(&self) -> Duration {
        secs_to_duration(self.rpc_base_delay)
    }
    pub fn get_rpc_max_backoff(&self) -> Duration {
        secs_to_duration(self.rpc_max_backoff)
    }
    pub fn get_rpc_timeout(&self) -> Duration {
        secs_to_duration(self.rpc_timeout)
    }
    pub fn get_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours.saturating_mul(60 * 60))
    }
    pub fn get_processed_event_retention(&self) -> chrono::Duration {
        i64::try_from(self.processed_event_retention_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_address.trim().is_empty() {
            return Err(ConfigError::NoContractAddress);
        }
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::NoRpcUrl);
        }
        if self.chain_id.trim().is_empty() {
            return Err(ConfigError::NoChainId);
        }
        if self.event_names.is_empty() {
            return Err(ConfigError::NoEventNames);
        }
        if self.message_bus.topic_id.trim().is_empty() {
            return Err(ConfigError::NoTopic);
        }

        for (name, value) in [
            ("batch_size", self.batch_size),
            ("poll_interval_seconds", self.poll_interval_seconds),
            ("checkpoint_interval_blocks", self.checkpoint_interval_blocks),
            ("max_concurrent_requests", self.max_concurrent_requests as u64),
            ("cleanup_interval_hours", self.cleanup_interval_hours),
        ] {
            if value == 0 {
                return Err(ConfigError::MustBePositive(name));
            }
        }

        if !self.rpc_backoff_factor.is_finite() || self.rpc_backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(self.rpc_backoff_factor));
        }

        for (name, value) in [
            ("rpc_rate_limit_delay", self.rpc_rate_limit_delay),
            ("rpc_base_delay", self.rpc_base_delay),
            ("rpc_max_backoff", self.rpc_max_backoff),
            ("rpc_timeout", self.rpc_timeout),
        ] {
            // Rejects negatives, NaN and anything past `Duration::MAX`
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::InvalidDelay(name));
            }
        }

        // Every RPC call is raced against this timeout
        if self.rpc_timeout == 0.0 {
            return Err(ConfigError::MustBePositive("rpc_timeout"));
        }

        Ok(())
    }
}

fn secs_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}
