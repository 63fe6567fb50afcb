mod cleanup;
mod coordinator;
mod error;
mod handle;
mod metrics;
mod ranges;
mod state;

pub use cleanup::{cleanup_once, CleanupConfig};
pub use coordinator::{Coordinator, IterationOutcome};
pub use error::RelayerError;
pub use handle::RelayerHandle;
pub use metrics::{
    blocks_behind, HealthStatus, MetricsReader, MetricsSnapshot, RelayerMetrics, RelayerStatus,
};
pub use ranges::BlockRange;
pub use state::RelayerState;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayerConfig;
use crate::event_source::{provider, ChainEventSource, RpcEventSource};
use crate::publishers::{EventPublisher, HttpPublisher};
use crate::repos::{self, CheckpointStore};
use crate::tasks::RelayerTask;

/// A relayer for one (chain, contract) pair, composed from its capabilities.
#[derive(Debug, Clone)]
pub struct Relayer {
    config: RelayerConfig,
    event_source: Arc<dyn ChainEventSource>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl Relayer {
    pub fn new(
        config: RelayerConfig,
        event_source: Arc<dyn ChainEventSource>,
        checkpoint_store: Arc<dyn CheckpointStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            event_source,
            checkpoint_store,
            publisher,
        }
    }

    /// Wires the JSON-RPC event source, the configured checkpoint store and the
    /// HTTP publisher. Requests to the message bus share `rpc_timeout`.
    pub async fn from_config(config: RelayerConfig) -> Result<Self, RelayerError> {
        config.validate()?;

        let provider = provider::get(&config.rpc_url)?;
        let event_source = RpcEventSource::new(provider, &config)?;
        let checkpoint_store = repos::connect(&config.checkpoint_store).await?;
        let publisher = HttpPublisher::new(&config.message_bus, config.get_rpc_timeout())?;

        Ok(Self::new(
            config,
            Arc::new(event_source),
            checkpoint_store,
            Arc::new(publisher),
        ))
    }

    pub fn get_config(&self) -> &RelayerConfig {
        &self.config
    }

    pub async fn start(self) -> Result<RelayerHandle, RelayerError> {
        self.start_with_shutdown(CancellationToken::new()).await
    }

    /// Resumes from the checkpoint, then spawns the poll loop and the cleanup task.
    /// Fails without spawning anything when resuming fails.
    /// Cancelling `shutdown` has the same effect as [`RelayerHandle::shutdown`].
    pub async fn start_with_shutdown(
        self,
        shutdown: CancellationToken,
    ) -> Result<RelayerHandle, RelayerError> {
        let (metrics, metrics_reader) = RelayerMetrics::new();
        let cleanup_config = CleanupConfig::new(
            self.config.get_cleanup_interval(),
            self.config.get_processed_event_retention(),
        );

        let mut coordinator = Coordinator::new(
            self.config,
            self.event_source,
            self.checkpoint_store.clone(),
            self.publisher,
            metrics,
        );
        coordinator.resume().await?;

        let mut relayer_task = RelayerTask::new();
        relayer_task.add_subtask(tokio::spawn(coordinator.run(shutdown.clone())));
        relayer_task.add_subtask(tokio::spawn(cleanup::run(
            self.checkpoint_store,
            cleanup_config,
            shutdown.clone(),
        )));

        Ok(RelayerHandle::new(metrics_reader, shutdown, relayer_task))
    }
}
