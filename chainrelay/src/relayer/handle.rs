use tokio_util::sync::CancellationToken;

use super::error::RelayerError;
use super::metrics::{MetricsReader, MetricsSnapshot, RelayerStatus};
use crate::tasks::RelayerTask;

/// Returned by a started relayer. Reads metrics and shuts the relayer down.
#[derive(Debug)]
pub struct RelayerHandle {
    metrics_reader: MetricsReader,
    shutdown: CancellationToken,
    task: RelayerTask,
}

impl RelayerHandle {
    pub(super) fn new(
        metrics_reader: MetricsReader,
        shutdown: CancellationToken,
        task: RelayerTask,
    ) -> Self {
        Self {
            metrics_reader,
            shutdown,
            task,
        }
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics_reader.get_metrics()
    }

    pub fn get_status(&self) -> RelayerStatus {
        self.metrics_reader.get_status()
    }

    pub fn metrics_reader(&self) -> MetricsReader {
        self.metrics_reader.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops new iterations, lets the in-flight one finish, writes the final
    /// checkpoint and joins every spawned task.
    pub async fn shutdown(self) -> Result<MetricsSnapshot, RelayerError> {
        self.shutdown.cancel();
        self.task.join().await?;

        Ok(self.metrics_reader.get_metrics())
    }
}
