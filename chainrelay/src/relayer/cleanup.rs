use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::repos::{CheckpointStore, RepoError};

#[derive(Clone, Debug, PartialEq)]
pub struct CleanupConfig {
    /// How often the processed-event ledger is pruned
    pub cleanup_interval: Duration,
    /// Ledger entries processed earlier than this are pruned
    pub retention: chrono::Duration,
}

impl CleanupConfig {
    pub fn new(cleanup_interval: Duration, retention: chrono::Duration) -> Self {
        Self {
            cleanup_interval,
            retention,
        }
    }
}

/// Deletes ledger entries older than the retention window. Checkpoints are never touched.
pub async fn cleanup_once(
    checkpoint_store: &dyn CheckpointStore,
    retention: chrono::Duration,
) -> Result<u64, RepoError> {
    let cutoff = Utc::now().checked_sub_signed(retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let deleted_count = checkpoint_store.cleanup_old_events(cutoff).await?;

    info!(%cutoff, deleted_count, "Cleaned up processed events");

    Ok(deleted_count)
}

/// Runs [`cleanup_once`] every `cleanup_interval` until `shutdown` is cancelled.
/// The first pass happens one interval after start.
pub async fn run(
    checkpoint_store: Arc<dyn CheckpointStore>,
    config: CleanupConfig,
    shutdown: CancellationToken,
) {
    let Some(first_tick) = Instant::now().checked_add(config.cleanup_interval) else {
        // The interval outlasts the clock, so no pass is ever due
        shutdown.cancelled().await;
        return;
    };
    let mut interval = interval_at(first_tick, config.cleanup_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                if let Err(cleanup_error) = cleanup_once(checkpoint_store.as_ref(), config.retention).await {
                    error!(error = %cleanup_error, "Processed events cleanup failed");
                }
            }
        }
    }
}
