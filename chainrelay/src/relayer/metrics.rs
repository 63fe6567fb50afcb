use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::state::RelayerState;

const CRITICAL_BLOCKS_BEHIND: u64 = 100;
const HEALTHY_BLOCKS_BEHIND: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub state: RelayerState,
    pub is_running: bool,
    /// Events resolved by the relayer, published or skipped as already relayed
    pub total_events_processed: u64,
    pub total_events_published: u64,
    pub errors_count: u64,
    pub last_processed_block: u64,
    pub current_chain_height: u64,
    pub start_time: DateTime<Utc>,
    /// Filled in when the snapshot is read
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            state: RelayerState::Stopped,
            is_running: false,
            total_events_processed: 0,
            total_events_published: 0,
            errors_count: 0,
            last_processed_block: 0,
            current_chain_height: 0,
            start_time,
            uptime_seconds: 0,
        }
    }

    fn read_at(mut self, now: DateTime<Utc>) -> Self {
        self.uptime_seconds = self.get_uptime_seconds(now);

        self
    }

    pub fn get_blocks_behind(&self) -> u64 {
        blocks_behind(self.current_chain_height, self.last_processed_block)
    }

    pub fn get_uptime_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.start_time).num_seconds().max(0) as u64
    }
}

pub fn blocks_behind(current_chain_height: u64, last_processed_block: u64) -> u64 {
    current_chain_height.saturating_sub(last_processed_block)
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[display("healthy")]
    Healthy,
    #[display("warning")]
    Warning,
    #[display("critical")]
    Critical,
}

impl HealthStatus {
    pub fn from_blocks_behind(blocks_behind: u64) -> Self {
        if blocks_behind > CRITICAL_BLOCKS_BEHIND {
            HealthStatus::Critical
        } else if blocks_behind < HEALTHY_BLOCKS_BEHIND {
            HealthStatus::Healthy
        } else {
            HealthStatus::Warning
        }
    }
}

/// What a health endpoint reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayerStatus {
    pub metrics: MetricsSnapshot,
    pub blocks_behind: u64,
    pub health: HealthStatus,
    pub uptime_seconds: u64,
}

impl RelayerStatus {
    pub fn new(metrics: MetricsSnapshot, now: DateTime<Utc>) -> Self {
        let blocks_behind = metrics.get_blocks_behind();

        Self {
            blocks_behind,
            health: HealthStatus::from_blocks_behind(blocks_behind),
            uptime_seconds: metrics.get_uptime_seconds(now),
            metrics,
        }
    }
}

/// Write side of the metrics, owned by the coordinator alone
#[derive(Debug)]
pub struct RelayerMetrics {
    sender: watch::Sender<MetricsSnapshot>,
}

impl RelayerMetrics {
    pub fn new() -> (Self, MetricsReader) {
        let (sender, receiver) = watch::channel(MetricsSnapshot::new(Utc::now()));

        (Self { sender }, MetricsReader { receiver })
    }

    pub fn set_state(&self, state: RelayerState) {
        self.sender.send_modify(|metrics| {
            metrics.state = state;
            metrics.is_running = state.is_running();
        });
    }

    pub fn set_current_chain_height(&self, current_chain_height: u64) {
        self.sender.send_modify(|metrics| metrics.current_chain_height = current_chain_height);
    }

    pub fn set_last_processed_block(&self, last_processed_block: u64) {
        self.sender.send_modify(|metrics| metrics.last_processed_block = last_processed_block);
    }

    /// Counts the events of a completed batch along with the block it checkpointed,
    /// so readers never see one without the other
    pub fn record_batch(
        &self,
        last_processed_block: u64,
        events_published: u64,
        events_skipped: u64,
    ) {
        self.sender.send_modify(|metrics| {
            metrics.last_processed_block = last_processed_block;
            metrics.total_events_processed += events_published + events_skipped;
            metrics.total_events_published += events_published;
        });
    }

    pub fn record_error(&self) {
        self.sender.send_modify(|metrics| metrics.errors_count += 1);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        self.sender.borrow().clone()
    }
}

/// Read side of the metrics. Cheap to clone and hand to an HTTP layer.
#[derive(Debug, Clone)]
pub struct MetricsReader {
    receiver: watch::Receiver<MetricsSnapshot>,
}

impl MetricsReader {
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.receiver.borrow().clone().read_at(Utc::now())
    }

    pub fn get_status(&self) -> RelayerStatus {
        RelayerStatus::new(self.get_metrics(), Utc::now())
    }

    /// Resolves with the first snapshot satisfying `predicate`, or `None` once the
    /// relayer is gone without ever satisfying it
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&MetricsSnapshot) -> bool,
    ) -> Option<MetricsSnapshot> {
        let metrics = self.receiver.wait_for(predicate).await.ok()?.clone();

        Some(metrics.read_at(Utc::now()))
    }
}
