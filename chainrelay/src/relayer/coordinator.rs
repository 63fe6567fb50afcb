use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use futures_util::{stream, StreamExt, TryStreamExt};
use serde_json::json;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::RelayerError;
use super::metrics::RelayerMetrics;
use super::ranges::BlockRange;
use super::state::RelayerState;
use crate::checkpoints::{Checkpoint, ProcessedEvent};
use crate::config::RelayerConfig;
use crate::event_source::ChainEventSource;
use crate::events::{EventEnvelope, RawEvent};
use crate::publishers::EventPublisher;
use crate::repos::CheckpointStore;

#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// The chain has nothing past the next block yet
    Idle { current_chain_height: u64 },
    Processed {
        range: BlockRange,
        events_published: u64,
        events_skipped: u64,
        /// `range` reached the chain height observed at the start of the iteration
        caught_up: bool,
    },
}

#[derive(Debug, Default)]
struct BatchProgress {
    events_published: u64,
    events_skipped: u64,
    /// Skipped events this coordinator published in an abandoned iteration
    events_recovered: u64,
}

/// Owns the poll loop of a single (chain, contract) pair and is the only
/// writer to its checkpoint.
#[derive(Debug)]
pub struct Coordinator {
    config: RelayerConfig,
    event_source: Arc<dyn ChainEventSource>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    publisher: Arc<dyn EventPublisher>,
    metrics: RelayerMetrics,
    next_block: u64,
    last_checkpointed_block: Option<u64>,
    /// Last checkpoint written since resuming
    last_saved_checkpoint: Option<Checkpoint>,
    total_events_processed: u64,
    /// Published events not yet counted in the metrics
    unrecorded_event_ids: HashSet<String>,
}

impl Coordinator {
    pub fn new(
        config: RelayerConfig,
        event_source: Arc<dyn ChainEventSource>,
        checkpoint_store: Arc<dyn CheckpointStore>,
        publisher: Arc<dyn EventPublisher>,
        metrics: RelayerMetrics,
    ) -> Self {
        let next_block = config.start_block;

        Self {
            config,
            event_source,
            checkpoint_store,
            publisher,
            metrics,
            next_block,
            last_checkpointed_block: None,
            last_saved_checkpoint: None,
            total_events_processed: 0,
            unrecorded_event_ids: HashSet::new(),
        }
    }

    pub fn get_next_block(&self) -> u64 {
        self.next_block
    }

    /// Resumes from the stored checkpoint, or from `start_block` without one.
    /// Any failure here is fatal and leaves the relayer stopped.
    pub async fn resume(&mut self) -> Result<(), RelayerError> {
        self.metrics.set_state(RelayerState::Starting);

        match self.try_resume().await {
            Ok(()) => Ok(()),
            Err(resume_error) => {
                error!(
                    chain_id = %self.config.chain_id,
                    contract_address = %self.config.contract_address,
                    error = %resume_error,
                    "Relayer failed to start"
                );
                self.metrics.set_state(RelayerState::Stopped);

                Err(resume_error)
            }
        }
    }

    async fn try_resume(&mut self) -> Result<(), RelayerError> {
        self.config.validate()?;

        let checkpoint = self
            .checkpoint_store
            .get_checkpoint(&self.config.chain_id, &self.config.contract_address)
            .await?;

        match &checkpoint {
            Some(checkpoint) => {
                self.next_block = checkpoint.get_next_block();
                self.last_checkpointed_block = Some(checkpoint.get_last_processed_block());
                self.total_events_processed = checkpoint.get_total_events_processed();
            }
            None => {
                self.next_block = self.config.start_block;
                self.last_checkpointed_block = None;
                self.total_events_processed = 0;
            }
        }

        let current_chain_height = self
            .event_source
            .get_current_block_height()
            .await
            .map_err(RelayerError::RpcUnreachable)?;

        self.metrics.set_current_chain_height(current_chain_height);
        self.metrics.set_last_processed_block(self.next_block.saturating_sub(1));

        info!(
            chain_id = %self.config.chain_id,
            contract_address = %self.config.contract_address,
            next_block = self.next_block,
            current_chain_height,
            resumed_from_checkpoint = checkpoint.is_some(),
            "Relayer resumed"
        );

        Ok(())
    }

    /// One poll iteration. On error nothing past the last completed block has been
    /// checkpointed and the next iteration starts over from the same block.
    /// Metrics only count events of iterations that complete.
    pub async fn poll_once(&mut self) -> Result<IterationOutcome, RelayerError> {
        let current_chain_height = self.event_source.get_current_block_height().await?;
        self.metrics.set_current_chain_height(current_chain_height);

        let Some(range) =
            BlockRange::next_batch(self.next_block, self.config.batch_size, current_chain_height)
        else {
            debug!(next_block = self.next_block, current_chain_height, "No new blocks");

            return Ok(IterationOutcome::Idle {
                current_chain_height,
            });
        };

        let mut raw_events = self.fetch_events(range).await?;
        raw_events.sort_by_key(|raw_event| (raw_event.block_number, raw_event.log_index));

        let mut progress = BatchProgress::default();
        // A previously abandoned iteration may have checkpointed past `from_block`
        let mut checkpointed_block = range
            .from_block
            .saturating_sub(1)
            .max(self.last_checkpointed_block.unwrap_or(0));

        for raw_event in raw_events.iter() {
            // Every event below this one's block is resolved
            if raw_event.block_number > range.from_block {
                let completed_block = raw_event.block_number - 1;

                if completed_block >= checkpointed_block + self.config.checkpoint_interval_blocks {
                    self.save_checkpoint(
                        completed_block,
                        BlockRange::new(range.from_block, completed_block),
                        current_chain_height,
                        &progress,
                    )
                    .await?;
                    self.metrics.set_last_processed_block(completed_block);
                    checkpointed_block = completed_block;
                }
            }

            self.relay_event(raw_event, &mut progress).await?;
        }

        self.save_checkpoint(range.to_block, range, current_chain_height, &progress).await?;
        self.next_block = range.to_block + 1;

        self.metrics.record_batch(
            range.to_block,
            progress.events_published + progress.events_recovered,
            progress.events_skipped - progress.events_recovered,
        );
        self.unrecorded_event_ids.clear();

        info!(
            chain_id = %self.config.chain_id,
            contract_address = %self.config.contract_address,
            from_block = range.from_block,
            to_block = range.to_block,
            events_published = progress.events_published,
            events_skipped = progress.events_skipped,
            "Relayed batch"
        );

        Ok(IterationOutcome::Processed {
            range,
            events_published: progress.events_published,
            events_skipped: progress.events_skipped,
            caught_up: range.to_block >= current_chain_height,
        })
    }

    /// Polls until `shutdown` is cancelled. An in-flight iteration always runs
    /// to completion, then a final checkpoint is written.
    #[instrument(skip_all, fields(chain_id = %self.config.chain_id, contract_address = %self.config.contract_address))]
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.metrics.set_state(RelayerState::Running);

        while !shutdown.is_cancelled() {
            let should_wait = match self.poll_once().await {
                Ok(IterationOutcome::Idle { .. }) => true,
                Ok(IterationOutcome::Processed { caught_up, .. }) => caught_up,
                Err(iteration_error) => {
                    self.metrics.record_error();
                    error!(
                        from_block = self.next_block,
                        to_block = self.next_block.saturating_add(self.config.batch_size - 1),
                        error = %iteration_error,
                        "Relayer iteration failed, retrying from the same block"
                    );

                    true
                }
            };

            if should_wait {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = sleep(self.config.get_poll_interval()) => {}
                }
            }
        }

        self.stop().await;
    }

    async fn stop(&mut self) {
        self.metrics.set_state(RelayerState::Stopping);

        // Rewrites the last checkpoint as is, keeping the metadata of its batch
        if let Some(mut checkpoint) = self.last_saved_checkpoint.take() {
            checkpoint.last_processed_timestamp = Utc::now();

            if let Err(checkpoint_error) = self.checkpoint_store.save_checkpoint(&checkpoint).await {
                warn!(error = %checkpoint_error, "Final checkpoint failed");
            }
        }

        self.metrics.set_state(RelayerState::Stopped);
        info!(next_block = self.next_block, "Relayer stopped");
    }

    async fn fetch_events(&self, range: BlockRange) -> Result<Vec<RawEvent>, RelayerError> {
        let max_concurrent_requests = self.config.max_concurrent_requests;

        // `buffered` keeps sub-range results in block order
        let raw_events_per_range: Vec<_> = stream::iter(range.split(max_concurrent_requests))
            .map(|sub_range| {
                self.event_source.fetch_logs(
                    &self.config.contract_address,
                    &self.config.event_names,
                    sub_range.from_block,
                    sub_range.to_block,
                )
            })
            .buffered(max_concurrent_requests)
            .try_collect()
            .await?;

        Ok(raw_events_per_range.into_iter().flatten().collect())
    }

    async fn relay_event(
        &mut self,
        raw_event: &RawEvent,
        progress: &mut BatchProgress,
    ) -> Result<(), RelayerError> {
        let chain_id = &self.config.chain_id;
        let event_id = raw_event.get_event_id(chain_id);

        if self.checkpoint_store.is_event_processed(&event_id).await? {
            debug!(event_id, "Skipping already relayed event");
            progress.events_skipped += 1;
            if self.unrecorded_event_ids.contains(&event_id) {
                progress.events_recovered += 1;
            }

            return Ok(());
        }

        let envelope = EventEnvelope::new(chain_id, raw_event);
        let message_id = self.publisher.publish(&envelope).await?;

        let processed_event = ProcessedEvent::from_raw_event(chain_id, raw_event)
            .with_event_metadata(json!({
                "message_id": message_id,
                "topic": self.publisher.get_topic(),
            }));

        if self.checkpoint_store.mark_event_processed(&processed_event).await? {
            self.total_events_processed += 1;
        }

        progress.events_published += 1;
        self.unrecorded_event_ids.insert(event_id);

        Ok(())
    }

    async fn save_checkpoint(
        &mut self,
        last_processed_block: u64,
        range: BlockRange,
        current_chain_height: u64,
        progress: &BatchProgress,
    ) -> Result<(), RelayerError> {
        let checkpoint = Checkpoint::new(
            &self.config.chain_id,
            &self.config.contract_address,
            last_processed_block,
            self.total_events_processed,
        )
        .with_event_metadata(json!({
            "from_block": range.from_block,
            "to_block": range.to_block,
            "events_published": progress.events_published,
            "events_skipped": progress.events_skipped,
            "current_chain_height": current_chain_height,
        }));

        self.checkpoint_store.save_checkpoint(&checkpoint).await?;

        self.last_checkpointed_block = Some(last_processed_block);
        self.last_saved_checkpoint = Some(checkpoint);

        Ok(())
    }
}
