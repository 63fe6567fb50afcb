#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chainrelay::{
        CheckpointStore, CheckpointStoreConfig, ChannelPublisher, ConfigError, MemoryRepo,
        MetricsReader, MetricsSnapshot, Relayer, RelayerConfig, RelayerError, RelayerState,
        RpcEventSource,
    };
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    use crate::factory::{
        bayc_relayer_config, transfer_log, unique_chain_id, Failure, RecordingPublisher,
        ScriptedProvider, BAYC_CONTRACT_ADDRESS,
    };

    const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

    fn relayer(
        config: &RelayerConfig,
        provider: &Arc<ScriptedProvider>,
        store: &Arc<MemoryRepo>,
        publisher: &Arc<RecordingPublisher>,
    ) -> Relayer {
        let event_source = RpcEventSource::new(provider.clone(), config).unwrap();

        Relayer::new(config.clone(), Arc::new(event_source), store.clone(), publisher.clone())
    }

    async fn wait_for(
        metrics_reader: &mut MetricsReader,
        predicate: impl FnMut(&MetricsSnapshot) -> bool,
    ) -> MetricsSnapshot {
        timeout(WAIT_TIMEOUT, metrics_reader.wait_for(predicate))
            .await
            .expect("relayer did not reach the expected state in time")
            .expect("relayer stopped before reaching the expected state")
    }

    #[tokio::test]
    pub async fn relays_events_until_shut_down() {
        crate::init_tracing();
        let chain_id = unique_chain_id();
        let config = bayc_relayer_config(&chain_id, 1000);
        let provider = Arc::new(
            ScriptedProvider::new(1005).with_logs(vec![transfer_log(BAYC_CONTRACT_ADDRESS, 1003)]),
        );
        let store = Arc::new(MemoryRepo::new());
        let (publisher, mut receiver) = ChannelPublisher::new("bayc-transfers", 16);
        let event_source = RpcEventSource::new(provider.clone(), &config).unwrap();
        let relayer = Relayer::new(config, Arc::new(event_source), store.clone(), Arc::new(publisher));

        let handle = relayer.start().await.unwrap();
        let mut metrics_reader = handle.metrics_reader();

        let metrics = wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1005).await;
        assert!(metrics.is_running);
        assert_eq!(metrics.total_events_published, 1);

        let envelope = timeout(WAIT_TIMEOUT, receiver.recv()).await.unwrap().unwrap();
        assert_eq!(envelope.block_number, 1003);
        assert_eq!(envelope.chain_id, chain_id);

        let metrics = handle.shutdown().await.unwrap();
        assert_eq!(metrics.state, RelayerState::Stopped);
        assert!(!metrics.is_running);

        let checkpoint = store.get_checkpoint(&chain_id, BAYC_CONTRACT_ADDRESS).await.unwrap().unwrap();
        assert_eq!(checkpoint.get_last_processed_block(), 1005);
    }

    #[tokio::test]
    pub async fn reports_lag_and_health() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000).with_batch_size(10);
        let provider = Arc::new(ScriptedProvider::new(1200));
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let handle = relayer(&config, &provider, &store, &publisher).start().await.unwrap();
        let status = handle.get_status();

        assert_eq!(status.metrics.current_chain_height, 1200);
        assert!(status.blocks_behind >= 100);

        let mut metrics_reader = handle.metrics_reader();
        // Block 1200 is relayed once the chain moves past it
        wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1199).await;
        assert_eq!(handle.get_status().blocks_behind, 1);
        assert_eq!(handle.get_status().health.to_string(), "healthy");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    pub async fn builds_from_config_without_connecting() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000)
            .with_checkpoint_store(CheckpointStoreConfig::Memory);

        let relayer = Relayer::from_config(config.clone()).await.unwrap();

        assert_eq!(relayer.get_config().chain_id, config.chain_id);
    }

    #[tokio::test]
    pub async fn refuses_to_start_with_invalid_config() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000).with_batch_size(0);

        let from_config_error = Relayer::from_config(config).await.unwrap_err();

        assert!(matches!(
            from_config_error,
            RelayerError::Config(ConfigError::MustBePositive("batch_size"))
        ));
    }

    #[tokio::test]
    pub async fn refuses_to_start_when_rpc_is_unreachable() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000);
        let provider = Arc::new(ScriptedProvider::new(1005));
        provider.fail_next(100, Failure::Throttled);
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let start_error = relayer(&config, &provider, &store, &publisher).start().await.unwrap_err();

        assert!(matches!(start_error, RelayerError::RpcUnreachable(_)));
        assert_eq!(provider.get_logs_calls(), 0);
    }

    #[tokio::test]
    pub async fn stops_promptly_when_shutdown_is_cancelled_externally() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000).with_poll_interval_seconds(3600);
        let provider = Arc::new(ScriptedProvider::new(1005));
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let shutdown = CancellationToken::new();

        let handle = relayer(&config, &provider, &store, &publisher)
            .start_with_shutdown(shutdown.clone())
            .await
            .unwrap();
        let mut metrics_reader = handle.metrics_reader();
        wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1005).await;

        shutdown.cancel();

        let metrics = timeout(Duration::from_secs(2), handle.shutdown()).await.unwrap().unwrap();
        assert_eq!(metrics.state, RelayerState::Stopped);
    }

    #[tokio::test]
    pub async fn finishes_the_in_flight_batch_before_stopping() {
        let chain_id = unique_chain_id();
        let config = bayc_relayer_config(&chain_id, 1000);
        let provider = Arc::new(
            ScriptedProvider::new(1005)
                .with_latency(Duration::from_millis(500))
                .with_logs(vec![transfer_log(BAYC_CONTRACT_ADDRESS, 1003)]),
        );
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let handle = relayer(&config, &provider, &store, &publisher).start().await.unwrap();
        timeout(WAIT_TIMEOUT, async {
            while provider.get_logs_calls() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("relayer never fetched logs");
        assert_eq!(publisher.get_published_count(), 0);

        let metrics = handle.shutdown().await.unwrap();

        assert_eq!(metrics.state, RelayerState::Stopped);
        assert_eq!(metrics.last_processed_block, 1005);
        assert_eq!(publisher.get_published_count(), 1);

        let checkpoint = store.get_checkpoint(&chain_id, BAYC_CONTRACT_ADDRESS).await.unwrap().unwrap();
        assert_eq!(checkpoint.get_last_processed_block(), 1005);
        assert_eq!(checkpoint.event_metadata["to_block"], 1005);
        assert_eq!(checkpoint.event_metadata["events_published"], 1);
    }

    #[tokio::test]
    pub async fn resumes_after_restart_without_republishing() {
        let chain_id = unique_chain_id();
        let config = bayc_relayer_config(&chain_id, 1000);
        let provider = Arc::new(
            ScriptedProvider::new(1005).with_logs(vec![transfer_log(BAYC_CONTRACT_ADDRESS, 1003)]),
        );
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let handle = relayer(&config, &provider, &store, &publisher).start().await.unwrap();
        let mut metrics_reader = handle.metrics_reader();
        wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1005).await;
        handle.shutdown().await.unwrap();

        provider.add_log(transfer_log(BAYC_CONTRACT_ADDRESS, 1008));
        provider.set_current_block_number(1010);

        let handle = relayer(&config, &provider, &store, &publisher).start().await.unwrap();
        let mut metrics_reader = handle.metrics_reader();
        let metrics = wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1010).await;
        handle.shutdown().await.unwrap();

        assert_eq!(metrics.total_events_published, 1);
        let published_blocks: Vec<_> =
            publisher.get_published().iter().map(|envelope| envelope.block_number).collect();
        assert_eq!(published_blocks, vec![1003, 1008]);

        let checkpoint = store.get_checkpoint(&chain_id, BAYC_CONTRACT_ADDRESS).await.unwrap().unwrap();
        assert_eq!(checkpoint.get_total_events_processed(), 2);
    }

    #[tokio::test]
    pub async fn keeps_polling_after_failed_iterations() {
        let config = bayc_relayer_config(&unique_chain_id(), 1000);
        let provider = Arc::new(
            ScriptedProvider::new(1005).with_logs(vec![transfer_log(BAYC_CONTRACT_ADDRESS, 1003)]),
        );
        let store = Arc::new(MemoryRepo::new());
        let publisher = Arc::new(RecordingPublisher::new());
        publisher.fail_at_block(Some(1003));

        let handle = relayer(&config, &provider, &store, &publisher).start().await.unwrap();
        let mut metrics_reader = handle.metrics_reader();

        let metrics = wait_for(&mut metrics_reader, |metrics| metrics.errors_count >= 1).await;
        assert!(metrics.is_running);
        assert!(!handle.is_finished());
        assert_eq!(publisher.get_published_count(), 0);

        publisher.fail_at_block(None);
        wait_for(&mut metrics_reader, |metrics| metrics.last_processed_block == 1005).await;

        handle.shutdown().await.unwrap();
        assert_eq!(publisher.get_published_count(), 1);
    }
}
