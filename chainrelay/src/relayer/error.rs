use thiserror::Error;

use crate::config::ConfigError;
use crate::event_source::EventSourceError;
use crate::publishers::PublishError;
use crate::repos::RepoError;

#[derive(Debug, Error)]
pub enum RelayerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("RPC endpoint is unreachable: {0}")]
    RpcUnreachable(EventSourceError),
    #[error("Checkpoint store error: {0}")]
    Repo(#[from] RepoError),
    #[error("Could not fetch events: {0}")]
    EventSource(#[from] EventSourceError),
    #[error("Could not publish event: {0}")]
    Publish(#[from] PublishError),
    #[error("Relayer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
