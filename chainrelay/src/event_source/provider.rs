use std::sync::Arc;

use ethers::prelude::Middleware;
use ethers::providers::{Http, Provider as EthersProvider, ProviderError as EthersProviderError};
use ethers::types::{Filter, Log, U64};

use crate::config::ConfigError;

pub type ProviderError = EthersProviderError;

/// The slice of a JSON-RPC client the relayer calls into
#[async_trait::async_trait]
pub trait Provider: Sync + Send {
    async fn get_block_number(&self) -> Result<U64, ProviderError>;
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError>;
}

#[async_trait::async_trait]
impl Provider for EthersProvider<Http> {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        Middleware::get_block_number(&self).await
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        Middleware::get_logs(&self, filter).await
    }
}

pub fn get(json_rpc_url: &str) -> Result<Arc<EthersProvider<Http>>, ConfigError> {
    let provider = EthersProvider::<Http>::try_from(json_rpc_url)
        .map_err(|error| ConfigError::InvalidRpcUrl(format!("{json_rpc_url}: {error}")))?;

    Ok(Arc::new(provider))
}
