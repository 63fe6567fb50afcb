mod memory_repo;
#[cfg(feature = "postgres")]
mod postgres_repo;
mod repo;

pub use memory_repo::MemoryRepo;
#[cfg(feature = "postgres")]
pub use postgres_repo::{Conn as PostgresRepoConn, Pool as PostgresRepoPool, PostgresRepo};
pub use repo::{CheckpointStore, RepoError, SQLikeMigrations};

use std::sync::Arc;

use crate::config::CheckpointStoreConfig;

/// Builds the checkpoint store selected by configuration
pub async fn connect(config: &CheckpointStoreConfig) -> Result<Arc<dyn CheckpointStore>, RepoError> {
    match config {
        #[cfg(feature = "postgres")]
        CheckpointStoreConfig::Postgres(url) => Ok(Arc::new(PostgresRepo::new(url).await?)),
        #[cfg(not(feature = "postgres"))]
        CheckpointStoreConfig::Postgres(_) => Err(RepoError::NotConnected(
            "chainrelay was built without the postgres feature".to_string(),
        )),
        CheckpointStoreConfig::Memory => Ok(Arc::new(MemoryRepo::new())),
    }
}
