use std::fmt::Debug;

use chrono::{DateTime, Utc};
use diesel::upsert::excluded;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, PoolError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tokio_postgres::NoTls;
use tracing::error;

use super::repo::{CheckpointStore, RepoError, SQLikeMigrations};
use crate::checkpoints::{Checkpoint, ProcessedEvent};
use crate::diesels::schema::{relayer_checkpoints, relayer_processed_events};

pub type Conn<'a> = bb8::PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

const DEFAULT_POOL_SIZE: u32 = 4;

impl From<diesel::result::Error> for RepoError {
    fn from(value: diesel::result::Error) -> Self {
        RepoError::Unknown(value.to_string())
    }
}

impl From<PoolError> for RepoError {
    fn from(value: PoolError) -> Self {
        RepoError::NotConnected(value.to_string())
    }
}

impl From<bb8::RunError<PoolError>> for RepoError {
    fn from(value: bb8::RunError<PoolError>) -> Self {
        RepoError::NotConnected(value.to_string())
    }
}

impl From<tokio_postgres::Error> for RepoError {
    fn from(value: tokio_postgres::Error) -> Self {
        RepoError::Unknown(value.to_string())
    }
}

#[derive(Clone)]
pub struct PostgresRepo {
    url: String,
    pool: Pool,
}

// Keeps credentials embedded in the URL out of logs
impl Debug for PostgresRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRepo").finish_non_exhaustive()
    }
}

impl PostgresRepo {
    /// Connects and runs the internal migrations
    pub async fn new(url: &str) -> Result<Self, RepoError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = bb8::Pool::builder().max_size(DEFAULT_POOL_SIZE).build(manager).await?;

        let repo = Self {
            url: url.to_string(),
            pool,
        };
        repo.migrate(&SQLikeMigrations::get_internal_migrations()).await?;

        Ok(repo)
    }

    pub async fn get_conn(&self) -> Result<Conn<'_>, RepoError> {
        Ok(self.pool.get().await?)
    }

    pub async fn get_raw_query_client(&self) -> Result<tokio_postgres::Client, RepoError> {
        let (client, conn) = tokio_postgres::connect(&self.url, NoTls).await?;

        tokio::spawn(async move {
            if let Err(conn_error) = conn.await {
                error!(error = %conn_error, "postgres raw query connection failed");
            }
        });

        Ok(client)
    }

    pub async fn migrate(&self, migrations: &[&str]) -> Result<(), RepoError> {
        let client = self.get_raw_query_client().await?;

        for migration in migrations {
            client.batch_execute(migration).await?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl CheckpointStore for PostgresRepo {
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), RepoError> {
        use relayer_checkpoints::dsl::{
            event_metadata, last_processed_block, last_processed_timestamp,
            total_events_processed,
        };

        let mut conn = self.get_conn().await?;

        diesel::insert_into(relayer_checkpoints::table)
            .values(checkpoint)
            .on_conflict((relayer_checkpoints::chain_id, relayer_checkpoints::contract_address))
            .do_update()
            .set((
                last_processed_block.eq(excluded(last_processed_block)),
                last_processed_timestamp.eq(excluded(last_processed_timestamp)),
                total_events_processed.eq(excluded(total_events_processed)),
                event_metadata.eq(excluded(event_metadata)),
            ))
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn get_checkpoint(
        &self,
        chain_id: &str,
        contract_address: &str,
    ) -> Result<Option<Checkpoint>, RepoError> {
        let mut conn = self.get_conn().await?;

        let checkpoint = relayer_checkpoints::table
            .filter(relayer_checkpoints::chain_id.eq(chain_id))
            .filter(relayer_checkpoints::contract_address.eq(contract_address.to_lowercase()))
            .first::<Checkpoint>(&mut *conn)
            .await
            .optional()?;

        Ok(checkpoint)
    }

    async fn mark_event_processed(&self, event: &ProcessedEvent) -> Result<bool, RepoError> {
        let mut conn = self.get_conn().await?;

        let inserted_count = diesel::insert_into(relayer_processed_events::table)
            .values(event)
            .on_conflict(relayer_processed_events::event_id)
            .do_nothing()
            .execute(&mut *conn)
            .await?;

        Ok(inserted_count == 1)
    }

    async fn is_event_processed(&self, event_id: &str) -> Result<bool, RepoError> {
        let mut conn = self.get_conn().await?;

        let is_processed = diesel::select(diesel::dsl::exists(
            relayer_processed_events::table.filter(relayer_processed_events::event_id.eq(event_id)),
        ))
        .get_result::<bool>(&mut *conn)
        .await?;

        Ok(is_processed)
    }

    async fn get_processed_events(
        &self,
        chain_id: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ProcessedEvent>, RepoError> {
        if from_block > to_block {
            return Ok(vec![]);
        }

        let mut conn = self.get_conn().await?;

        let events = relayer_processed_events::table
            .filter(relayer_processed_events::chain_id.eq(chain_id))
            .filter(
                relayer_processed_events::block_number.between(from_block as i64, to_block as i64),
            )
            .order((
                relayer_processed_events::block_number.asc(),
                relayer_processed_events::log_index.asc(),
            ))
            .load::<ProcessedEvent>(&mut *conn)
            .await?;

        Ok(events)
    }

    async fn cleanup_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut conn = self.get_conn().await?;

        let deleted_count = diesel::delete(
            relayer_processed_events::table
                .filter(relayer_processed_events::processed_at.lt(cutoff)),
        )
        .execute(&mut *conn)
        .await?;

        Ok(deleted_count as u64)
    }
}
