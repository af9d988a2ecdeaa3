//! Arc-owning PostgreSQL backend.
//!
//! Wraps the lifetime-based [`TokenRecordStorage`] and owns an `Arc<PgPool>`,
//! so it can be handed to a store as `Arc<dyn TokenBackend>`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;
use tokenkeep::config::PostgresSettings;
use tokenkeep::storage::TokenBackend;
use tokenkeep::{RecordKey, StoreError, StoreResult, TableRef, TokenRecord};
use tracing::info;

use crate::token_record::TokenRecordStorage;
use crate::{PgPool, StorageResult};

/// PostgreSQL token record backend.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: Arc<PgPool>,
}

impl PostgresBackend {
    /// Create a backend from an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connect using the pool settings from the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect(settings: &PostgresSettings) -> StorageResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(&settings.url)
            .await?;

        info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL token store"
        );

        Ok(Self::new(Arc::new(pool)))
    }

    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect_url(database_url: &str) -> StorageResult<Self> {
        let pool = PoolOptions::<Postgres>::new().connect(database_url).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[async_trait]
impl TokenBackend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_schema(&self, table: &TableRef) -> StoreResult<()> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.ensure_schema().await.map_err(StoreError::from)
    }

    async fn insert(&self, table: &TableRef, record: &TokenRecord) -> StoreResult<TokenRecord> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.insert(record).await.map_err(|e| {
            if e.is_conflict() {
                StoreError::duplicate_identity(&record.jti, &record.aud)
            } else {
                StoreError::from(e)
            }
        })
    }

    async fn get(&self, table: &TableRef, key: &RecordKey) -> StoreResult<Option<TokenRecord>> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.find(key).await.map_err(StoreError::from)
    }

    async fn delete(&self, table: &TableRef, key: &RecordKey) -> StoreResult<bool> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.delete(key).await.map_err(StoreError::from)
    }

    async fn delete_expired(&self, table: &TableRef, now: i64) -> StoreResult<u64> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.delete_expired(now).await.map_err(StoreError::from)
    }

    async fn delete_by_subject(&self, table: &TableRef, sub: &str) -> StoreResult<u64> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        storage.delete_by_subject(sub).await.map_err(StoreError::from)
    }

    async fn count(&self, table: &TableRef) -> StoreResult<u64> {
        let storage = TokenRecordStorage::new(&self.pool, table);
        let count = storage.count().await.map_err(StoreError::from)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
