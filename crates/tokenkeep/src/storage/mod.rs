//! Persistence backend interface for token records.
//!
//! The [`TokenStore`](crate::store::TokenStore) owns the record lifecycle;
//! a [`TokenBackend`] only executes the primitive operations against some
//! storage engine. Every operation receives the [`TableRef`] it applies to,
//! so one backend handle can serve several stores.
//!
//! # Implementations
//!
//! - [`MemoryBackend`] - process-local, for tests and single-process setups
//! - `tokenkeep-postgres` - PostgreSQL storage backend
//!
//! # Atomicity
//!
//! Each method must be a single atomic operation on the storage engine.
//! In particular `insert` must rely on the engine's uniqueness guarantee for
//! the (`jti`, `aud`) key rather than a read-then-write, and `delete_expired`
//! must not load records one by one.

pub mod memory;

use async_trait::async_trait;

use crate::config::TableRef;
use crate::error::StoreResult;
use crate::types::{RecordKey, TokenRecord};

pub use memory::MemoryBackend;

/// Storage engine operations needed by the token store.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Creates the table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self, table: &TableRef) -> StoreResult<()>;

    /// Inserts a new record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateIdentity` if a record with the same key
    /// exists. Existing records are never overwritten.
    async fn insert(&self, table: &TableRef, record: &TokenRecord) -> StoreResult<TokenRecord>;

    /// Fetches a record by key.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage operation fails; an absent record
    /// is `Ok(None)`.
    async fn get(&self, table: &TableRef, key: &RecordKey) -> StoreResult<Option<TokenRecord>>;

    /// Deletes a record by key.
    ///
    /// Returns `true` if a record was removed, `false` if none existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, table: &TableRef, key: &RecordKey) -> StoreResult<bool>;

    /// Deletes every record whose `exp` is strictly less than `now`.
    ///
    /// Records without `exp` are kept. Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_expired(&self, table: &TableRef, now: i64) -> StoreResult<u64>;

    /// Deletes every record issued to `sub`. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_subject(&self, table: &TableRef, sub: &str) -> StoreResult<u64>;

    /// Counts the records in the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn count(&self, table: &TableRef) -> StoreResult<u64>;
}
