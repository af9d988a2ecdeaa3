//! PostgreSQL storage backend for tokenkeep
//!
//! Stores token records in a plain table keyed by (`jti`, `aud`):
//!
//! ```sql
//! CREATE TABLE token_records (
//!     jti         TEXT        NOT NULL,
//!     aud         TEXT        NOT NULL,
//!     typ         TEXT        NOT NULL DEFAULT '',
//!     iss         TEXT        NOT NULL DEFAULT '',
//!     sub         TEXT        NOT NULL DEFAULT '',
//!     exp         BIGINT,
//!     jwt         TEXT        NOT NULL,
//!     claims      JSONB       NOT NULL DEFAULT '{}'::jsonb,
//!     created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (jti, aud)
//! );
//! ```
//!
//! The table name and schema come from the store's
//! [`TableRef`](tokenkeep::TableRef); [`PostgresBackend::ensure_schema`]
//! creates both if needed.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenkeep::{StoreConfig, TokenStore};
//! use tokenkeep_postgres::PostgresBackend;
//!
//! let backend = PostgresBackend::connect_url("postgres://localhost/tokenkeep").await?;
//! let config = StoreConfig::builder()
//!     .backend(Arc::new(backend))
//!     .prefix("auth")
//!     .build()?;
//! let store = TokenStore::new(config);
//! store.ensure_schema().await?;
//! ```

pub mod backend;
pub mod token_record;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;
use tokenkeep::StoreError;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use backend::PostgresBackend;
pub use token_record::TokenRecordStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PostgreSQL storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Record already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => StoreError::Serialization(e),
            other => StoreError::backend(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Tests
// =============================================================================
