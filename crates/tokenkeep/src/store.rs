//! Token record store.
//!
//! [`TokenStore`] is the only component that writes token records. It turns
//! claims into records, delegates the primitive operations to its
//! [`TokenBackend`], and logs what happened. It never retries; retry policy
//! belongs to the caller.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::{StoreConfig, TableRef};
use crate::error::StoreResult;
use crate::storage::TokenBackend;
use crate::types::{RecordKey, TokenClaims, TokenRecord};

/// Lifecycle operations on token records.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn TokenBackend>,
    table: TableRef,
}

impl TokenStore {
    /// Creates a store from a resolved configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            backend: Arc::clone(config.backend()),
            table: config.table().clone(),
        }
    }

    /// The table this store operates on.
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// The backend handle.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn TokenBackend> {
        &self.backend
    }

    /// Creates the backing table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create the schema.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.backend.ensure_schema(&self.table).await?;
        tracing::info!(table = %self.table, backend = self.backend.name(), "Token table ready");
        Ok(())
    }

    /// Records a newly issued token.
    ///
    /// The full claims set is stored alongside the raw token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidClaims` if `jti` is empty,
    /// `StoreError::DuplicateIdentity` if a record with the same `jti` and
    /// `aud` exists, or a backend error.
    pub async fn create(&self, claims: &TokenClaims, raw_token: &str) -> StoreResult<TokenRecord> {
        let record = TokenRecord::from_claims(claims, raw_token)?;
        let stored = self.backend.insert(&self.table, &record).await?;

        tracing::debug!(
            jti = %stored.jti,
            aud = %stored.aud,
            typ = %stored.typ,
            exp = ?stored.exp,
            "Token record created"
        );
        Ok(stored)
    }

    /// Finds the record matching the `jti` and `aud` of `claims`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails; a missing record is `Ok(None)`.
    pub async fn find_by_claims(&self, claims: &TokenClaims) -> StoreResult<Option<TokenRecord>> {
        self.find(&claims.key()).await
    }

    /// Finds a record by key.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails; a missing record is `Ok(None)`.
    pub async fn find(&self, key: &RecordKey) -> StoreResult<Option<TokenRecord>> {
        let record = self.backend.get(&self.table, key).await?;
        tracing::trace!(jti = %key.jti, aud = %key.aud, found = record.is_some(), "Token record lookup");
        Ok(record)
    }

    /// Deletes a record.
    ///
    /// Deleting a record that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn delete(&self, record: &TokenRecord) -> StoreResult<()> {
        let removed = self.backend.delete(&self.table, &record.key()).await?;
        if removed {
            tracing::debug!(jti = %record.jti, aud = %record.aud, "Token record deleted");
        } else {
            tracing::debug!(jti = %record.jti, aud = %record.aud, "Token record already absent");
        }
        Ok(())
    }

    /// Deletes every record whose `exp` is before `now` (Unix timestamp).
    ///
    /// Runs as one bulk backend operation. Intended for a periodic job, not
    /// the request path. Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn purge_expired(&self, now: i64) -> StoreResult<u64> {
        let purged = self.backend.delete_expired(&self.table, now).await?;
        tracing::info!(table = %self.table, now, purged, "Purged expired token records");
        Ok(purged)
    }

    /// [`purge_expired`](Self::purge_expired) at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn purge_expired_now(&self) -> StoreResult<u64> {
        self.purge_expired(OffsetDateTime::now_utc().unix_timestamp())
            .await
    }

    /// Deletes every record issued to `sub`, revoking all of the subject's
    /// tokens at once. Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn revoke_all(&self, sub: &str) -> StoreResult<u64> {
        let revoked = self.backend.delete_by_subject(&self.table, sub).await?;
        tracing::info!(sub, revoked, "Revoked all token records for subject");
        Ok(revoked)
    }

    /// Number of records currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn count(&self) -> StoreResult<u64> {
        self.backend.count(&self.table).await
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("backend", &self.backend.name())
            .field("table", &self.table)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn store() -> TokenStore {
        let config = StoreConfig::builder()
            .backend(Arc::new(MemoryBackend::new()))
            .build()
            .unwrap();
        TokenStore::new(config)
    }

    fn claims(jti: &str, aud: &str, exp: i64) -> TokenClaims {
        TokenClaims::builder()
            .jti(jti)
            .audience(aud)
            .token_type("access")
            .issuer("https://auth.example.com")
            .subject("user:42")
            .expires_at(exp)
            .claim("iat", 1_700_000_000)
            .build()
    }

    #[tokio::test]
    async fn test_create_then_find_round_trips() {
        let store = store();
        let claims = claims("abc123", "web", 9_999_999_999);

        let created = store.create(&claims, "encoded.jwt.value").await.unwrap();
        let found = store.find_by_claims(&claims).await.unwrap().unwrap();

        assert_eq!(found, created);
        assert_eq!(found.jti, claims.jti);
        assert_eq!(found.aud, claims.aud);
        assert_eq!(found.typ, claims.typ);
        assert_eq!(found.iss, claims.iss);
        assert_eq!(found.sub, claims.sub);
        assert_eq!(found.exp, claims.exp);
        assert_eq!(found.jwt, "encoded.jwt.value");
        assert_eq!(found.claims, claims.to_value().unwrap());
        assert_eq!(found.claims["iat"], json!(1_700_000_000));
    }

    #[tokio::test]
    async fn test_create_duplicate_identity_fails() {
        let store = store();
        let claims = claims("abc123", "web", 100);

        assert_ok!(store.create(&claims, "first").await);
        let err = assert_err!(store.create(&claims, "second").await);
        assert!(err.is_duplicate_identity());

        let kept = store.find_by_claims(&claims).await.unwrap().unwrap();
        assert_eq!(kept.jwt, "first");
    }

    #[tokio::test]
    async fn test_same_jti_different_audience_is_allowed() {
        let store = store();
        assert_ok!(store.create(&claims("abc123", "web", 100), "w").await);
        assert_ok!(store.create(&claims("abc123", "mobile", 100), "m").await);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_non_matching_returns_none() {
        let store = store();
        store
            .create(&claims("abc123", "web", 100), "t")
            .await
            .unwrap();

        assert!(
            store
                .find_by_claims(&claims("abc123", "mobile", 100))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_by_claims(&claims("other", "web", 100))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store();
        let record = store
            .create(&claims("abc123", "web", 100), "t")
            .await
            .unwrap();

        assert_ok!(store.delete(&record).await);
        assert_ok!(store.delete(&record).await);
        assert!(store.find(&record.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_is_strict_and_repeatable() {
        let store = store();
        store.create(&claims("old", "web", 99), "t").await.unwrap();
        store.create(&claims("edge", "web", 100), "t").await.unwrap();
        store.create(&claims("new", "web", 101), "t").await.unwrap();

        assert_eq!(store.purge_expired(100).await.unwrap(), 1);
        assert!(
            store
                .find(&RecordKey::new("old", "web"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find(&RecordKey::new("edge", "web"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find(&RecordKey::new("new", "web"))
                .await
                .unwrap()
                .is_some()
        );

        assert_eq!(store.purge_expired(100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_records_without_exp() {
        let store = store();
        let claims = TokenClaims::builder().jti("forever").audience("web").build();
        store.create(&claims, "t").await.unwrap();

        assert_eq!(store.purge_expired(i64::MAX).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired_now_leaves_future_tokens() {
        let store = store();
        store.create(&claims("past", "web", 1), "t").await.unwrap();
        store
            .create(&claims("future", "web", 9_999_999_999), "t")
            .await
            .unwrap();

        assert_eq!(store.purge_expired_now().await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_all_for_subject() {
        let store = store();
        store.create(&claims("a", "web", 100), "t").await.unwrap();
        store.create(&claims("b", "mobile", 100), "t").await.unwrap();
        let other = TokenClaims::builder()
            .jti("c")
            .audience("web")
            .subject("user:7")
            .build();
        store.create(&other, "t").await.unwrap();

        assert_eq!(store.revoke_all("user:42").await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_claims(&other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stores_with_different_tables_share_a_backend() {
        let backend: Arc<dyn TokenBackend> = Arc::new(MemoryBackend::new());
        let web = TokenStore::new(
            StoreConfig::builder()
                .backend(Arc::clone(&backend))
                .build()
                .unwrap(),
        );
        let admin = TokenStore::new(
            StoreConfig::builder()
                .backend(backend)
                .table("admin_tokens")
                .build()
                .unwrap(),
        );

        let claims = claims("abc123", "web", 100);
        web.create(&claims, "t").await.unwrap();
        assert!(admin.find_by_claims(&claims).await.unwrap().is_none());
        assert_ok!(admin.create(&claims, "t").await);
    }
}
