//! In-memory token backend.
//!
//! Records live in a [`DashMap`] keyed by table and record key. Inserts go
//! through the map's entry API, so two concurrent inserts of the same key
//! are serialized on the shard lock and exactly one of them wins.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::TokenBackend;
use crate::config::TableRef;
use crate::error::{StoreError, StoreResult};
use crate::types::{RecordKey, TokenRecord};

type MemoryKey = (TableRef, RecordKey);

/// Process-local token backend.
///
/// Records do not survive a restart, so this backend is meant for tests and
/// for deployments where a single process both issues and verifies tokens.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: DashMap<MemoryKey, TokenRecord>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_schema(&self, _table: &TableRef) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, table: &TableRef, record: &TokenRecord) -> StoreResult<TokenRecord> {
        match self.records.entry((table.clone(), record.key())) {
            Entry::Occupied(_) => Err(StoreError::duplicate_identity(&record.jti, &record.aud)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record.clone())
            }
        }
    }

    async fn get(&self, table: &TableRef, key: &RecordKey) -> StoreResult<Option<TokenRecord>> {
        Ok(self
            .records
            .get(&(table.clone(), key.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, table: &TableRef, key: &RecordKey) -> StoreResult<bool> {
        Ok(self.records.remove(&(table.clone(), key.clone())).is_some())
    }

    async fn delete_expired(&self, table: &TableRef, now: i64) -> StoreResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|(t, _), record| {
            if t == table && record.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn delete_by_subject(&self, table: &TableRef, sub: &str) -> StoreResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|(t, _), record| {
            if t == table && record.sub == sub {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn count(&self, table: &TableRef) -> StoreResult<u64> {
        Ok(self
            .records
            .iter()
            .filter(|entry| &entry.key().0 == table)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenClaims;

    fn record(jti: &str, aud: &str, exp: i64) -> TokenRecord {
        let claims = TokenClaims::builder()
            .jti(jti)
            .audience(aud)
            .subject("user:1")
            .expires_at(exp)
            .build();
        TokenRecord::from_claims(&claims, "raw").unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let backend = MemoryBackend::new();
        let table = TableRef::default();

        backend.insert(&table, &record("a", "web", 10)).await.unwrap();
        let err = backend
            .insert(&table, &record("a", "web", 20))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_identity());

        // The first record is untouched.
        let stored = backend
            .get(&table, &RecordKey::new("a", "web"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.exp, Some(10));
    }

    #[tokio::test]
    async fn test_tables_are_isolated() {
        let backend = MemoryBackend::new();
        let first = TableRef::default();
        let second = TableRef::new("other").unwrap();

        backend.insert(&first, &record("a", "web", 10)).await.unwrap();
        backend.insert(&second, &record("a", "web", 10)).await.unwrap();

        assert_eq!(backend.delete_expired(&first, 100).await.unwrap(), 1);
        assert_eq!(backend.count(&first).await.unwrap(), 0);
        assert_eq!(backend.count(&second).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let backend = MemoryBackend::new();
        let table = TableRef::default();
        let key = RecordKey::new("a", "web");

        backend.insert(&table, &record("a", "web", 10)).await.unwrap();
        assert!(backend.delete(&table, &key).await.unwrap());
        assert!(!backend.delete(&table, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_subject() {
        let backend = MemoryBackend::new();
        let table = TableRef::default();

        backend.insert(&table, &record("a", "web", 10)).await.unwrap();
        backend.insert(&table, &record("b", "web", 10)).await.unwrap();

        assert_eq!(backend.delete_by_subject(&table, "user:2").await.unwrap(), 0);
        assert_eq!(backend.delete_by_subject(&table, "user:1").await.unwrap(), 2);
        assert_eq!(backend.count(&table).await.unwrap(), 0);
    }
}
