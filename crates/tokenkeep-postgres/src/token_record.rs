//! Token record storage for PostgreSQL.
//!
//! One row per issued token, keyed by (`jti`, `aud`). The table is addressed
//! through a [`TableRef`], so every statement is rendered per call with the
//! quoted, optionally schema-qualified table name.

use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use tokenkeep::{RecordKey, TableRef, TokenRecord};
use tracing::{debug, instrument};

use crate::{PgPool, StorageError, StorageResult};

/// Columns selected and returned for a full record, in row-tuple order.
const RECORD_COLUMNS: &str = "jti, aud, typ, iss, sub, exp, jwt, claims, created_at, updated_at";

/// Row tuple for `query_as`.
type RecordTuple = (
    String,
    String,
    String,
    String,
    String,
    Option<i64>,
    String,
    Value,
    OffsetDateTime,
    OffsetDateTime,
);

fn record_from_tuple(row: RecordTuple) -> TokenRecord {
    let (jti, aud, typ, iss, sub, exp, jwt, claims, created_at, updated_at) = row;
    TokenRecord {
        jti,
        aud,
        typ,
        iss,
        sub,
        exp,
        jwt,
        claims,
        created_at,
        updated_at,
    }
}

/// Quote a single identifier. Names reaching here already passed the
/// identifier check in `TableRef`, so there is nothing to escape.
fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

/// DDL statements that bring a table (and its schema) into existence.
///
/// Statements are executed one at a time; the extended query protocol does
/// not accept several statements in one prepared query.
pub(crate) fn schema_statements(table: &TableRef) -> Vec<String> {
    let qualified = table.quoted();
    let mut statements = Vec::with_capacity(4);

    if let Some(schema) = table.schema() {
        statements.push(format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(schema)
        ));
    }

    statements.push(format!(
        r#"CREATE TABLE IF NOT EXISTS {qualified} (
    jti         TEXT        NOT NULL,
    aud         TEXT        NOT NULL,
    typ         TEXT        NOT NULL DEFAULT '',
    iss         TEXT        NOT NULL DEFAULT '',
    sub         TEXT        NOT NULL DEFAULT '',
    exp         BIGINT,
    jwt         TEXT        NOT NULL,
    claims      JSONB       NOT NULL DEFAULT '{{}}'::jsonb,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (jti, aud)
)"#
    ));

    // Index names live in the table's schema, so they are never qualified.
    for column in ["exp", "sub"] {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {qualified} ({column})",
            quote_ident(&format!("{}_{column}_idx", table.name())),
        ));
    }

    statements
}

// =============================================================================
// Token Record Storage
// =============================================================================

/// Token record operations against one table.
pub struct TokenRecordStorage<'a> {
    pool: &'a PgPool,
    table: &'a TableRef,
}

impl<'a> TokenRecordStorage<'a> {
    /// Create a new token record storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool, table: &'a TableRef) -> Self {
        Self { pool, table }
    }

    /// Create the schema, table and indexes if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        for statement in schema_statements(self.table) {
            query(&statement).execute(self.pool).await?;
        }
        debug!("Token record table is ready");
        Ok(())
    }

    /// Insert a record and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a record with the same
    /// (`jti`, `aud`) already exists.
    #[instrument(skip_all, fields(table = %self.table, jti = %record.jti, aud = %record.aud))]
    pub async fn insert(&self, record: &TokenRecord) -> StorageResult<TokenRecord> {
        let sql = format!(
            "INSERT INTO {} (jti, aud, typ, iss, sub, exp, jwt, claims, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {RECORD_COLUMNS}",
            self.table.quoted()
        );

        let row: RecordTuple = query_as(&sql)
            .bind(&record.jti)
            .bind(&record.aud)
            .bind(&record.typ)
            .bind(&record.iss)
            .bind(&record.sub)
            .bind(record.exp)
            .bind(&record.jwt)
            .bind(&record.claims)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx_core::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StorageError::conflict(format!(
                        "Token record {} already exists",
                        record.key()
                    ));
                }
                StorageError::from(e)
            })?;

        Ok(record_from_tuple(row))
    }

    /// Find a record by its (`jti`, `aud`) key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn find(&self, key: &RecordKey) -> StorageResult<Option<TokenRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM {} WHERE jti = $1 AND aud = $2",
            self.table.quoted()
        );

        let row: Option<RecordTuple> = query_as(&sql)
            .bind(&key.jti)
            .bind(&key.aud)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(record_from_tuple))
    }

    /// Delete a record by key. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete(&self, key: &RecordKey) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE jti = $1 AND aud = $2",
            self.table.quoted()
        );

        let rows_affected = query(&sql)
            .bind(&key.jti)
            .bind(&key.aud)
            .execute(self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Delete records whose `exp` is strictly before `now`.
    ///
    /// Rows with a NULL `exp` never match.
    ///
    /// # Returns
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete_expired(&self, now: i64) -> StorageResult<u64> {
        let sql = format!("DELETE FROM {} WHERE exp < $1", self.table.quoted());

        let result = query(&sql).bind(now).execute(self.pool).await?;

        Ok(result.rows_affected())
    }

    /// Delete every record issued to `sub`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete_by_subject(&self, sub: &str) -> StorageResult<u64> {
        let sql = format!("DELETE FROM {} WHERE sub = $1", self.table.quoted());

        let result = query(&sql).bind(sub).execute(self.pool).await?;

        Ok(result.rows_affected())
    }

    /// Get the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> StorageResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table.quoted());

        let count: i64 = query_scalar(&sql).fetch_one(self.pool).await?;

        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_default_table() {
        let statements = schema_statements(&TableRef::default());

        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"token_records\" ("));
        assert!(statements[0].contains("PRIMARY KEY (jti, aud)"));
        assert!(statements[0].contains("'{}'::jsonb"));
        assert_eq!(
            statements[1],
            "CREATE INDEX IF NOT EXISTS \"token_records_exp_idx\" ON \"token_records\" (exp)"
        );
        assert_eq!(
            statements[2],
            "CREATE INDEX IF NOT EXISTS \"token_records_sub_idx\" ON \"token_records\" (sub)"
        );
    }

    #[test]
    fn test_table_columns_match_record_fields() {
        let create_table = &schema_statements(&TableRef::default())[0];
        for column in RECORD_COLUMNS.split(", ") {
            assert!(
                create_table.contains(&format!("\n    {column} ")),
                "column {column} missing from table definition"
            );
        }
        assert!(RECORD_COLUMNS.contains("created_at"));
        assert!(!create_table.contains("inserted_at"));
    }

    #[test]
    fn test_schema_statements_with_prefix() {
        let table = TableRef::new("issued_tokens")
            .and_then(|t| t.with_schema("auth"))
            .unwrap();
        let statements = schema_statements(&table);

        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0], "CREATE SCHEMA IF NOT EXISTS \"auth\"");
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS \"auth\".\"issued_tokens\""));
        assert_eq!(
            statements[2],
            "CREATE INDEX IF NOT EXISTS \"issued_tokens_exp_idx\" ON \"auth\".\"issued_tokens\" (exp)"
        );
    }

    #[test]
    fn test_record_from_tuple() {
        let now = OffsetDateTime::now_utc();
        let record = record_from_tuple((
            "abc123".to_string(),
            "web".to_string(),
            "access".to_string(),
            "https://auth.example.com".to_string(),
            "user:1".to_string(),
            None,
            "a.b.c".to_string(),
            serde_json::json!({"jti": "abc123"}),
            now,
            now,
        ));

        assert_eq!(record.key(), RecordKey::new("abc123", "web"));
        assert_eq!(record.exp, None);
        assert_eq!(record.jwt, "a.b.c");
        assert_eq!(record.created_at, now);
    }
}
