//! Token record domain type.
//!
//! A [`TokenRecord`] is the persisted proof that a token was issued and has
//! not been revoked. Its presence is the only thing verification checks; the
//! embedded `exp` is consulted by the purge operation alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::claims::TokenClaims;
use crate::error::StoreResult;

/// Key of a token record: identity plus audience.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// JWT ID.
    pub jti: String,
    /// Audience.
    pub aud: String,
}

impl RecordKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(jti: impl Into<String>, aud: impl Into<String>) -> Self {
        Self {
            jti: jti.into(),
            aud: aud.into(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (aud '{}')", self.jti, self.aud)
    }
}

/// Token record stored in the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// JWT ID.
    pub jti: String,

    /// Audience.
    pub aud: String,

    /// Token type.
    pub typ: String,

    /// Issuer.
    pub iss: String,

    /// Subject.
    pub sub: String,

    /// Expiration time (Unix timestamp). Records without one are never purged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// The encoded token.
    pub jwt: String,

    /// The full claims set the token was issued with.
    pub claims: Value,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TokenRecord {
    /// Builds a record for a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims fail validation or cannot be serialized.
    pub fn from_claims(claims: &TokenClaims, raw_token: impl Into<String>) -> StoreResult<Self> {
        claims.validate()?;

        let now = OffsetDateTime::now_utc();
        Ok(Self {
            jti: claims.jti.clone(),
            aud: claims.aud.clone(),
            typ: claims.typ.clone(),
            iss: claims.iss.clone(),
            sub: claims.sub.clone(),
            exp: claims.exp,
            jwt: raw_token.into(),
            claims: claims.to_value()?,
            created_at: now,
            updated_at: now,
        })
    }

    /// The key this record is stored under.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.jti, &self.aud)
    }

    /// Returns `true` if the purge operation would remove this record at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }
}
