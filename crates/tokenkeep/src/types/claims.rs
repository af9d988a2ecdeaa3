//! Typed token claims.
//!
//! The signing layer hands us a loosely typed claims mapping. It is parsed
//! into [`TokenClaims`] at the boundary so that the store only ever sees a
//! mapping with a usable `jti`. Claims this crate does not interpret (`iat`,
//! `nbf`, custom claims) are kept in [`TokenClaims::extra`] and survive the
//! round trip into the stored record unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::RecordKey;
use crate::error::{StoreError, StoreResult};

/// Claims of an issued token, as far as record keeping is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// JWT ID. Required; identifies the token record.
    pub jti: String,

    /// Audience. Together with `jti` forms the record key.
    #[serde(default)]
    pub aud: String,

    /// Token type (e.g. "access", "refresh").
    #[serde(default)]
    pub typ: String,

    /// Issuer.
    #[serde(default)]
    pub iss: String,

    /// Subject.
    #[serde(default)]
    pub sub: String,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Every other claim, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Creates a new builder. The `jti` defaults to a random UUID.
    #[must_use]
    pub fn builder() -> TokenClaimsBuilder {
        TokenClaimsBuilder::new()
    }

    /// Parses and validates a raw claims mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidClaims`] if the value is not an object,
    /// `jti` is missing or empty, or a known claim has the wrong JSON type.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        if !value.is_object() {
            return Err(StoreError::invalid_claims("claims must be a JSON object"));
        }

        let claims: Self =
            serde_json::from_value(value).map_err(|e| StoreError::invalid_claims(e.to_string()))?;
        claims.validate()?;
        Ok(claims)
    }

    /// Checks the claims this crate relies on.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidClaims`] if `jti` is empty.
    pub fn validate(&self) -> StoreResult<()> {
        if self.jti.trim().is_empty() {
            return Err(StoreError::invalid_claims("missing required claim 'jti'"));
        }
        Ok(())
    }

    /// Serializes the full claims set, including pass-through claims.
    ///
    /// # Errors
    ///
    /// Returns an error if an extra claim cannot be serialized.
    pub fn to_value(&self) -> StoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The key a record for these claims is stored under.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.jti, &self.aud)
    }
}

impl TryFrom<Value> for TokenClaims {
    type Error = StoreError;

    fn try_from(value: Value) -> StoreResult<Self> {
        Self::from_value(value)
    }
}

/// Builder for [`TokenClaims`].
#[derive(Debug, Clone)]
pub struct TokenClaimsBuilder {
    claims: TokenClaims,
}

impl TokenClaimsBuilder {
    fn new() -> Self {
        Self {
            claims: TokenClaims {
                jti: uuid::Uuid::new_v4().to_string(),
                aud: String::new(),
                typ: String::new(),
                iss: String::new(),
                sub: String::new(),
                exp: None,
                extra: Map::new(),
            },
        }
    }

    /// Sets the JWT ID.
    #[must_use]
    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.claims.jti = jti.into();
        self
    }

    /// Sets the audience.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.claims.aud = aud.into();
        self
    }

    /// Sets the token type.
    #[must_use]
    pub fn token_type(mut self, typ: impl Into<String>) -> Self {
        self.claims.typ = typ.into();
        self
    }

    /// Sets the issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.claims.iss = iss.into();
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.claims.sub = sub.into();
        self
    }

    /// Sets the expiration time (Unix timestamp).
    #[must_use]
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.claims.exp = Some(exp);
        self
    }

    /// Adds a pass-through claim.
    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.extra.insert(name.into(), value.into());
        self
    }

    /// Builds the claims.
    #[must_use]
    pub fn build(self) -> TokenClaims {
        self.claims
    }
}
