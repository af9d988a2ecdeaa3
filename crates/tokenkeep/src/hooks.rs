//! Lifecycle hooks called by the surrounding authentication framework.
//!
//! The framework calls [`TokenHooks::on_issue`] right after signing a token,
//! [`TokenHooks::on_verify`] before accepting a presented token, and
//! [`TokenHooks::on_revoke`] when a token is explicitly invalidated.
//!
//! Every hook either returns its input unchanged or fails; none of them
//! alters the token or its claims. The input types ([`IssuedToken`],
//! [`PresentedToken`]) make that pass-through explicit.
//!
//! # Record lifecycle
//!
//! ```text
//! nonexistent --on_issue--> active --on_revoke / purge--> nonexistent
//! ```
//!
//! `on_verify` succeeds only while the record is active.

use std::sync::Arc;

use crate::error::{IssueError, RevokeError, VerifyError};
use crate::store::TokenStore;
use crate::types::TokenClaims;

/// A token that has just been signed.
///
/// `resource` is whatever the framework issued the token for (typically a
/// user); it is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken<R> {
    /// The resource the token was issued for.
    pub resource: R,
    /// The token type requested by the framework.
    pub token_type: String,
    /// The token's claims.
    pub claims: TokenClaims,
    /// The encoded token.
    pub raw_token: String,
}

/// A token presented for verification or revocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedToken {
    /// The token's decoded claims.
    pub claims: TokenClaims,
    /// The encoded token.
    pub raw_token: String,
}

impl PresentedToken {
    /// Creates a new presented token.
    #[must_use]
    pub fn new(claims: TokenClaims, raw_token: impl Into<String>) -> Self {
        Self {
            claims,
            raw_token: raw_token.into(),
        }
    }
}

/// Hook adapter between an authentication framework and a [`TokenStore`].
#[derive(Debug, Clone)]
pub struct TokenHooks {
    store: Arc<TokenStore>,
}

impl TokenHooks {
    /// Creates hooks backed by `store`.
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Records a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns `IssueError::TokenStorageFailure` if the record could not be
    /// stored. The caller must then treat the token as not issued.
    pub async fn on_issue<R>(&self, issued: IssuedToken<R>) -> Result<IssuedToken<R>, IssueError>
    where
        R: Send,
    {
        match self.store.create(&issued.claims, &issued.raw_token).await {
            Ok(_) => Ok(issued),
            Err(e) => {
                tracing::warn!(
                    jti = %issued.claims.jti,
                    aud = %issued.claims.aud,
                    token_type = %issued.token_type,
                    error = %e,
                    "Failed to record issued token"
                );
                Err(IssueError::TokenStorageFailure(e))
            }
        }
    }

    /// Checks that a presented token still has a record.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::TokenNotFound` if there is no record, whatever
    /// the token's own `exp` says, and `VerifyError::Storage` if the lookup
    /// failed. Either way the token must be rejected.
    pub async fn on_verify(&self, token: PresentedToken) -> Result<PresentedToken, VerifyError> {
        match self.store.find_by_claims(&token.claims).await {
            Ok(Some(_)) => Ok(token),
            Ok(None) => {
                tracing::debug!(
                    jti = %token.claims.jti,
                    aud = %token.claims.aud,
                    "No record for presented token"
                );
                Err(VerifyError::TokenNotFound)
            }
            Err(e) => {
                tracing::warn!(
                    jti = %token.claims.jti,
                    aud = %token.claims.aud,
                    error = %e,
                    "Token record lookup failed"
                );
                Err(VerifyError::Storage(e))
            }
        }
    }

    /// Revokes a token by deleting its record.
    ///
    /// Revoking a token that has no record succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RevokeError::CouldNotRevokeToken` if the record could not be
    /// looked up or deleted.
    pub async fn on_revoke(&self, token: PresentedToken) -> Result<PresentedToken, RevokeError> {
        let record = self
            .store
            .find_by_claims(&token.claims)
            .await
            .map_err(|e| self.revoke_failed(&token, e))?;

        let Some(record) = record else {
            tracing::debug!(
                jti = %token.claims.jti,
                aud = %token.claims.aud,
                "Revoke of unrecorded token, nothing to do"
            );
            return Ok(token);
        };

        self.store
            .delete(&record)
            .await
            .map_err(|e| self.revoke_failed(&token, e))?;

        tracing::info!(jti = %record.jti, aud = %record.aud, "Token revoked");
        Ok(token)
    }

    fn revoke_failed(&self, token: &PresentedToken, e: crate::StoreError) -> RevokeError {
        tracing::warn!(
            jti = %token.claims.jti,
            aud = %token.claims.aud,
            error = %e,
            "Failed to revoke token"
        );
        RevokeError::CouldNotRevokeToken(e)
    }
}

// =============================================================================
// Tests
// =============================================================================
