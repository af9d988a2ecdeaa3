//! Error types for token record storage and the lifecycle hooks.
//!
//! Store-level failures are reported as [`StoreError`]. The hook adapter maps
//! them into one error type per entry point ([`IssueError`], [`VerifyError`],
//! [`RevokeError`]) so the calling framework can gate its own flow on a small,
//! closed set of outcomes.

// =============================================================================
// Store Errors
// =============================================================================

/// Errors that can occur during token record storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with the same identity and audience already exists.
    #[error("Duplicate identity: jti '{jti}' is already recorded for audience '{aud}'")]
    DuplicateIdentity {
        /// The token identifier.
        jti: String,
        /// The audience the identifier is recorded for.
        aud: String,
    },

    /// The claims mapping is missing a required claim or a claim has the wrong type.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of the problem.
        message: String,
    },

    /// The persistence backend reported a failure.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend error.
        message: String,
    },

    /// Claims could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `DuplicateIdentity` error.
    #[must_use]
    pub fn duplicate_identity(jti: impl Into<String>, aud: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            jti: jti.into(),
            aud: aud.into(),
        }
    }

    /// Create an `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Create a `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `DuplicateIdentity` error.
    #[must_use]
    pub fn is_duplicate_identity(&self) -> bool {
        matches!(self, Self::DuplicateIdentity { .. })
    }

    /// Returns `true` if this is an `InvalidClaims` error.
    #[must_use]
    pub fn is_invalid_claims(&self) -> bool {
        matches!(self, Self::InvalidClaims { .. })
    }

    /// Returns `true` if this is a backend error.
    #[must_use]
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Hook Errors
// =============================================================================

/// Failure of the post-issuance hook.
///
/// A token whose record could not be stored must not be handed out: it would
/// never pass verification.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// The token record could not be stored.
    #[error("Token storage failure: {0}")]
    TokenStorageFailure(#[source] StoreError),
}

/// Failure of the pre-verification hook.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// No record exists for the presented identity and audience.
    #[error("Token not found")]
    TokenNotFound,

    /// The lookup itself failed. Verification fails closed.
    #[error("Token lookup failed: {0}")]
    Storage(#[source] StoreError),
}

impl VerifyError {
    /// Returns `true` if the token simply has no record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TokenNotFound)
    }
}

/// Failure of the revocation hook.
///
/// Revoking a token that has no record is not a failure.
#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    /// The record was found but could not be deleted, or the lookup failed.
    #[error("Could not revoke token: {0}")]
    CouldNotRevokeToken(#[source] StoreError),
}

// =============================================================================
// Tests
// =============================================================================
