//! # tokenkeep
//!
//! Revocable tokens through persistent token records.
//!
//! Every issued token is recorded; a token only verifies while its record
//! exists. Revoking a token deletes its record, and a periodic purge removes
//! records whose tokens have expired anyway.
//!
//! This crate does not sign or parse tokens. It receives the decoded claims
//! and the encoded token from whatever authentication framework does.
//!
//! ## Modules
//!
//! - [`config`] - Store configuration and settings loading
//! - [`types`] - Token claims and record types
//! - [`storage`] - Persistence backend trait and in-memory backend
//! - [`store`] - Token record store (create, find, delete, purge)
//! - [`hooks`] - Issue / verify / revoke hooks for the auth framework
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenkeep::prelude::*;
//!
//! let config = StoreConfig::builder()
//!     .backend(Arc::new(MemoryBackend::new()))
//!     .build()?;
//! let hooks = TokenHooks::new(Arc::new(TokenStore::new(config)));
//!
//! let claims = TokenClaims::builder().audience("web").subject("user:1").build();
//! hooks.on_issue(IssuedToken {
//!     resource: user,
//!     token_type: "access".into(),
//!     claims: claims.clone(),
//!     raw_token: jwt.clone(),
//! }).await?;
//!
//! hooks.on_verify(PresentedToken::new(claims, jwt)).await?;
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod storage;
pub mod store;
pub mod types;

pub use config::{ConfigError, Settings, StoreConfig, TableRef};
pub use error::{IssueError, RevokeError, StoreError, StoreResult, VerifyError};
pub use hooks::{IssuedToken, PresentedToken, TokenHooks};
pub use storage::{MemoryBackend, TokenBackend};
pub use store::TokenStore;
pub use types::{RecordKey, TokenClaims, TokenRecord};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokenkeep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigError, Settings, StoreConfig, TableRef};
    pub use crate::error::{IssueError, RevokeError, StoreError, StoreResult, VerifyError};
    pub use crate::hooks::{IssuedToken, PresentedToken, TokenHooks};
    pub use crate::storage::{MemoryBackend, TokenBackend};
    pub use crate::store::TokenStore;
    pub use crate::types::{RecordKey, TokenClaims, TokenRecord};
}
