//! Token claims and record types.

pub mod claims;
pub mod record;

pub use claims::{TokenClaims, TokenClaimsBuilder};
pub use record::{RecordKey, TokenRecord};
