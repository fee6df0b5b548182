//! # tokenmill
//!
//! JWT issuance and verification with refresh token rotation.
//! The crate signs short-lived access tokens and long-lived refresh tokens,
//! tracks each refresh token's revocation state through a pluggable store,
//! and detects reuse of an already-rotated refresh token by revoking every
//! outstanding token for the affected user.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::token::{Claims, IssuedToken, RefreshTokenRecord, TokenType};
pub use errors::{Error, TokenError, TokenResult};
pub use repositories::{InMemoryTokenStore, RefreshTokenStore};
pub use services::token::{TokenConfig, TokenManager};
