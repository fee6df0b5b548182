//! Token service module: issuance, verification, and refresh token rotation.
//!
//! - JWT access and refresh token generation and verification
//! - Refresh token rotation with reuse detection
//! - Expiry string parsing (`"15m"`, `"7d"`)

mod config;
mod expiry;
mod service;

#[cfg(test)]
mod tests;

pub use config::TokenConfig;
pub use expiry::parse_expiry;
pub use service::TokenManager;
