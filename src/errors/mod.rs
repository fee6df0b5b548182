//! Error types for token issuance, verification, and rotation.

use thiserror::Error;

/// Token validation and generation errors.
///
/// Sub-causes of a rejected token are deliberately coarse: callers learn
/// "expired" or "invalid", never which validation stage failed, so error
/// messages cannot be used as an oracle to probe secrets.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidFormat,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Token generation failed")]
    GenerationFailed,
}

/// Top-level error type for all crate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-programming-error class: missing secrets, or an operation that
    /// requires a store invoked without one. Not retryable.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Token(#[from] TokenError),

    /// A refresh token was presented after it had already been rotated (or was
    /// never issued). By the time this surfaces, every refresh token for the
    /// affected user has been revoked; callers must force re-authentication,
    /// not retry.
    #[error("Refresh token reuse detected")]
    ReuseDetected,

    /// Store-originated failure, propagated unmodified. Masking one of these
    /// could hide a failed revocation.
    #[error("Store error: {message}")]
    Store { message: String },
}

pub type TokenResult<T> = Result<T, Error>;
