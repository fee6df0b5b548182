//! Configuration for the token manager.

/// Configuration for [`TokenManager`](super::TokenManager).
///
/// Resolved once at construction; the effective token lifetimes are queryable
/// on the manager afterwards.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for signing and verifying access tokens (required, non-empty)
    pub access_secret: String,
    /// Secret for signing and verifying refresh tokens (required, non-empty)
    pub refresh_secret: String,
    /// Access token lifetime as `<integer><unit>` with unit `s`/`m`/`h`/`d`
    pub access_expires_in: String,
    /// Refresh token lifetime, same format
    pub refresh_expires_in: String,
    /// Issuer claim, included at signing and required to match at verification
    pub issuer: Option<String>,
    /// Audience claim, same treatment
    pub audience: Option<String>,
}

impl TokenConfig {
    /// Creates a configuration with the default lifetimes (15m access, 7d
    /// refresh) and no issuer/audience.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Self::default()
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_expires_in: "15m".to_string(),
            refresh_expires_in: "7d".to_string(),
            issuer: None,
            audience: None,
        }
    }
}
