//! Token manager: issuance, verification, and the rotation state machine.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::entities::token::{Claims, IssuedToken, RefreshTokenRecord, TokenType};
use crate::errors::{Error, TokenError};
use crate::repositories::RefreshTokenStore;

use super::config::TokenConfig;
use super::expiry::resolve_expiry;

/// Signing keys and validation rules for one token class.
struct SigningContext {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SigningContext {
    fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

/// Issues, verifies, and rotates access and refresh tokens.
///
/// Access tokens are stateless and expire on their own schedule. Refresh
/// tokens are additionally tracked in a [`RefreshTokenStore`] so that rotation
/// can revoke the consumed token and detect reuse. The store is optional for
/// plain issuance and verification; [`rotate_refresh_token`] requires one.
///
/// [`rotate_refresh_token`]: TokenManager::rotate_refresh_token
pub struct TokenManager {
    access: SigningContext,
    refresh: SigningContext,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: Option<String>,
    audience: Option<String>,
    store: Option<Arc<dyn RefreshTokenStore>>,
}

impl TokenManager {
    /// Creates a manager without a refresh token store.
    ///
    /// Refresh tokens issued by such a manager are valid but untrackable and
    /// cannot be rotated.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if either secret is empty.
    pub fn new(config: TokenConfig) -> Result<Self, Error> {
        Self::build(config, None)
    }

    /// Creates a manager backed by a refresh token store.
    pub fn with_store(
        config: TokenConfig,
        store: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, Error> {
        Self::build(config, Some(store))
    }

    fn build(config: TokenConfig, store: Option<Arc<dyn RefreshTokenStore>>) -> Result<Self, Error> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(Error::Configuration {
                message: "both access_secret and refresh_secret are required".to_string(),
            });
        }

        let issuer = config.issuer.as_deref();
        let audience = config.audience.as_deref();

        Ok(Self {
            access: SigningContext::new(&config.access_secret, issuer, audience),
            refresh: SigningContext::new(&config.refresh_secret, issuer, audience),
            access_ttl: resolve_expiry(&config.access_expires_in),
            refresh_ttl: resolve_expiry(&config.refresh_expires_in),
            issuer: config.issuer,
            audience: config.audience,
            store,
        })
    }

    /// Effective access token lifetime after expiry-string resolution.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Effective refresh token lifetime after expiry-string resolution.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issues an access token for `subject`.
    ///
    /// Caller-supplied `extra` attributes are embedded in the payload after
    /// reserved claim names are stripped; the system's `sub`, `jti`, `typ`,
    /// `iat`, and `exp` always win. No side effects beyond signing.
    pub fn issue_access_token(
        &self,
        subject: &str,
        extra: Map<String, Value>,
    ) -> Result<IssuedToken, Error> {
        let claims = Claims::new(
            subject,
            TokenType::Access,
            self.access_ttl,
            self.issuer.as_deref(),
            self.audience.as_deref(),
        )
        .with_extra(extra);

        self.sign(&claims, &self.access)
    }

    /// Issues a refresh token for `subject` and, when a store is configured,
    /// persists an active record for it.
    ///
    /// # Errors
    ///
    /// Store failures propagate unmodified; no record means no token, so the
    /// caller never holds an untracked-but-rotatable credential.
    pub async fn issue_refresh_token(&self, subject: &str) -> Result<IssuedToken, Error> {
        let claims = Claims::new(
            subject,
            TokenType::Refresh,
            self.refresh_ttl,
            self.issuer.as_deref(),
            self.audience.as_deref(),
        );

        let issued = self.sign(&claims, &self.refresh)?;

        if let Some(store) = &self.store {
            let expires_at = Utc::now() + self.refresh_ttl;
            store
                .save(RefreshTokenRecord::new(subject, &issued.token_id, expires_at))
                .await?;
        }

        Ok(issued)
    }

    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// `TokenError::InvalidTokenType` for a correctly signed non-access
    /// payload; `TokenError::Expired` or `TokenError::InvalidFormat` for
    /// everything else.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, Error> {
        self.verify(token, &self.access, TokenType::Access)
    }

    /// Verifies a refresh token and returns its claims.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, Error> {
        self.verify(token, &self.refresh, TokenType::Refresh)
    }

    /// Exchanges a still-valid refresh token for a new one, revoking the old.
    ///
    /// State machine per presented `jti`:
    ///
    /// 1. Fail with `Error::Configuration` when no store is configured.
    /// 2. Verify the token (signature, expiry, issuer/audience, type) before
    ///    any store access.
    /// 3. Look up the record. A missing record is treated exactly like a
    ///    revoked one: the token was already consumed or never legitimately
    ///    issued, so its reappearance is evidence of reuse.
    /// 4. On reuse, revoke every record for the user and fail with
    ///    `Error::ReuseDetected`. One confirmed replay invalidates the whole
    ///    session family, forcing re-authentication.
    /// 5. Otherwise revoke the presented record, then issue a fresh token for
    ///    the same subject.
    ///
    /// The revoke (or sweep) always runs before a new token is returned.
    /// No internal retries; store failures propagate unmodified.
    pub async fn rotate_refresh_token(&self, old_token: &str) -> Result<IssuedToken, Error> {
        let store = self.store.as_ref().ok_or_else(|| Error::Configuration {
            message: "refresh token store not configured".to_string(),
        })?;

        let claims = self.verify_refresh_token(old_token)?;
        let record = store.find(&claims.jti).await?;

        match record {
            Some(record) if !record.revoked => {
                store.revoke(&claims.jti).await?;
                debug!(jti = %claims.jti, "refresh token rotated");
                self.issue_refresh_token(&claims.sub).await
            }
            record => {
                // Unknown jti gets the same treatment as a revoked one
                let user_id = record.map(|r| r.user_id).unwrap_or(claims.sub);
                let swept = store.revoke_all_by_user(&user_id).await?;
                warn!(
                    user_id = %user_id,
                    jti = %claims.jti,
                    swept,
                    "refresh token reuse detected, all user tokens revoked"
                );
                Err(Error::ReuseDetected)
            }
        }
    }

    fn sign(&self, claims: &Claims, context: &SigningContext) -> Result<IssuedToken, Error> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &context.encoding_key)
            .map_err(|_| Error::Token(TokenError::GenerationFailed))?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti.clone(),
        })
    }

    /// The type check runs strictly after signature validation: a token signed
    /// with the wrong secret fails at the signature stage and never reaches
    /// it, so the error cannot distinguish secrets.
    fn verify(
        &self,
        token: &str,
        context: &SigningContext,
        expected: TokenType,
    ) -> Result<Claims, Error> {
        let data = decode::<Claims>(token, &context.decoding_key, &context.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidFormat,
            })?;

        if data.claims.typ != expected {
            return Err(Error::Token(TokenError::InvalidTokenType));
        }

        Ok(data.claims)
    }
}
