//! Token entities: signed claim sets and persisted refresh token records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Claim names owned by the issuance step. Caller-supplied extra attributes
/// are stripped of these before merging so the system's values always win.
pub const RESERVED_CLAIMS: [&str; 8] = ["sub", "jti", "typ", "iat", "exp", "nbf", "iss", "aud"];

/// Token class, fixed for the token's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Signed JWT payload.
///
/// Unknown payload fields deserialize into `extra`, so access tokens can carry
/// arbitrary caller-supplied attributes alongside the registered claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (opaque user identifier)
    pub sub: String,

    /// Unique token identifier, minted at issuance and never reused
    pub jti: String,

    /// Token type
    pub typ: TokenType,

    /// Issued at timestamp (unix seconds)
    pub iat: i64,

    /// Expiration timestamp (unix seconds)
    pub exp: i64,

    /// Issuer, present only when configured on the issuing manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, present only when configured on the issuing manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Additional caller-supplied attributes (access tokens only)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Creates claims for a freshly issued token with a newly minted `jti`.
    pub fn new(
        subject: &str,
        typ: TokenType,
        ttl: Duration,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: issuer.map(str::to_string),
            aud: audience.map(str::to_string),
            extra: Map::new(),
        }
    }

    /// Merges caller-supplied attributes, dropping any reserved claim names.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = Self::strip_reserved(extra);
        self
    }

    /// Removes reserved claim names from a caller-supplied attribute map.
    pub fn strip_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
        for claim in RESERVED_CLAIMS {
            extra.remove(claim);
        }
        extra
    }

    /// Whether the embedded expiry is in the past.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Token returned to the caller together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact signed JWT
    pub token: String,

    /// The `jti` embedded in the token, usable as a store lookup key
    pub token_id: String,
}

/// Persisted revocation state for one minted refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// User this token belongs to
    pub user_id: String,

    /// Token identifier (primary key)
    pub jti: String,

    /// Whether the token has been consumed or swept
    pub revoked: bool,

    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Creates a new active record.
    pub fn new(user_id: &str, jti: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            jti: jti.to_string(),
            revoked: false,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// Marks the record revoked. Terminal: records are never reactivated.
    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// A record is active when it is neither revoked nor expired.
    pub fn is_active(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}
