//! Refresh token store trait defining the interface for revocation-state
//! persistence.

use async_trait::async_trait;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::Error;

/// Contract for persisting refresh token records.
///
/// The core reads and requests mutations exclusively through this trait; the
/// implementation owns persistence, durability, and cleanup. Store failures
/// must be surfaced, never swallowed: a masked error here can hide a failed
/// revocation.
///
/// # Concurrency
///
/// Implementations arbitrate concurrent rotation of the same `jti`. Required
/// guarantees:
/// - `revoke` and `revoke_all_by_user` are idempotent.
/// - A completed `save` is visible to a subsequent `find` from the same
///   caller context.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persists a new active record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if persistence fails.
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), Error>;

    /// Point lookup by token identifier.
    async fn find(&self, jti: &str) -> Result<Option<RefreshTokenRecord>, Error>;

    /// Idempotently marks one record revoked.
    ///
    /// A missing or already-revoked record is a no-op, not an error.
    async fn revoke(&self, jti: &str) -> Result<(), Error>;

    /// Idempotently marks every record for the user revoked.
    ///
    /// Returns the number of records flipped by this call.
    async fn revoke_all_by_user(&self, user_id: &str) -> Result<usize, Error>;

    /// Deletes expired records. Retention is the store owner's concern; the
    /// rotation core never calls this.
    ///
    /// Returns the number of records deleted.
    async fn delete_expired(&self) -> Result<usize, Error>;
}
