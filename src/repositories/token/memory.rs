//! In-memory reference implementation of the refresh token store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::Error;

use super::r#trait::RefreshTokenStore;

/// Refresh token store backed by a `HashMap` keyed on `jti`.
///
/// Usable as a drop-in store for tests and single-process deployments.
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct InMemoryTokenStore {
    records: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of records currently held, revoked ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryTokenStore {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), Error> {
        let mut records = self.records.write().await;

        // jti values are never reused; a duplicate means a caller bug
        if records.contains_key(&record.jti) {
            return Err(Error::Store {
                message: format!("duplicate token record: {}", record.jti),
            });
        }

        records.insert(record.jti.clone(), record);
        Ok(())
    }

    async fn find(&self, jti: &str) -> Result<Option<RefreshTokenRecord>, Error> {
        let records = self.records.read().await;
        Ok(records.get(jti).cloned())
    }

    async fn revoke(&self, jti: &str) -> Result<(), Error> {
        let mut records = self.records.write().await;

        if let Some(record) = records.get_mut(jti) {
            record.revoke();
        }

        Ok(())
    }

    async fn revoke_all_by_user(&self, user_id: &str) -> Result<usize, Error> {
        let mut records = self.records.write().await;
        let mut count = 0;

        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoke();
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_expired(&self) -> Result<usize, Error> {
        let mut records = self.records.write().await;
        let initial_count = records.len();

        records.retain(|_, record| !record.is_expired());

        Ok(initial_count - records.len())
    }
}
