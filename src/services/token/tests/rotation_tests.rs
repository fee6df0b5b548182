//! Unit tests for the refresh token rotation state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::domain::entities::token::{Claims, RefreshTokenRecord, TokenType};
use crate::errors::{Error, TokenError};
use crate::repositories::{InMemoryTokenStore, RefreshTokenStore};
use crate::services::token::{TokenConfig, TokenManager};

/// Store wrapper that records which contract methods were invoked.
struct RecordingStore {
    records: Mutex<HashMap<String, RefreshTokenRecord>>,
    find_calls: Mutex<Vec<String>>,
    revoke_all_calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            find_calls: Mutex::new(Vec::new()),
            revoke_all_calls: Mutex::new(Vec::new()),
        }
    }

    fn revoke_all_calls(&self) -> Vec<String> {
        self.revoke_all_calls.lock().unwrap().clone()
    }

    fn find_calls(&self) -> Vec<String> {
        self.find_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshTokenStore for RecordingStore {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), Error> {
        self.records
            .lock()
            .unwrap()
            .insert(record.jti.clone(), record);
        Ok(())
    }

    async fn find(&self, jti: &str) -> Result<Option<RefreshTokenRecord>, Error> {
        self.find_calls.lock().unwrap().push(jti.to_string());
        Ok(self.records.lock().unwrap().get(jti).cloned())
    }

    async fn revoke(&self, jti: &str) -> Result<(), Error> {
        if let Some(record) = self.records.lock().unwrap().get_mut(jti) {
            record.revoke();
        }
        Ok(())
    }

    async fn revoke_all_by_user(&self, user_id: &str) -> Result<usize, Error> {
        self.revoke_all_calls.lock().unwrap().push(user_id.to_string());
        let mut records = self.records.lock().unwrap();
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
        Ok(0)
    }
}

/// Store whose writes always fail.
struct FailingStore;

#[async_trait]
impl RefreshTokenStore for FailingStore {
    async fn save(&self, _record: RefreshTokenRecord) -> Result<(), Error> {
        Err(Error::Store {
            message: "connection refused".to_string(),
        })
    }

    async fn find(&self, _jti: &str) -> Result<Option<RefreshTokenRecord>, Error> {
        Err(Error::Store {
            message: "connection refused".to_string(),
        })
    }

    async fn revoke(&self, _jti: &str) -> Result<(), Error> {
        Err(Error::Store {
            message: "connection refused".to_string(),
        })
    }

    async fn revoke_all_by_user(&self, _user_id: &str) -> Result<usize, Error> {
        Err(Error::Store {
            message: "connection refused".to_string(),
        })
    }

    async fn delete_expired(&self) -> Result<usize, Error> {
        Err(Error::Store {
            message: "connection refused".to_string(),
        })
    }
}

fn config() -> TokenConfig {
    TokenConfig::new("access-secret", "refresh-secret")
}

fn manager_with(store: Arc<dyn RefreshTokenStore>) -> TokenManager {
    TokenManager::with_store(config(), store).unwrap()
}

#[tokio::test]
async fn test_issue_refresh_token_persists_active_record() {
    let store = Arc::new(InMemoryTokenStore::new());
    let manager = manager_with(store.clone());

    let issued = manager.issue_refresh_token("user-1").await.unwrap();
    let record = store.find(&issued.token_id).await.unwrap().unwrap();

    assert_eq!(record.user_id, "user-1");
    assert!(!record.revoked);
    assert!(record.expires_at > Utc::now());
}

#[tokio::test]
async fn test_rotation_revokes_old_and_activates_new() {
    let store = Arc::new(InMemoryTokenStore::new());
    let manager = manager_with(store.clone());

    let r1 = manager.issue_refresh_token("user-1").await.unwrap();
    let r2 = manager.rotate_refresh_token(&r1.token).await.unwrap();

    assert_ne!(r2.token_id, r1.token_id);
    assert!(store.find(&r1.token_id).await.unwrap().unwrap().revoked);

    let new_record = store.find(&r2.token_id).await.unwrap().unwrap();
    assert_eq!(new_record.user_id, "user-1");
    assert!(!new_record.revoked);
}

#[tokio::test]
async fn test_rotated_token_reuse_revokes_whole_family() {
    let store = Arc::new(InMemoryTokenStore::new());
    let manager = manager_with(store.clone());

    let r1 = manager.issue_refresh_token("user-1").await.unwrap();
    let r2 = manager.rotate_refresh_token(&r1.token).await.unwrap();

    // Replaying the consumed token trips the sweep
    let err = manager.rotate_refresh_token(&r1.token).await.unwrap_err();
    assert!(matches!(err, Error::ReuseDetected));

    // Every token for the user is now revoked, the fresh one included
    assert!(store.find(&r2.token_id).await.unwrap().unwrap().revoked);

    // So the legitimate successor is dead too
    let err = manager.rotate_refresh_token(&r2.token).await.unwrap_err();
    assert!(matches!(err, Error::ReuseDetected));
}

#[tokio::test]
async fn test_sweep_spares_other_users() {
    let store = Arc::new(InMemoryTokenStore::new());
    let manager = manager_with(store.clone());

    let victim = manager.issue_refresh_token("user-1").await.unwrap();
    let bystander = manager.issue_refresh_token("user-2").await.unwrap();
    manager.rotate_refresh_token(&victim.token).await.unwrap();

    let err = manager.rotate_refresh_token(&victim.token).await.unwrap_err();
    assert!(matches!(err, Error::ReuseDetected));

    assert!(!store.find(&bystander.token_id).await.unwrap().unwrap().revoked);
}

#[tokio::test]
async fn test_unknown_token_id_treated_as_reuse() {
    let store = Arc::new(RecordingStore::new());
    let manager = manager_with(store.clone());

    // Tracked token for the same user, to observe the sweep
    let tracked = manager.issue_refresh_token("user-1").await.unwrap();

    // Correctly signed refresh token whose jti was never saved
    let untracked = TokenManager::new(config())
        .unwrap()
        .issue_refresh_token("user-1")
        .await
        .unwrap();

    let err = manager.rotate_refresh_token(&untracked.token).await.unwrap_err();

    assert!(matches!(err, Error::ReuseDetected));
    assert_eq!(store.revoke_all_calls(), vec!["user-1".to_string()]);
    assert!(store
        .records
        .lock()
        .unwrap()
        .get(&tracked.token_id)
        .unwrap()
        .revoked);
}

#[tokio::test]
async fn test_rotation_without_store_fails_fast() {
    let manager = TokenManager::new(config()).unwrap();
    let issued = manager.issue_refresh_token("user-1").await.unwrap();

    let err = manager.rotate_refresh_token(&issued.token).await.unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
}

#[tokio::test]
async fn test_missing_store_reported_before_verification() {
    let manager = TokenManager::new(config()).unwrap();

    // Even a garbage token surfaces the configuration problem first
    let err = manager.rotate_refresh_token("not-a-token").await.unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
}

#[tokio::test]
async fn test_expired_token_fails_verification_not_reuse_detection() {
    let store = Arc::new(RecordingStore::new());
    let manager = manager_with(store.clone());

    let mut claims = Claims::new("user-1", TokenType::Refresh, Duration::days(7), None, None);
    claims.exp = Utc::now().timestamp() - 3600;
    let expired = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"refresh-secret"),
    )
    .unwrap();

    let err = manager.rotate_refresh_token(&expired).await.unwrap_err();

    // Expiry is not reuse: no lookup, no sweep
    assert!(matches!(err, Error::Token(TokenError::Expired)));
    assert!(store.find_calls().is_empty());
    assert!(store.revoke_all_calls().is_empty());
}

#[tokio::test]
async fn test_access_token_rejected_before_reuse_logic() {
    let store = Arc::new(RecordingStore::new());
    let manager = manager_with(store.clone());

    // Signed with the refresh secret but access-typed: passes the signature
    // stage, fails the type check, never reaches the store
    let claims = Claims::new("user-1", TokenType::Access, Duration::minutes(15), None, None);
    let wrong_type = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"refresh-secret"),
    )
    .unwrap();

    let err = manager.rotate_refresh_token(&wrong_type).await.unwrap_err();

    assert!(matches!(err, Error::Token(TokenError::InvalidTokenType)));
    assert!(store.find_calls().is_empty());
    assert!(store.revoke_all_calls().is_empty());
}

#[tokio::test]
async fn test_real_access_token_fails_at_signature_stage() {
    let store = Arc::new(RecordingStore::new());
    let manager = manager_with(store.clone());

    let access = manager
        .issue_access_token("user-1", serde_json::Map::new())
        .unwrap();

    let err = manager.rotate_refresh_token(&access.token).await.unwrap_err();

    assert!(matches!(err, Error::Token(TokenError::InvalidFormat)));
    assert!(store.revoke_all_calls().is_empty());
}

#[tokio::test]
async fn test_store_failure_propagates_from_issuance() {
    let manager = manager_with(Arc::new(FailingStore));

    let err = manager.issue_refresh_token("user-1").await.unwrap_err();

    assert!(matches!(err, Error::Store { .. }));
}

#[tokio::test]
async fn test_store_failure_propagates_from_rotation() {
    // Issue against a working store, rotate against a failing one sharing
    // the same secrets
    let working = manager_with(Arc::new(InMemoryTokenStore::new()));
    let issued = working.issue_refresh_token("user-1").await.unwrap();

    let failing = manager_with(Arc::new(FailingStore));
    let err = failing.rotate_refresh_token(&issued.token).await.unwrap_err();

    assert!(matches!(err, Error::Store { .. }));
}
