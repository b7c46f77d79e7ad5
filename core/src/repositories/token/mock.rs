//! Mock implementation of TokenRepository for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::StoreError;

use super::r#trait::TokenRepository;

/// In-memory token repository for testing.
///
/// Mutations run under a single write lock, so `mark_used` has the same
/// first-writer-wins behavior the real store gets from its conditional
/// update. Clones share the same underlying map.
#[derive(Clone)]
pub struct MockTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl MockTokenRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MockTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, StoreError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.token_hash) {
            return Err(StoreError::persistence("duplicate token hash"));
        }

        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<RefreshToken, StoreError> {
        let tokens = self.tokens.read().await;
        tokens.get(token_hash).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_family(&self, token_family: Uuid) -> Result<Vec<RefreshToken>, StoreError> {
        let tokens = self.tokens.read().await;
        let mut rows: Vec<RefreshToken> = tokens
            .values()
            .filter(|t| t.token_family == token_family)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;

        match tokens.values_mut().find(|t| t.id == id) {
            Some(token) if token.used_at.is_none() => {
                token.used_at = Some(Utc::now());
                Ok(())
            }
            // Already consumed, or no such row: zero rows affected either way.
            _ => Err(StoreError::AlreadyConsumed),
        }
    }

    async fn revoke_family(&self, token_family: Uuid) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        let mut count = 0;

        for token in tokens.values_mut() {
            if token.token_family == token_family && token.revoked_at.is_none() {
                token.revoked_at = Some(now);
                count += 1;
            }
        }

        Ok(count)
    }

    async fn revoke_by_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        let mut count = 0;

        for token in tokens.values_mut() {
            if token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(now);
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let initial_count = tokens.len();

        tokens.retain(|_, token| !token.is_expired());

        Ok((initial_count - tokens.len()) as u64)
    }
}
