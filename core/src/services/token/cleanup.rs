//! Periodic cleanup of expired refresh tokens.
//!
//! Expired rows are dead weight: they can never transition back to usable,
//! so a background sweep deletes them to keep the hash and family indexes
//! small. Advisory only; correctness never depends on the sweep running.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::errors::DomainError;
use crate::repositories::TokenRepository;

/// Configuration for the token cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_secs: u64,
    /// Whether to run the sweep at all
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600, // Run every hour
            enabled: true,
        }
    }
}

/// Service for sweeping expired refresh tokens.
pub struct TokenCleanupService<R: TokenRepository + 'static> {
    repository: Arc<R>,
    config: TokenCleanupConfig,
}

impl<R: TokenRepository> TokenCleanupService<R> {
    /// Create a new token cleanup service
    pub fn new(repository: Arc<R>, config: TokenCleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Run a single cleanup cycle.
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of tokens deleted (0 when disabled)
    /// * `Err(DomainError)` - The sweep failed; the next cycle retries
    pub async fn run_once(&self) -> Result<u64, DomainError> {
        if !self.config.enabled {
            return Ok(0);
        }

        let deleted = self.repository.delete_expired().await?;
        if deleted > 0 {
            info!(deleted, "deleted expired refresh tokens");
        }

        Ok(deleted)
    }

    /// Spawns the periodic sweep on the current runtime.
    ///
    /// The task runs until the handle is aborted or the runtime shuts down;
    /// failures are logged and the sweep retries on the next tick.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if !self.config.enabled {
                return;
            }

            let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
            // First tick fires immediately; skip it so startup isn't
            // burdened with a sweep.
            interval.tick().await;

            loop {
                interval.tick().await;
                if let Err(err) = self.run_once().await {
                    error!(error = %err, "token cleanup cycle failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::token::RefreshToken;
    use crate::repositories::MockTokenRepository;
    use chrono::{Duration as ChronoDuration, Utc};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_run_once_deletes_only_expired_rows() {
        let repository = Arc::new(MockTokenRepository::new());
        let mut expired = RefreshToken::new(Uuid::new_v4(), "hash-old".to_string(), ChronoDuration::days(7));
        expired.expires_at = Utc::now() - ChronoDuration::days(1);
        repository.create(expired).await.unwrap();
        repository
            .create(RefreshToken::new(Uuid::new_v4(), "hash-live".to_string(), ChronoDuration::days(7)))
            .await
            .unwrap();

        let service = TokenCleanupService::new(repository.clone(), TokenCleanupConfig::default());

        assert_eq!(service.run_once().await.unwrap(), 1);
        assert!(repository.find_by_hash("hash-live").await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_sweep_is_a_noop() {
        let repository = Arc::new(MockTokenRepository::new());
        let mut expired = RefreshToken::new(Uuid::new_v4(), "hash-old".to_string(), ChronoDuration::days(7));
        expired.expires_at = Utc::now() - ChronoDuration::days(1);
        repository.create(expired).await.unwrap();

        let config = TokenCleanupConfig {
            enabled: false,
            ..TokenCleanupConfig::default()
        };
        let service = TokenCleanupService::new(repository.clone(), config);

        assert_eq!(service.run_once().await.unwrap(), 0);
        assert!(repository.find_by_hash("hash-old").await.is_ok());
    }
}
