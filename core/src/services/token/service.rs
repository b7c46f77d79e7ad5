//! Token service: issuance, rotation with reuse detection, and revocation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, RefreshToken, TokenPair};
use crate::domain::value_objects::Subject;
use crate::errors::{DomainError, StoreError, TokenError};
use crate::repositories::{TokenRepository, UserDirectory};

use super::config::TokenServiceConfig;
use super::signer::JwtSigner;

/// Number of random bytes in an opaque refresh secret (256 bits).
const REFRESH_SECRET_BYTES: usize = 32;

/// Service orchestrating the signer and the store.
///
/// Holds all security-critical decision logic: the per-token state machine,
/// atomic consume-and-replace on rotation, and family-wide revocation on
/// anomaly. Safe under arbitrary concurrent invocation; the single-use
/// guarantee rests on the store's conditional `mark_used` update, never on
/// in-process locking.
pub struct TokenService<R: TokenRepository, D: UserDirectory> {
    pub(crate) repository: R,
    directory: D,
    signer: JwtSigner,
    config: TokenServiceConfig,
}

impl<R: TokenRepository, D: UserDirectory> TokenService<R, D> {
    /// Creates a new token service instance.
    ///
    /// # Arguments
    ///
    /// * `repository` - Refresh token store
    /// * `directory` - Resolves token owners at rotation time
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or a configuration error (empty signing secret,
    /// non-positive TTL).
    pub fn new(repository: R, directory: D, config: TokenServiceConfig) -> Result<Self, DomainError> {
        let signer = JwtSigner::new(&config)?;

        Ok(Self {
            repository,
            directory,
            signer,
            config,
        })
    }

    /// Issues a fresh access/refresh pair for an authenticated subject.
    ///
    /// Starts a new token family. The access token is never handed back
    /// without a durable refresh counterpart: if persistence fails, the
    /// whole call fails with `StoreUnavailable`.
    pub async fn issue_pair(&self, subject: &Subject) -> Result<TokenPair, DomainError> {
        let access_token = self.sign_access_token(subject)?;

        let secret = generate_refresh_secret();
        let record = RefreshToken::new(
            subject.user_id,
            hash_token(&secret),
            self.config.refresh_token_ttl(),
        );

        let stored = self.repository.create(record).await.map_err(store_fault)?;

        debug!(user_id = %subject.user_id, family = %stored.token_family, "issued token pair");

        Ok(TokenPair::new(
            access_token,
            secret,
            self.config.access_token_ttl().num_seconds(),
            stored.token_family,
        ))
    }

    /// Exchanges a refresh secret for a new pair, rotating the token.
    ///
    /// The presented token is consumed exactly once: of any number of
    /// concurrent calls with the same secret, at most one observes success.
    /// A replay of an already-consumed token revokes its entire family and
    /// reports `TokenReuseDetected`; the caller must force a full
    /// re-authentication.
    pub async fn refresh(&self, presented_secret: &str) -> Result<TokenPair, DomainError> {
        let token = match self.repository.find_by_hash(&hash_token(presented_secret)).await {
            Ok(token) => token,
            // Unknown and malformed secrets are indistinguishable on purpose.
            Err(StoreError::NotFound) => return Err(TokenError::InvalidToken.into()),
            Err(err) => return Err(store_fault(err)),
        };

        if token.is_revoked() {
            debug!(user_id = %token.user_id, family = %token.token_family, "refresh with revoked token");
            return Err(TokenError::TokenRevoked.into());
        }

        if token.is_expired() {
            debug!(user_id = %token.user_id, family = %token.token_family, "refresh with expired token");
            return Err(TokenError::TokenExpired.into());
        }

        if token.is_used() {
            return self.handle_reuse(&token).await;
        }

        match self.repository.mark_used(token.id).await {
            Ok(()) => {}
            // A concurrent rotation won the race between our read and this
            // update; indistinguishable from replay, so treated the same.
            Err(StoreError::AlreadyConsumed) => return self.handle_reuse(&token).await,
            Err(err) => return Err(store_fault(err)),
        }

        let subject = match self.directory.find_subject(token.user_id).await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                warn!(user_id = %token.user_id, "refresh token owner no longer exists");
                return Err(TokenError::InvalidToken.into());
            }
            Err(err) => return Err(store_fault(err)),
        };

        let access_token = self.sign_access_token(&subject)?;

        let secret = generate_refresh_secret();
        let successor = RefreshToken::for_rotation(
            token.user_id,
            hash_token(&secret),
            token.token_family,
            self.config.refresh_token_ttl(),
        );

        let stored = self.repository.create(successor).await.map_err(store_fault)?;

        debug!(user_id = %token.user_id, family = %stored.token_family, "rotated refresh token");

        Ok(TokenPair::new(
            access_token,
            secret,
            self.config.access_token_ttl().num_seconds(),
            stored.token_family,
        ))
    }

    /// Revokes the family of the presented refresh token.
    ///
    /// Not-found is success: revoking a token that does not exist achieves
    /// the caller's intent, so logout is idempotent.
    pub async fn revoke(&self, presented_secret: &str) -> Result<(), DomainError> {
        let token = match self.repository.find_by_hash(&hash_token(presented_secret)).await {
            Ok(token) => token,
            Err(StoreError::NotFound) => return Ok(()),
            Err(err) => return Err(store_fault(err)),
        };

        self.repository
            .revoke_family(token.token_family)
            .await
            .map_err(store_fault)?;

        Ok(())
    }

    /// As [`revoke`](Self::revoke), but verifies the token belongs to the
    /// caller-asserted user first. A mismatch revokes nothing and reports
    /// `OwnershipMismatch`, so one user cannot kill another's session by
    /// guessing a token value.
    pub async fn revoke_for_user(&self, user_id: Uuid, presented_secret: &str) -> Result<(), DomainError> {
        let token = match self.repository.find_by_hash(&hash_token(presented_secret)).await {
            Ok(token) => token,
            Err(StoreError::NotFound) => return Ok(()),
            Err(err) => return Err(store_fault(err)),
        };

        if token.user_id != user_id {
            warn!(
                asserted = %user_id,
                owner = %token.user_id,
                "attempt to revoke a token owned by another user"
            );
            return Err(TokenError::OwnershipMismatch.into());
        }

        self.repository
            .revoke_family(token.token_family)
            .await
            .map_err(store_fault)?;

        Ok(())
    }

    /// Revokes every family owned by the user ("log out everywhere").
    ///
    /// # Returns
    ///
    /// The number of tokens newly revoked.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, DomainError> {
        self.repository.revoke_by_user(user_id).await.map_err(store_fault)
    }

    /// Verifies an access token and returns its claims.
    ///
    /// Pure signer delegation: never touches the store, so the per-request
    /// hot path is free of database contention.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, DomainError> {
        self.signer.verify(token)
    }

    /// Removes expired refresh tokens from storage. Advisory housekeeping;
    /// see [`TokenCleanupService`](super::TokenCleanupService) for the
    /// periodic sweep.
    pub async fn cleanup_expired(&self) -> Result<u64, DomainError> {
        self.repository.delete_expired().await.map_err(store_fault)
    }

    /// Revokes the family and reports the replay. The reuse signal is
    /// returned even if the revocation sweep itself fails: the caller must
    /// not be told anything softer than "re-authenticate".
    async fn handle_reuse(&self, token: &RefreshToken) -> Result<TokenPair, DomainError> {
        warn!(
            user_id = %token.user_id,
            family = %token.token_family,
            "refresh token replay detected, revoking family"
        );

        if let Err(err) = self.repository.revoke_family(token.token_family).await {
            error!(
                family = %token.token_family,
                error = %err,
                "failed to revoke token family after replay"
            );
        }

        Err(TokenError::TokenReuseDetected.into())
    }

    fn sign_access_token(&self, subject: &Subject) -> Result<String, DomainError> {
        let claims = Claims::new_access_token(
            subject,
            self.config.access_token_ttl(),
            &self.config.issuer,
            &self.config.audience,
        );
        self.signer.sign(&claims)
    }
}

/// Hashes a refresh secret for storage and lookup.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates an opaque refresh secret: 256 bits from the OS CSPRNG,
/// URL-safe base64 without padding.
fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Any store failure outside the modeled signals means issuance or rotation
/// cannot complete; surfaced uniformly so callers can retry or shed load.
fn store_fault(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound | StoreError::AlreadyConsumed => DomainError::Store(err),
        StoreError::Persistence { message } => {
            error!(error = %message, "token store unavailable");
            TokenError::StoreUnavailable.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let first = hash_token("secret-value");
        let second = hash_token("secret-value");
        let other = hash_token("different-value");

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_refresh_secret_entropy_and_encoding() {
        let first = generate_refresh_secret();
        let second = generate_refresh_secret();

        assert_ne!(first, second);
        // 32 bytes, base64 without padding
        assert_eq!(first.len(), 43);
        assert!(!first.contains('='));
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
