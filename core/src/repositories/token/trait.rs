//! Token repository trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::StoreError;

/// Repository trait for RefreshToken persistence operations.
///
/// Implementations own uniqueness, indexing, and the atomic state
/// transitions of refresh-token rows. The store never interprets business
/// state (expiry, revocation); it returns rows as stored and the service
/// enforces the rules. Cancellation is carried by the async runtime:
/// dropping a returned future aborts the in-flight operation.
///
/// # Security Considerations
/// - Only token hashes are persisted, never the raw secret
/// - `mark_used` must be evaluated by the persistence engine itself, not as
///   an application-level read-then-write, so that exactly one of any number
///   of concurrent callers wins
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Insert a new refresh token record.
    ///
    /// # Arguments
    /// * `token` - The record to persist, fully constructed by the caller
    ///
    /// # Returns
    /// * `Ok(RefreshToken)` - The stored record
    /// * `Err(StoreError::Persistence)` - Constraint violation (including a
    ///   token-hash collision, a fatal integrity fault) or connectivity loss
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, StoreError>;

    /// Point lookup by token hash.
    ///
    /// # Returns
    /// * `Ok(RefreshToken)` - The row as stored, regardless of its state
    /// * `Err(StoreError::NotFound)` - No row with this hash
    async fn find_by_hash(&self, token_hash: &str) -> Result<RefreshToken, StoreError>;

    /// All rows in a family, most recent first. Audit/inspection only,
    /// never on the rotation hot path.
    async fn find_by_family(&self, token_family: Uuid) -> Result<Vec<RefreshToken>, StoreError>;

    /// Atomically transition a row from "not used" to "used".
    ///
    /// The update is filtered to rows whose `used_at` is still null; zero
    /// rows affected reports `StoreError::AlreadyConsumed` rather than
    /// silently succeeding, because the caller uses that signal to detect
    /// replay. Safe under concurrent callers racing on the same id: exactly
    /// one wins.
    async fn mark_used(&self, id: Uuid) -> Result<(), StoreError>;

    /// Revoke every currently-unrevoked row sharing the family.
    /// Idempotent; re-invocation revokes nothing new.
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of rows newly revoked
    async fn revoke_family(&self, token_family: Uuid) -> Result<u64, StoreError>;

    /// Revoke every currently-unrevoked row owned by the user, across all
    /// families. Used for logout-everywhere.
    async fn revoke_by_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Bulk-delete rows past their expiry. Advisory housekeeping, not
    /// correctness-critical.
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of rows deleted
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}
