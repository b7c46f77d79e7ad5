//! MySQL implementation of the TokenRepository trait.
//!
//! Refresh-token persistence with SQLx. Every state transition is a
//! conditional update evaluated by MySQL itself: two service instances
//! racing to consume the same token cannot both win, because the
//! `used_at IS NULL` filter admits exactly one writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use kl_core::domain::entities::token::RefreshToken;
use kl_core::errors::StoreError;
use kl_core::repositories::TokenRepository;

const SELECT_COLUMNS: &str =
    "id, user_id, token_hash, token_family, created_at, expires_at, used_at, revoked_at";

/// MySQL implementation of TokenRepository.
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository.
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to a RefreshToken entity.
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<RefreshToken, StoreError> {
        let id: String = row.try_get("id").map_err(StoreError::persistence)?;
        let user_id: String = row.try_get("user_id").map_err(StoreError::persistence)?;
        let token_family: String = row.try_get("token_family").map_err(StoreError::persistence)?;

        Ok(RefreshToken {
            id: Uuid::parse_str(&id).map_err(StoreError::persistence)?,
            user_id: Uuid::parse_str(&user_id).map_err(StoreError::persistence)?,
            token_hash: row.try_get("token_hash").map_err(StoreError::persistence)?,
            token_family: Uuid::parse_str(&token_family).map_err(StoreError::persistence)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(StoreError::persistence)?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(StoreError::persistence)?,
            used_at: row
                .try_get::<Option<DateTime<Utc>>, _>("used_at")
                .map_err(StoreError::persistence)?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(StoreError::persistence)?,
        })
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, StoreError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, user_id, token_hash, token_family, created_at, expires_at, used_at, revoked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(token.id.to_string())
            .bind(token.user_id.to_string())
            .bind(&token.token_hash)
            .bind(token.token_family.to_string())
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.used_at)
            .bind(token.revoked_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // A hash collision trips the unique index; surfaced as an
                // integrity fault, never as a business signal.
                if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                    StoreError::persistence("duplicate token hash")
                } else {
                    StoreError::persistence(e)
                }
            })?;

        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<RefreshToken, StoreError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE token_hash = ? LIMIT 1"
        );

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)?
            .ok_or(StoreError::NotFound)?;

        Self::row_to_token(&row)
    }

    async fn find_by_family(&self, token_family: Uuid) -> Result<Vec<RefreshToken>, StoreError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE token_family = ? ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .bind(token_family.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), StoreError> {
        // The single-use invariant lives in this filter; it must be
        // evaluated by the database, not read-then-written by the
        // application.
        let query = "UPDATE refresh_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL";

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyConsumed);
        }

        Ok(())
    }

    async fn revoke_family(&self, token_family: Uuid) -> Result<u64, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked_at = ?
            WHERE token_family = ? AND revoked_at IS NULL
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(token_family.to_string())
            .execute(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        Ok(result.rows_affected())
    }

    async fn revoke_by_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked_at = ?
            WHERE user_id = ? AND revoked_at IS NULL
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let query = "DELETE FROM refresh_tokens WHERE expires_at < ?";

        let result = sqlx::query(query)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(StoreError::persistence)?;

        Ok(result.rows_affected())
    }
}
