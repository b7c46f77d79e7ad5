//! MySQL implementation of the UserDirectory trait.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use kl_core::domain::value_objects::Subject;
use kl_core::errors::StoreError;
use kl_core::repositories::UserDirectory;

/// MySQL-backed subject lookup for rotation.
///
/// Reads the principal's current email, display name, and roles so rotated
/// access tokens never carry stale claim material.
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    /// Create a new MySQL user directory.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_subject(&self, user_id: Uuid) -> Result<Option<Subject>, StoreError> {
        let query = "SELECT id, email, display_name, roles FROM users WHERE id = ? LIMIT 1";

        let row = match sqlx::query(query)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)?
        {
            Some(row) => row,
            None => return Ok(None),
        };

        let id: String = row.try_get("id").map_err(StoreError::persistence)?;
        let roles: Option<String> = row.try_get("roles").map_err(StoreError::persistence)?;

        Ok(Some(Subject {
            user_id: Uuid::parse_str(&id).map_err(StoreError::persistence)?,
            email: row.try_get("email").map_err(StoreError::persistence)?,
            display_name: row.try_get("display_name").map_err(StoreError::persistence)?,
            roles: parse_roles(roles)?,
        }))
    }
}

/// Decode the JSON roles column. NULL means no roles; anything other than a
/// JSON array of strings is an integrity fault.
fn parse_roles(raw: Option<String>) -> Result<Vec<String>, StoreError> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::persistence(format!("malformed roles column: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles_null_is_empty() {
        assert!(parse_roles(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_roles_array() {
        let roles = parse_roles(Some(r#"["admin","auditor"]"#.to_string())).unwrap();
        assert_eq!(roles, vec!["admin".to_string(), "auditor".to_string()]);
    }

    #[test]
    fn test_parse_roles_rejects_non_string_entries() {
        let err = parse_roles(Some(r#"["admin",7]"#.to_string())).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }

    #[test]
    fn test_parse_roles_rejects_non_array() {
        assert!(parse_roles(Some(r#"{"admin":true}"#.to_string())).is_err());
    }
}
