//! The claim material describing an authenticated principal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated principal as carried inside access-token claims.
///
/// Issuance receives a `Subject` from the caller (which has just
/// authenticated the user); rotation re-reads it through the
/// [`UserDirectory`](crate::repositories::UserDirectory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Owning principal
    pub user_id: Uuid,

    /// Subject email
    pub email: String,

    /// Subject display name
    pub display_name: String,

    /// Authorization roles; empty means no elevated capabilities
    pub roles: Vec<String>,
}

impl Subject {
    /// Creates a subject with no roles.
    pub fn new(user_id: Uuid, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
            roles: Vec::new(),
        }
    }

    /// Adds roles to the subject.
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Checks whether the subject carries the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_roles() {
        let subject = Subject::new(Uuid::new_v4(), "dev@example.com", "Dev")
            .with_roles(vec!["admin".to_string()]);

        assert!(subject.has_role("admin"));
        assert!(!subject.has_role("auditor"));
    }

    #[test]
    fn test_subject_without_roles() {
        let subject = Subject::new(Uuid::new_v4(), "dev@example.com", "Dev");
        assert!(subject.roles.is_empty());
    }
}
