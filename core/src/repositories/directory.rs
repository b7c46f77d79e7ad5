//! User directory trait resolving a user id to its current claim material.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::Subject;
use crate::errors::StoreError;

/// Resolves the owning principal of a refresh token at rotation time.
///
/// The refresh-token row stores only the owner's id; the subject material
/// signed into the rotated access token (email, display name, roles) is
/// re-read through this trait so it reflects the principal's current state,
/// not a snapshot taken at issuance.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the subject for a user id.
    ///
    /// # Returns
    /// * `Ok(Some(Subject))` - The principal exists
    /// * `Ok(None)` - No such principal (e.g. deleted since issuance)
    /// * `Err(StoreError)` - Directory unreachable
    async fn find_subject(&self, user_id: Uuid) -> Result<Option<Subject>, StoreError>;
}

/// In-memory directory for testing. Clones share the same subject map.
#[cfg(test)]
#[derive(Clone)]
pub struct MockUserDirectory {
    subjects: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<Uuid, Subject>>>,
}

#[cfg(test)]
impl MockUserDirectory {
    pub fn new() -> Self {
        Self {
            subjects: std::sync::Arc::new(tokio::sync::RwLock::new(std::collections::HashMap::new())),
        }
    }

    pub async fn insert(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.user_id, subject);
    }

    pub async fn remove(&self, user_id: Uuid) {
        self.subjects.write().await.remove(&user_id);
    }
}

#[cfg(test)]
impl Default for MockUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_subject(&self, user_id: Uuid) -> Result<Option<Subject>, StoreError> {
        Ok(self.subjects.read().await.get(&user_id).cloned())
    }
}
