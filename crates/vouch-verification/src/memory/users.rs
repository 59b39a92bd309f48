use crate::model::{NewUser, User};
use crate::repository::{CollaboratorError, UserDirectory};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use vouch_core::{AppId, UserId};

/// User directory keyed by `(app, identifier)`.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<(AppId, String), User>>,
    fail_creates: AtomicBool,
}

impl InMemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing user.
    pub fn insert(&self, app_id: AppId, identifier: &str, display_name: &str) -> User {
        let user = User {
            id: UserId::new(),
            app_id,
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            credential_hash: String::new(),
            created_at: Utc::now(),
        };
        self.users
            .lock()
            .insert((app_id, identifier.to_string()), user.clone());
        user
    }

    /// Make `create_implicit` fail.
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_identifier(
        &self,
        app_id: AppId,
        identifier: &str,
    ) -> Result<Option<User>, CollaboratorError> {
        Ok(self
            .users
            .lock()
            .get(&(app_id, identifier.to_string()))
            .cloned())
    }

    async fn create_implicit(&self, new_user: NewUser) -> Result<User, CollaboratorError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable(
                "user directory offline".to_string(),
            ));
        }

        let mut users = self.users.lock();
        let key = (new_user.app_id, new_user.identifier.clone());
        // Two verifications racing for the same new identifier share one account.
        if let Some(existing) = users.get(&key) {
            return Ok(existing.clone());
        }

        let user = User {
            id: UserId::new(),
            app_id: new_user.app_id,
            identifier: new_user.identifier,
            display_name: new_user.display_name,
            credential_hash: new_user.credential_hash,
            created_at: Utc::now(),
        };
        users.insert(key, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_users_are_scoped_by_app() {
        let directory = InMemoryUserDirectory::new();
        let app = AppId::new();
        directory.insert(app, "a@b.com", "a");

        assert!(directory
            .find_by_identifier(app, "a@b.com")
            .await
            .unwrap()
            .is_some());
        assert!(directory
            .find_by_identifier(AppId::new(), "a@b.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_implicit_is_idempotent() {
        let directory = InMemoryUserDirectory::new();
        let app = AppId::new();
        let new_user = NewUser {
            app_id: app,
            identifier: "new@b.com".to_string(),
            display_name: "new".to_string(),
            credential_hash: "digest".to_string(),
        };

        let first = directory.create_implicit(new_user.clone()).await.unwrap();
        let second = directory.create_implicit(new_user).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure() {
        let directory = InMemoryUserDirectory::new();
        directory.set_fail_creates(true);
        let result = directory
            .create_implicit(NewUser {
                app_id: AppId::new(),
                identifier: "x@b.com".to_string(),
                display_name: "x".to_string(),
                credential_hash: String::new(),
            })
            .await;
        assert!(result.is_err());
    }
}
