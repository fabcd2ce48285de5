use crate::domain::value_objects::UserId;
use crate::ports::user_directory::{Result, UserDirectory as UserDirectoryTrait, UserSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock implementation of UserDirectory
///
/// Supports stateful testing by storing user summaries.
/// Registered users both exist and resolve; everyone else is unknown.
pub struct UserDirectory {
    users: Mutex<HashMap<UserId, UserSummary>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Add a user for testing purposes
    pub fn add_user(&self, user_id: UserId) {
        self.add_user_named(user_id, "Mock User");
    }

    /// Add a user with an explicit display name
    pub fn add_user_named(&self, user_id: UserId, name: &str) {
        self.users.lock().unwrap().insert(
            user_id,
            UserSummary {
                user_id,
                name: name.to_string(),
            },
        );
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectoryTrait for UserDirectory {
    /// Check if user exists among the registered users
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains_key(&user_id))
    }

    /// Resolve a registered user to its summary
    async fn resolve(&self, user_id: UserId) -> Result<Option<UserSummary>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}
