//! User lookup by phone number.

use async_trait::async_trait;
use dashmap::DashMap;

use courier_core::error::AppError;
use courier_entity::user::User;

/// Resolves users for the login flow.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Returns the user owning `phone_number`, creating one if absent.
    async fn find_or_create_by_phone(&self, phone_number: &str) -> Result<User, AppError>;
}

/// A [`UserDirectory`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    by_phone: DashMap<String, User>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.by_phone.len()
    }

    /// Returns `true` when no user exists yet.
    pub fn is_empty(&self) -> bool {
        self.by_phone.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_or_create_by_phone(&self, phone_number: &str) -> Result<User, AppError> {
        let user = self
            .by_phone
            .entry(phone_number.to_string())
            .or_insert_with(|| {
                let user = User::new(phone_number);
                tracing::info!(user_id = %user.id, "User created");
                user
            })
            .clone();
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_phone_resolves_same_user() {
        let directory = MemoryUserDirectory::new();
        let first = directory.find_or_create_by_phone("+15550001111").await.unwrap();
        let second = directory.find_or_create_by_phone("+15550001111").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(directory.len(), 1);
        assert_eq!(second.phone_number, "+15550001111");
    }
}
