use crate::models::User;
use crate::services::error::ServiceError;
use async_trait::async_trait;
use dashmap::DashMap;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn insert(&self, user: &User) -> Result<(), ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError>;
    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Users keyed by normalized email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    by_email: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), ServiceError> {
        match self.by_email.entry(user.email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ServiceError::UserAlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.by_email.get(email).map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .by_email
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.value().clone()))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
