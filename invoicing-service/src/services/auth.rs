//! Account registration and login.

use crate::models::User;
use crate::services::error::ServiceError;
use crate::services::jwt::JwtService;
use crate::services::users::UserRepository;
use crate::utils::password::{hash_password, verify_password, Password};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &Password,
    ) -> Result<User, ServiceError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user = User::new(name.trim().to_string(), email, password_hash);
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &Password) -> Result<Session, ServiceError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.jwt.generate_access_token(&user.id, &user.email)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(Session { token, user })
    }

    pub async fn current_user(&self, user_id: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.users.health_check().await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::users::InMemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            JwtService::new(&JwtConfig {
                secret: "test-secret".to_string(),
                expiry_hours: 24,
            }),
        )
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        let password = Password::new("password123");
        let user = auth
            .register("Asha", "Asha@Example.com ", &password)
            .await
            .unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert_ne!(user.password_hash, "password123");

        let session = auth.login("asha@example.com", &password).await.unwrap();
        let claims = auth.jwt().validate_access_token(&session.token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service();
        let password = Password::new("password123");
        auth.register("Asha", "asha@example.com", &password)
            .await
            .unwrap();
        let err = auth
            .register("Other", "ASHA@example.com", &password)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let auth = service();
        auth.register("Asha", "asha@example.com", &Password::new("password123"))
            .await
            .unwrap();

        let wrong = auth
            .login("asha@example.com", &Password::new("nope"))
            .await
            .unwrap_err();
        let unknown = auth
            .login("nobody@example.com", &Password::new("password123"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
        assert!(matches!(unknown, ServiceError::InvalidCredentials));
    }
}
