use std::sync::Arc;

use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, AuthUserDto, LoginRequestDto, SignupRequestDto};
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::services::TokenService;
use crate::modules::memstore::{MemStore, NewUser};

fn conflict() -> AppError {
    AppError::Conflict("User already exists".to_string())
}

/// Service for account signup, login and profile lookup
pub struct AuthService {
    store: Arc<MemStore>,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<MemStore>, token_service: Arc<TokenService>) -> Self {
        Self {
            store,
            token_service,
        }
    }

    /// Create an account. Email uniqueness is enforced here, not in
    /// `create_user`; the check and insert are atomic in the store.
    pub async fn signup(&self, dto: SignupRequestDto) -> Result<AuthResponseDto> {
        if self.store.get_user_by_email(&dto.email).await.is_some() {
            return Err(conflict());
        }

        let password = dto.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        let user = self
            .store
            .create_user_unless_email_exists(NewUser {
                email: dto.email,
                password_hash,
                name: dto.name,
            })
            .await
            .ok_or_else(conflict)?;

        info!("User registered: id={}", user.id);

        let token = self.token_service.issue(&user)?;
        Ok(AuthResponseDto::new(
            user.into(),
            token,
            self.token_service.expires_in(),
        ))
    }

    /// Exchange email and password for a session token
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .get_user_by_email(&dto.email)
            .await
            .ok_or_else(invalid)?;

        let password = dto.password;
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))??;

        if !valid {
            return Err(invalid());
        }

        info!("User logged in: id={}", user.id);

        let token = self.token_service.issue(&user)?;
        Ok(AuthResponseDto::new(
            user.into(),
            token,
            self.token_service.expires_in(),
        ))
    }

    /// Profile of the authenticated caller
    pub async fn me(&self, user_id: i64) -> Result<AuthUserDto> {
        self.store
            .get_user(user_id)
            .await
            .map(AuthUserDto::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use std::time::Duration;

    fn service() -> Arc<AuthService> {
        let tokens = TokenService::new(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry: Duration::from_secs(3600),
        });
        Arc::new(AuthService::new(
            Arc::new(MemStore::new()),
            Arc::new(tokens),
        ))
    }

    fn signup_dto(email: &str) -> SignupRequestDto {
        SignupRequestDto {
            email: email.to_string(),
            password: "password123".to_string(),
            name: "Test User".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_signups_for_one_email_register_once() {
        let service = service();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.signup(signup_dto("dup@b.com")).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 3);
        assert!(service.store.get_user(2).await.is_none());
    }
}
