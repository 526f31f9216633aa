use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};
use crate::services::{TokenService, UserRepository};

const BAD_CREDENTIALS: &str = "Incorrect username or password";

/// 注册、登录与重置密码
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { repository, tokens }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        let hash = hash_password_blocking(password).await?;
        self.repository.insert(username, &hash).await?;
        tracing::info!(username = %username, "user registered");
        Ok(())
    }

    /// Returns a fresh bearer token.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let user = self
            .repository
            .find(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        if !verify_password_blocking(password, &user.password_hash).await? {
            tracing::warn!(username = %username, "login rejected");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        Ok(self.tokens.issue(&user.username))
    }

    pub async fn reset_password(&self, username: &str, new_password: &str) -> AppResult<()> {
        let hash = hash_password_blocking(new_password).await?;
        if !self.repository.update_password(username, &hash).await? {
            return Err(AppError::NotFound(format!("User '{}' not found", username)));
        }
        let revoked = self.tokens.revoke_user(username);
        tracing::info!(username = %username, revoked, "password reset");
        Ok(())
    }

    /// 用户表为空时创建初始管理员，否则 `/register`（需要令牌）无从调用
    pub async fn ensure_bootstrap_user(&self, auth: &AuthSettings) -> AppResult<bool> {
        let (Some(username), Some(password)) = (&auth.bootstrap_username, &auth.bootstrap_password)
        else {
            if self.repository.count().await? == 0 {
                tracing::warn!("user store is empty and auth.bootstrap_password is not set");
            }
            return Ok(false);
        };
        if self.repository.count().await? > 0 {
            return Ok(false);
        }
        self.register(username, password).await?;
        tracing::warn!(username = %username, "bootstrap user created, change its password");
        Ok(true)
    }
}

/// Argon2 runs on the blocking pool
async fn hash_password_blocking(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_password_blocking(password: &str, stored_hash: &str) -> AppResult<bool> {
    let (password, stored_hash) = (password.to_string(), stored_hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Hashing error: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Invalid stored hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
