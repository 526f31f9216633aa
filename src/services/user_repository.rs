use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{AppError, AppResult};
use crate::models::{DbPool, User};

/// 用户凭据存储
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, username: &str) -> AppResult<Option<User>>;

    /// Fails with `BadRequest` when the username is taken.
    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<()>;

    /// Returns `false` when no such user exists.
    async fn update_password(&self, username: &str, password_hash: &str) -> AppResult<bool>;

    async fn count(&self) -> AppResult<i64>;
}

fn username_taken(username: &str) -> AppError {
    AppError::BadRequest(format!("Username '{}' is already registered", username))
}

pub struct MySqlUserRepository {
    pool: DbPool,
}

impl MySqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, created_at, updated_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(username_taken(username))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE username = ?")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(username)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// 未配置 `database.url` 时使用
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<()> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(username_taken(username)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                slot.insert(User {
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: now,
                    updated_at: now,
                });
                Ok(())
            }
        }
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> AppResult<bool> {
        match self.users.get_mut(username) {
            Some(mut user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.users.len() as i64)
    }
}
