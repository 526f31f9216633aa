use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::AuthenticatedUser;

#[derive(Debug, Clone)]
struct Session {
    username: String,
    expires_at: DateTime<Utc>,
}

/// Opaque bearer tokens held in memory. Tokens do not survive a restart.
pub struct TokenService {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        let token = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        self.sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    pub fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(AuthenticatedUser {
            username: session.username,
        })
    }

    /// 撤销某个用户的全部令牌，返回撤销数量
    pub fn revoke_user(&self, username: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.username != username);
        before.saturating_sub(self.sessions.len())
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    fn expire_now(&self, token: &str) {
        if let Some(mut session) = self.sessions.get_mut(token) {
            session.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}
