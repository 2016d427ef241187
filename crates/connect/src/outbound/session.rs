use app_core::error::AppError;
use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::{RedisConnectionManager, bb8};
use serde::{Deserialize, Serialize};

/// What is remembered about a login session, keyed by its refresh token id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: i64,
    /// The authentication backend that established the session.
    pub backend: String,
}

/// Repository interface for login sessions.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SessionRepository: Send + Sync {
    /// Whitelists the refresh token `jti` for `exp_secs` seconds.
    ///
    /// # Arguments
    ///
    /// * `jti` - The unique token identifier.
    /// * `user_id` - The user the session belongs to.
    /// * `backend` - The authentication backend that logged the user in.
    /// * `exp_secs` - Expiration time in seconds.
    async fn add_session(&self, jti: &str, user_id: i64, backend: &str, exp_secs: u64) -> Result<(), AppError>;
}

/// Redis-backed implementation of [`SessionRepository`].
pub struct SessionRedis {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl SessionRedis {
    pub fn new(pool: bb8::Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

fn session_key(jti: &str) -> String {
    format!("session:{jti}")
}

#[async_trait]
impl SessionRepository for SessionRedis {
    async fn add_session(&self, jti: &str, user_id: i64, backend: &str, exp_secs: u64) -> Result<(), AppError> {
        let record = serde_json::to_string(&SessionRecord { user_id, backend: backend.to_string() })?;

        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(session_key(jti), record, exp_secs).await?;
        Ok(())
    }
}
