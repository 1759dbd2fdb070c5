use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

const USER_CACHE_TTL: u64 = 300; // 5 minutes
const CONVERSATION_WINDOW_TTL: u64 = 3600; // 1 hour; stale windows expire on their own

pub struct CacheService;

impl CacheService {
    /// Cache user data by user ID
    pub async fn cache_user<T: Serialize>(
        redis: &mut ConnectionManager,
        user_id: &str,
        user_data: &T,
    ) -> Result<(), redis::RedisError> {
        let key = format!("user:{}", user_id);
        let value = serde_json::to_string(user_data).unwrap_or_default();
        redis.set_ex(key, value, USER_CACHE_TTL).await
    }

    /// Get cached user data
    pub async fn get_user<T: for<'de> Deserialize<'de>>(
        redis: &mut ConnectionManager,
        user_id: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        let key = format!("user:{}", user_id);
        let value: Option<String> = redis.get(key).await?;
        Ok(value.and_then(|v| serde_json::from_str(&v).ok()))
    }

    /// Invalidate user cache
    pub async fn invalidate_user(
        redis: &mut ConnectionManager,
        user_id: &str,
    ) -> Result<(), redis::RedisError> {
        let key = format!("user:{}", user_id);
        redis.del(key).await
    }

    /// Record the start of a user's chat conversation window. The marker
    /// survives page reloads; it is cleared when the window is analyzed or
    /// the chat list is reset.
    pub async fn mark_conversation_start(
        redis: &mut ConnectionManager,
        user_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), redis::RedisError> {
        let key = format!("conversation:{}", user_id);
        redis
            .set_ex(key, started_at.to_rfc3339(), CONVERSATION_WINDOW_TTL)
            .await
    }

    /// When the active conversation window started, if any.
    pub async fn conversation_started_at(
        redis: &mut ConnectionManager,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, redis::RedisError> {
        let key = format!("conversation:{}", user_id);
        let value: Option<String> = redis.get(key).await?;
        Ok(value
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Close the active conversation window.
    pub async fn clear_conversation(
        redis: &mut ConnectionManager,
        user_id: &str,
    ) -> Result<(), redis::RedisError> {
        let key = format!("conversation:{}", user_id);
        redis.del(key).await
    }
}
