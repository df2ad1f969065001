use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::InfraError;
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::account::normalize_email,
};

/// Fixed-window limits on activation attempts.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one attempt for `ip` and, when known, for `email`.
    /// Err(AppError::RateLimited) once either window is exhausted.
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()>;
}

/// Atomic increment; the first hit of a window sets its TTL.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_email: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_email: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_email,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }

    async fn bump(&self, conn: &mut ConnectionManager, key: &str, limit: u64) -> AppResult<()> {
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(conn)
            .await
            .map_err(|e| AppError::Upstream(format!("rate limiter unavailable: {e}")))?;

        if current > limit {
            tracing::warn!(key, current, limit, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut conn = self.manager.clone();
        self.bump(&mut conn, &ip_key(ip), self.max_per_ip).await?;

        if let Some(email) = email {
            self.bump(&mut conn, &email_key(email), self.max_per_email)
                .await?;
        }
        Ok(())
    }
}

pub fn ip_key(ip: &str) -> String {
    format!("rate:activate:ip:{ip}")
}

pub fn email_key(email: &str) -> String {
    format!("rate:activate:email:{}", normalize_email(email))
}
