//! In-memory rate limiter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    infra::rate_limit::{RateLimiterTrait, email_key, ip_key},
};

/// Counts attempts without windows; limits apply for the lifetime of the mock.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
    max_per_email: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64, max_per_email: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
            max_per_email,
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str, email: Option<&str>) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();

        let ip_count = counts.entry(ip_key(ip)).or_insert(0);
        *ip_count += 1;
        if *ip_count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }

        if let Some(email) = email {
            let email_count = counts.entry(email_key(email)).or_insert(0);
            *email_count += 1;
            if *email_count > self.max_per_email {
                return Err(AppError::RateLimited);
            }
        }
        Ok(())
    }
}
