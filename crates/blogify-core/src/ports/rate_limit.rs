//! Request throttling port.

use async_trait::async_trait;
use std::time::Duration;

/// Throttles requests per client key; the server keys auth routes by caller IP.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `key` and report whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left before the key is throttled.
    pub remaining: u32,
    /// Wait before the next accepted request when throttled, the window otherwise.
    pub retry_after: Duration,
}

impl RateLimitResult {
    /// `retry_after` in whole seconds, never less than one.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.as_secs().max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limiter unavailable: {0}")]
    Unavailable(String),
}
