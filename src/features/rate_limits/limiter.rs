//! Injected rate limiting for submission traffic.
//!
//! Call sites depend on the [`RateLimiter`] trait only, so the in-memory
//! sliding window below can be swapped for a distributed store without
//! touching them.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::config::RateLimitConfig;

/// Map sweep threshold: idle keys are evicted once the map grows past this
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct LimitExceeded {
    pub retry_after: Duration,
}

impl std::fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Submission limit reached, retry in {} s",
            self.retry_after.as_secs().max(1)
        )
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one request for `key`, rejecting it when the key has
    /// exhausted its budget for the current window.
    async fn check(&self, key: &str) -> Result<(), LimitExceeded>;
}

/// Sliding-window limiter keyed by caller identity.
///
/// Each key holds the timestamps of its requests inside the window;
/// expired stamps are evicted on that key's next check, and idle keys are
/// swept once the map grows past a threshold.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: u32,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Duration::from_secs(config.window_secs),
            config.max_submissions,
        )
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, key: &str) -> Result<(), LimitExceeded> {
        let now = Instant::now();
        let mut hits = self.hits.lock().await;

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, stamps| {
                stamps.back().is_some_and(|last| now.duration_since(*last) < window)
            });
        }

        let stamps = hits.entry(key.to_string()).or_default();
        while let Some(front) = stamps.front() {
            if now.duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.max_requests as usize {
            let oldest = *stamps.front().expect("non-empty at capacity");
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            tracing::warn!("Rate limit hit for '{}'", key);
            return Err(LimitExceeded { retry_after });
        }

        stamps.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 3);
        for _ in 0..3 {
            assert!(limiter.check("worker-1").await.is_ok());
        }
        assert!(limiter.check("worker-1").await.is_err());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.check("worker-1").await.is_ok());
        assert!(limiter.check("worker-2").await.is_ok());
        assert!(limiter.check("worker-1").await.is_err());
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(30), 1);
        assert!(limiter.check("worker-1").await.is_ok());
        assert!(limiter.check("worker-1").await.is_err());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.check("worker-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_reports_retry_after() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        limiter.check("worker-1").await.unwrap();
        let err = limiter.check("worker-1").await.unwrap_err();
        assert!(err.retry_after <= Duration::from_secs(60));
        assert!(err.to_string().contains("retry in"));
    }
}
