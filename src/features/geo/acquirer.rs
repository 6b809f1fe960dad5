//! Position acquisition with a bounded wait.
//!
//! The acquirer asks a `PositionSource` for a single fresh fix. Every call
//! hits the source again (no cached fix may be replayed) and is bounded by a
//! hard timeout. Failure of any kind degrades to `Unavailable`; retrying is
//! the caller's decision.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::config::AcquirerConfig;
use crate::features::geo::coordinate::Coordinate;

/// Result of one acquisition attempt. Never an error: callers branch on
/// the content, not on success.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionFix {
    Fix(Coordinate),
    Unavailable,
}

impl PositionFix {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            PositionFix::Fix(coord) => Some(*coord),
            PositionFix::Unavailable => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("Position source request failed: {0}")]
    Request(String),

    #[error("Position source returned an invalid fix: {0}")]
    InvalidFix(String),
}

/// Seam to the platform location subsystem.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Obtain one fresh position. Implementations must not serve cached
    /// fixes and should request the highest accuracy the platform offers.
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// Station-mounted receiver exposing a JSON position endpoint.
pub struct HttpPositionSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PositionPayload {
    latitude: f64,
    longitude: f64,
}

impl HttpPositionSource {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        // max_age=0 forbids the receiver from replaying a stale fix
        let response = self
            .client
            .get(&self.url)
            .query(&[("accuracy", "high"), ("max_age", "0")])
            .send()
            .await
            .map_err(|e| PositionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PositionError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let payload: PositionPayload = response
            .json()
            .await
            .map_err(|e| PositionError::Request(e.to_string()))?;

        let coord = Coordinate::new(payload.latitude, payload.longitude);
        if !coord.is_valid() {
            return Err(PositionError::InvalidFix(format!(
                "{}, {}",
                payload.latitude, payload.longitude
            )));
        }

        Ok(coord)
    }
}

/// Acquires the current position with a hard timeout.
pub struct CoordinateAcquirer {
    source: Option<Arc<dyn PositionSource>>,
    timeout: Duration,
}

impl CoordinateAcquirer {
    pub fn new(source: Option<Arc<dyn PositionSource>>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn from_config(config: &AcquirerConfig) -> Self {
        let source: Option<Arc<dyn PositionSource>> = config
            .source_url
            .as_ref()
            .map(|url| Arc::new(HttpPositionSource::new(url.clone())) as Arc<dyn PositionSource>);

        Self::new(source, Duration::from_millis(config.timeout_ms))
    }

    /// One bounded acquisition attempt. No source, timeout, or source
    /// failure all degrade to `Unavailable`.
    pub async fn acquire(&self) -> PositionFix {
        let Some(source) = &self.source else {
            return PositionFix::Unavailable;
        };

        match tokio::time::timeout(self.timeout, source.current_position()).await {
            Ok(Ok(coord)) => PositionFix::Fix(coord),
            Ok(Err(e)) => {
                tracing::warn!("Position acquisition failed: {}", e);
                PositionFix::Unavailable
            }
            Err(_) => {
                tracing::warn!(
                    "Position acquisition timed out after {} ms",
                    self.timeout.as_millis()
                );
                PositionFix::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Coordinate);

    #[async_trait]
    impl PositionSource for StaticSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            Ok(self.0)
        }
    }

    struct StalledSource;

    #[async_trait]
    impl PositionSource for StalledSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            futures::future::pending().await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PositionSource for FailingSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            Err(PositionError::Request("receiver offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_acquire_returns_fix() {
        let coord = Coordinate::new(-6.2088, 106.8456);
        let acquirer = CoordinateAcquirer::new(
            Some(Arc::new(StaticSource(coord))),
            Duration::from_millis(100),
        );
        assert_eq!(acquirer.acquire().await, PositionFix::Fix(coord));
    }

    #[tokio::test]
    async fn test_acquire_times_out_to_unavailable() {
        let acquirer =
            CoordinateAcquirer::new(Some(Arc::new(StalledSource)), Duration::from_millis(20));
        assert_eq!(acquirer.acquire().await, PositionFix::Unavailable);
    }

    #[tokio::test]
    async fn test_acquire_absorbs_source_failure() {
        let acquirer =
            CoordinateAcquirer::new(Some(Arc::new(FailingSource)), Duration::from_millis(100));
        assert_eq!(acquirer.acquire().await, PositionFix::Unavailable);
    }

    #[tokio::test]
    async fn test_acquire_without_source_is_unavailable() {
        let acquirer = CoordinateAcquirer::new(None, Duration::from_millis(100));
        assert_eq!(acquirer.acquire().await, PositionFix::Unavailable);
    }
}
