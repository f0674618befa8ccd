//! Time-limited guards.

use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use waypoint_core::{BoxError, Guard, Next, Route};

/// Error returned when a guard takes too long.
#[derive(Error, Debug, Clone)]
#[error("navigation guard timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Fails the navigation when `inner` does not decide within `duration`.
pub struct TimeoutGuard<G> {
    inner: G,
    duration: Duration,
}

impl<G> TimeoutGuard<G> {
    /// Create a new timeout guard.
    pub fn new(inner: G, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

impl<G: Guard> Guard for TimeoutGuard<G> {
    async fn check(&self, to: &Route, from: &Route) -> Result<Next, BoxError> {
        match timeout(self.duration, self.inner.check(to, from)).await {
            Ok(verdict) => verdict,
            Err(_) => Err(Box::new(TimeoutError(self.duration))),
        }
    }
}
