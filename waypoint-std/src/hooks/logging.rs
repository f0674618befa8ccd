//! Navigation logging.

use waypoint_core::{AfterHook, BoxError, Guard, Next, Route};

/// A before hook that logs every navigation attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingGuard;

impl Guard for LoggingGuard {
    async fn check(&self, to: &Route, from: &Route) -> Result<Next, BoxError> {
        #[cfg(feature = "tracing")]
        {
            tracing::info!(from = %from.full_path(), to = %to.full_path(), "navigating");
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = (to, from);
        }
        Ok(Next::Continue)
    }
}

/// An after hook that logs every committed navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAfterHook;

impl AfterHook for LoggingAfterHook {
    fn after(&self, to: &Route, from: &Route) {
        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                from = %from.full_path(),
                to = %to.full_path(),
                name = to.name().unwrap_or_default(),
                "navigated"
            );
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = (to, from);
        }
    }
}
