//! Side channel for configuration warnings.

use std::sync::{Arc, Mutex, PoisonError};
use waypoint_core::ConfigWarning;

/// A shared sink for [`ConfigWarning`]s.
///
/// Warnings are kept for inspection and logged when the `tracing` feature
/// is enabled. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Arc<Mutex<Vec<ConfigWarning>>>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn report(&self, warning: ConfigWarning) {
        #[cfg(feature = "tracing")]
        tracing::warn!(%warning, "route configuration warning");
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    /// All warnings recorded so far.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all recorded warnings.
    pub fn drain(&self) -> Vec<ConfigWarning> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
