//! Host scheduling contract.

use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Schedules work relative to the host's UI update cycle.
pub trait Ticker: Send + Sync + 'static {
    /// Run `task` after the next UI update.
    fn next_tick(&self, task: Task);

    /// Run `task` after `delay`.
    fn after(&self, delay: Duration, task: Task);
}
