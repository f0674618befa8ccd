//! Tickers.
//!
//! [`FrameTicker`] queues work until the host drains it, which makes it
//! deterministic and suitable for tests and single-threaded hosts.
//! [`TokioTicker`] (feature `tokio`) runs work on a tokio runtime.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use waypoint_core::{Task, Ticker};

#[derive(Default)]
struct Frames {
    now: Duration,
    ticks: VecDeque<Task>,
    timers: Vec<Timer>,
    sequence: u64,
}

struct Timer {
    due: Duration,
    sequence: u64,
    task: Task,
}

/// A manually driven ticker with a virtual clock.
///
/// Clones share one queue.
#[derive(Clone, Default)]
pub struct FrameTicker {
    frames: Arc<Mutex<Frames>>,
}

impl FrameTicker {
    /// An empty ticker at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run queued tick tasks, including ones queued while running.
    /// Returns how many ran.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = self.lock().ticks.pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    /// Advance the clock by `by`, running due timers in order and flushing
    /// ticks after each. Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let mut ran = self.flush();
        let target = self.lock().now + by;
        loop {
            let timer = {
                let mut frames = self.lock();
                let next = frames
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.sequence))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => {
                        let timer = frames.timers.swap_remove(index);
                        frames.now = timer.due;
                        timer
                    }
                    None => {
                        frames.now = target;
                        break;
                    }
                }
            };
            (timer.task)();
            ran += 1 + self.flush();
        }
        ran
    }

    /// Tick tasks waiting for [`flush`](Self::flush).
    pub fn pending_ticks(&self) -> usize {
        self.lock().ticks.len()
    }

    /// Timers not yet due.
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Virtual time elapsed.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Frames> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Ticker for FrameTicker {
    fn next_tick(&self, task: Task) {
        self.lock().ticks.push_back(task);
    }

    fn after(&self, delay: Duration, task: Task) {
        let mut frames = self.lock();
        let due = frames.now + delay;
        frames.sequence += 1;
        let sequence = frames.sequence;
        frames.timers.push(Timer {
            due,
            sequence,
            task,
        });
    }
}

/// A ticker running tasks on a tokio runtime.
#[cfg(feature = "tokio")]
#[derive(Clone)]
pub struct TokioTicker {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioTicker {
    /// Use the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling task.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        tokio::runtime::Handle::try_current().map(Self::new)
    }
}

#[cfg(feature = "tokio")]
impl Ticker for TokioTicker {
    fn next_tick(&self, task: Task) {
        self.handle.spawn(async move {
            tokio::task::yield_now().await;
            task();
        });
    }

    fn after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
