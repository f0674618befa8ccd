//! Testing utilities for Waypoint.
//!
//! Helpers for exercising guards, components and navigations without a host
//! application.
//!
//! # Features
//!
//! - [`CallLog`]: An ordered log shared by several recorders
//! - [`RecordingGuard`]: A guard that records its calls and answers with a fixed [`Verdict`]
//! - [`Gate`]: Holds a [`RecordingGuard`] until opened, for overlapping navigations
//! - [`ScriptedGuard`]: A guard answering a sequence of verdicts
//! - [`TestComponent`] / [`TestInstance`]: A component with scripted guards and its instance

use futures::channel::oneshot;
use std::{
    any::Any,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use waypoint_core::{
    BoxError, Component, DynGuard, Guard, Instance, Next, RawLocation, Route,
};

pub use crate::{history::MemoryHistory, tick::FrameTicker};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Call Log
// ============================================================================

/// An ordered, shareable log of labels.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    /// All entries so far.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Forget all entries.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// An after hook appending `label` for every committed navigation.
    pub fn after_hook(
        &self,
        label: impl Into<String>,
    ) -> impl Fn(&Route, &Route) + Send + Sync + 'static {
        let log = self.clone();
        let label = label.into();
        move |_: &Route, _: &Route| log.record(label.clone())
    }
}

// ============================================================================
// Recording Guard
// ============================================================================

/// What a [`RecordingGuard`] answers.
#[derive(Debug, Clone, Default)]
pub enum Verdict {
    /// Let the navigation through.
    #[default]
    Continue,
    /// Abort it.
    Abort,
    /// Redirect it.
    Redirect(RawLocation),
    /// Fail with an error carrying this message.
    Fail(String),
    /// Continue and log `"<label>:entered"` once the instance is handed over.
    OnEnter,
}

/// Lets a gated [`RecordingGuard`] answer.
#[derive(Debug)]
pub struct Gate {
    sender: oneshot::Sender<()>,
}

impl Gate {
    /// Release the guard.
    pub fn open(self) {
        let _ = self.sender.send(());
    }
}

/// A guard that records every call in a [`CallLog`].
pub struct RecordingGuard {
    label: String,
    log: CallLog,
    verdict: Verdict,
    targets: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl RecordingGuard {
    /// A guard that logs `label` and continues.
    pub fn new(label: impl Into<String>, log: &CallLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
            verdict: Verdict::Continue,
            targets: Arc::default(),
            calls: Arc::default(),
            gate: Mutex::new(None),
        }
    }

    /// Answer with `verdict` instead.
    pub fn returning(mut self, verdict: Verdict) -> Self {
        self.verdict = verdict;
        self
    }

    /// Hold the first call until the returned gate opens.
    pub fn gated(self) -> (Self, Gate) {
        let (sender, receiver) = oneshot::channel();
        *lock(&self.gate) = Some(receiver);
        (self, Gate { sender })
    }

    /// A handle to the full paths this guard was asked about.
    pub fn targets(&self) -> Arc<Mutex<Vec<String>>> {
        self.targets.clone()
    }

    /// A handle to the call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Box as a guard object.
    pub fn boxed(self) -> Arc<dyn DynGuard> {
        Arc::new(self)
    }
}

impl Guard for RecordingGuard {
    async fn check(&self, to: &Route, _from: &Route) -> Result<Next, BoxError> {
        self.log.record(self.label.clone());
        lock(&self.targets).push(to.full_path().to_string());
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.gate).take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match &self.verdict {
            Verdict::Continue => Ok(Next::Continue),
            Verdict::Abort => Ok(Next::Abort),
            Verdict::Redirect(to) => Ok(Next::Redirect(to.clone())),
            Verdict::Fail(message) => Err(message.clone().into()),
            Verdict::OnEnter => {
                let log = self.log.clone();
                let label = self.label.clone();
                Ok(Next::on_enter(move |_| log.record(format!("{label}:entered"))))
            }
        }
    }
}

// ============================================================================
// Scripted Guard
// ============================================================================

/// A guard answering with a fixed sequence of verdicts, then continuing.
///
/// ```rust,ignore
/// // Abort the first navigation, redirect the second, allow the rest.
/// let guard = ScriptedGuard::new([Verdict::Abort, Verdict::Redirect("/login".into())]);
/// ```
pub struct ScriptedGuard {
    script: Mutex<std::collections::VecDeque<Verdict>>,
}

impl ScriptedGuard {
    /// Answer with `script`, one verdict per call.
    pub fn new(script: impl IntoIterator<Item = Verdict>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Verdicts not used yet.
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

impl Guard for ScriptedGuard {
    async fn check(&self, _to: &Route, _from: &Route) -> Result<Next, BoxError> {
        let verdict = lock(&self.script).pop_front().unwrap_or_default();
        match verdict {
            Verdict::Continue | Verdict::OnEnter => Ok(Next::Continue),
            Verdict::Abort => Ok(Next::Abort),
            Verdict::Redirect(to) => Ok(Next::Redirect(to)),
            Verdict::Fail(message) => Err(message.into()),
        }
    }
}

// ============================================================================
// Test Component
// ============================================================================

/// A component whose in-component guards are set by the test.
#[derive(Default, Clone)]
pub struct TestComponent {
    enter: Vec<Arc<dyn DynGuard>>,
    update: Vec<Arc<dyn DynGuard>>,
    leave: Vec<Arc<dyn DynGuard>>,
}

impl TestComponent {
    /// A component without guards.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enter guard.
    pub fn on_enter(mut self, guard: impl Guard) -> Self {
        self.enter.push(Arc::new(guard));
        self
    }

    /// Add an update guard.
    pub fn on_update(mut self, guard: impl Guard) -> Self {
        self.update.push(Arc::new(guard));
        self
    }

    /// Add a leave guard.
    pub fn on_leave(mut self, guard: impl Guard) -> Self {
        self.leave.push(Arc::new(guard));
        self
    }
}

impl Component for TestComponent {
    fn before_route_enter(&self) -> Vec<Arc<dyn DynGuard>> {
        self.enter.clone()
    }

    fn before_route_update(&self) -> Vec<Arc<dyn DynGuard>> {
        self.update.clone()
    }

    fn before_route_leave(&self) -> Vec<Arc<dyn DynGuard>> {
        self.leave.clone()
    }
}

// ============================================================================
// Test Instance
// ============================================================================

/// A mounted instance with a name and a destroy switch.
#[derive(Debug)]
pub struct TestInstance {
    name: String,
    destroyed: AtomicBool,
}

impl TestInstance {
    /// Create a live instance.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            destroyed: AtomicBool::new(false),
        })
    }

    /// The instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark the instance as being torn down.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

impl Instance for TestInstance {
    fn is_being_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_guard_logs_and_answers() {
        let log = CallLog::new();
        let guard = RecordingGuard::new("a", &log).returning(Verdict::Abort);
        let calls = guard.calls();
        let start = Route::start();

        let next = guard.check(&start, &start).await.unwrap();

        assert!(matches!(next, Next::Abort));
        assert_eq!(log.entries(), vec!["a"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gated_guard_waits_for_gate() {
        let log = CallLog::new();
        let (guard, gate) = RecordingGuard::new("g", &log).gated();
        let start = Route::start();

        let check = tokio::spawn(async move { guard.check(&start, &start).await.is_ok() });
        tokio::task::yield_now().await;
        gate.open();

        assert!(check.await.unwrap());
    }

    #[tokio::test]
    async fn scripted_guard_plays_its_script() {
        let guard = ScriptedGuard::new([Verdict::Abort, Verdict::Fail("nope".into())]);
        let start = Route::start();

        assert!(matches!(guard.check(&start, &start).await, Ok(Next::Abort)));
        assert!(guard.check(&start, &start).await.is_err());
        assert!(matches!(guard.check(&start, &start).await, Ok(Next::Continue)));
        assert_eq!(guard.remaining(), 0);
    }

    #[test]
    fn instance_destroy_flag() {
        let instance = TestInstance::new("home");
        assert!(!instance.is_being_destroyed());
        instance.destroy();
        assert!(instance.is_being_destroyed());
        assert_eq!(instance.name(), "home");
    }
}
