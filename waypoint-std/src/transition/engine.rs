//! The transition state machine.

use super::queue::{
    Step, before_enter_guards, enter_guards, leave_guards, resolve_components, resolve_queue,
    update_guards,
};
use crate::{
    instances::InstanceRegistry,
    matcher::Matcher,
    registry::{HookHandle, HookList},
};
use futures::future::BoxFuture;
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use waypoint_core::{
    AfterHook, DynGuard, EnterCallback, FailureKind, Guard, History, NavigationError,
    NavigationFailure, Next, PopFuture, PopListener, RawLocation, RecordId, Route, Ticker,
    is_same_route,
};

/// How often an enter callback checks whether its instance is mounted.
pub const ENTER_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Called once with the first committed route.
pub type ReadyCallback = Box<dyn FnOnce(&Route) + Send>;

/// Called once if the first navigation fails.
pub type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError) + Send>;

/// Observer of guard and resolver errors.
pub type ErrorObserver = dyn Fn(&NavigationError) + Send + Sync;

/// Observer of committed routes.
pub type RouteListener = dyn Fn(&Route) + Send + Sync;

/// What to do with the history once a navigation commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrlUpdate {
    /// Add an entry.
    Push,
    /// Replace the current entry.
    Replace,
    /// Leave the history alone; it already shows the target.
    #[default]
    None,
}

struct State {
    current: Route,
    pending: Option<(u64, Route)>,
}

#[derive(Default)]
struct Readiness {
    ready: bool,
    on_ready: Vec<ReadyCallback>,
    on_error: Vec<ReadyErrorCallback>,
}

struct PendingEnter {
    record: RecordId,
    slot: String,
    callback: EnterCallback,
}

enum Abort {
    Error(NavigationError),
    Redirect {
        failure: NavigationFailure,
        to: RawLocation,
    },
}

impl From<NavigationFailure> for Abort {
    fn from(failure: NavigationFailure) -> Self {
        Abort::Error(failure.into())
    }
}

struct Inner {
    matcher: Arc<Matcher>,
    history: Arc<dyn History>,
    ticker: Arc<dyn Ticker>,
    instances: InstanceRegistry,
    before_hooks: Arc<HookList<dyn DynGuard>>,
    resolve_hooks: Arc<HookList<dyn DynGuard>>,
    after_hooks: Arc<HookList<dyn AfterHook>>,
    error_observers: Arc<HookList<ErrorObserver>>,
    listeners: Arc<HookList<RouteListener>>,
    state: Mutex<State>,
    readiness: Mutex<Readiness>,
    next_id: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn readiness(&self) -> MutexGuard<'_, Readiness> {
        self.readiness.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> Route {
        self.state().current.clone()
    }
}

/// Drives navigations: resolution, guards, commit and history updates.
///
/// Clones share one engine.
#[derive(Clone)]
pub struct TransitionEngine {
    inner: Arc<Inner>,
}

impl TransitionEngine {
    /// Create an engine starting at [`Route::start`].
    pub fn new(matcher: Arc<Matcher>, history: Arc<dyn History>, ticker: Arc<dyn Ticker>) -> Self {
        Self {
            inner: Arc::new(Inner {
                matcher,
                history,
                ticker,
                instances: InstanceRegistry::new(),
                before_hooks: HookList::new(),
                resolve_hooks: HookList::new(),
                after_hooks: HookList::new(),
                error_observers: HookList::new(),
                listeners: HookList::new(),
                state: Mutex::new(State {
                    current: Route::start(),
                    pending: None,
                }),
                readiness: Mutex::new(Readiness::default()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// The matcher.
    pub fn matcher(&self) -> &Arc<Matcher> {
        &self.inner.matcher
    }

    /// The history backend.
    pub fn history(&self) -> &Arc<dyn History> {
        &self.inner.history
    }

    /// The ticker.
    pub fn ticker(&self) -> &Arc<dyn Ticker> {
        &self.inner.ticker
    }

    /// Mounted component instances.
    pub fn instances(&self) -> &InstanceRegistry {
        &self.inner.instances
    }

    /// The last committed route.
    pub fn current(&self) -> Route {
        self.inner.current()
    }

    /// The route being navigated to, if any.
    pub fn pending(&self) -> Option<Route> {
        self.inner.state().pending.as_ref().map(|(_, route)| route.clone())
    }

    /// Whether the first navigation has finished.
    pub fn is_ready(&self) -> bool {
        self.inner.readiness().ready
    }

    /// Run `guard` before every navigation, after leave guards.
    pub fn before_each(&self, guard: impl Guard) -> HookHandle {
        let guard: Arc<dyn DynGuard> = Arc::new(guard);
        self.inner.before_hooks.register(guard)
    }

    /// Run `guard` after all other guards and component loading.
    pub fn before_resolve(&self, guard: impl Guard) -> HookHandle {
        let guard: Arc<dyn DynGuard> = Arc::new(guard);
        self.inner.resolve_hooks.register(guard)
    }

    /// Call `hook` after every committed navigation.
    pub fn after_each(&self, hook: impl AfterHook) -> HookHandle {
        let hook: Arc<dyn AfterHook> = Arc::new(hook);
        self.inner.after_hooks.register(hook)
    }

    /// Observe guard and resolver errors.
    ///
    /// Navigation failures (duplicate, cancelled, aborted, redirected) are
    /// not errors and are never reported here.
    pub fn on_error(
        &self,
        observer: impl Fn(&NavigationError) + Send + Sync + 'static,
    ) -> HookHandle {
        let observer: Arc<ErrorObserver> = Arc::new(observer);
        self.inner.error_observers.register(observer)
    }

    /// Call `listener` with every committed route.
    pub fn listen(&self, listener: impl Fn(&Route) + Send + Sync + 'static) -> HookHandle {
        let listener: Arc<RouteListener> = Arc::new(listener);
        self.inner.listeners.register(listener)
    }

    /// Call `on_ready` once the first navigation commits, or `on_error` if
    /// it fails. Runs `on_ready` right away when that already happened.
    pub fn on_ready(&self, on_ready: ReadyCallback, on_error: Option<ReadyErrorCallback>) {
        let mut readiness = self.inner.readiness();
        if readiness.ready {
            drop(readiness);
            on_ready(&self.current());
            return;
        }
        readiness.on_ready.push(on_ready);
        if let Some(on_error) = on_error {
            readiness.on_error.push(on_error);
        }
    }

    /// Navigate to `to` and apply `update` to the history on success.
    pub async fn transition_to(
        &self,
        to: impl Into<RawLocation>,
        update: UrlUpdate,
    ) -> Result<Route, NavigationError> {
        self.navigate(to.into(), update).await
    }

    /// Navigate to `to`, adding a history entry.
    pub async fn push(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        let to = to.into();
        let update = if to.replace {
            UrlUpdate::Replace
        } else {
            UrlUpdate::Push
        };
        self.navigate(to, update).await
    }

    /// Navigate to `to`, replacing the current history entry.
    pub async fn replace(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        self.navigate(to.into(), UrlUpdate::Replace).await
    }

    /// Move `delta` history entries.
    ///
    /// Returns `Ok(None)` when the backend cannot move that far or reports
    /// the move later through its pop listener.
    pub async fn go(&self, delta: isize) -> Result<Option<Route>, NavigationError> {
        match self.inner.history.go(delta) {
            Some(location) => self.navigate(location.into(), UrlUpdate::None).await.map(Some),
            None => Ok(None),
        }
    }

    /// Make the history show the current route.
    pub fn ensure_url(&self, push: bool) {
        let current = self.current();
        if self.inner.history.current_location() != current.full_path() {
            if push {
                self.inner.history.push(current.full_path());
            } else {
                self.inner.history.replace(current.full_path());
            }
        }
    }

    /// Navigate whenever the history backend reports a platform move.
    pub fn setup_listeners(&self) {
        let engine = Arc::downgrade(&self.inner);
        let listener: PopListener = Arc::new(move |location: String| -> PopFuture {
            let engine = engine.clone();
            Box::pin(async move {
                if let Some(inner) = engine.upgrade() {
                    let engine = TransitionEngine { inner };
                    let _ = engine.navigate(location.into(), UrlUpdate::None).await;
                }
            })
        });
        self.inner.history.setup_listeners(listener);
    }

    /// Release history listeners and return to [`Route::start`].
    pub fn teardown(&self) {
        self.inner.history.teardown();
        let mut state = self.inner.state();
        state.current = Route::start();
        state.pending = None;
    }

    fn navigate(
        &self,
        to: RawLocation,
        update: UrlUpdate,
    ) -> BoxFuture<'_, Result<Route, NavigationError>> {
        Box::pin(async move {
            let current = self.current();
            let route = match self.inner.matcher.resolve_from(&to, Some(&current), None) {
                Ok(route) => route,
                Err(err) => {
                    let err = NavigationError::Resolve(Box::new(err));
                    self.notify_error(&err);
                    return Err(err);
                }
            };
            self.transition(route, update).await
        })
    }

    async fn transition(&self, route: Route, update: UrlUpdate) -> Result<Route, NavigationError> {
        let prev = self.current();
        #[cfg(feature = "tracing")]
        tracing::debug!(from = %prev.full_path(), to = %route.full_path(), "navigation started");

        match self.confirm(&route, &prev).await {
            Ok(entered) => {
                self.commit(&route);
                match update {
                    UrlUpdate::Push => self.inner.history.push(route.full_path()),
                    UrlUpdate::Replace => self.inner.history.replace(route.full_path()),
                    UrlUpdate::None => {}
                }
                self.ensure_url(false);
                for hook in self.inner.after_hooks.snapshot() {
                    hook.after(&route, &prev);
                }
                self.flush_ready(&route);
                self.schedule_enter_callbacks(&route, entered);

                #[cfg(feature = "tracing")]
                tracing::debug!(route = %route.full_path(), "navigation committed");
                Ok(route)
            }
            Err(Abort::Redirect { failure, to }) => {
                let err = NavigationError::from(failure);
                self.settle_failure(&err, &route);

                #[cfg(feature = "tracing")]
                tracing::debug!(from = %route.full_path(), to = ?to, "navigation redirected");
                let update = if to.replace {
                    UrlUpdate::Replace
                } else {
                    UrlUpdate::Push
                };
                let _ = self.navigate(to, update).await;
                Err(err)
            }
            Err(Abort::Error(err)) => {
                if err.failure().is_none() {
                    self.notify_error(&err);
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(route = %route.full_path(), error = %err, "navigation stopped");
                self.settle_failure(&err, &route);
                Err(err)
            }
        }
    }

    async fn confirm(&self, route: &Route, current: &Route) -> Result<Vec<PendingEnter>, Abort> {
        if is_duplicate(route, current) {
            self.ensure_url(false);
            return Err(NavigationFailure::duplicated(current.clone(), route.clone()).into());
        }

        let diff = resolve_queue(current.matched(), route.matched());
        let id = self.begin(route);
        let instances = &self.inner.instances;
        let mut entered = Vec::new();

        let mut queue = leave_guards(&diff.deactivated, instances);
        queue.extend(self.inner.before_hooks.snapshot().into_iter().map(Step::Guard));
        queue.extend(update_guards(&diff.updated, instances));
        queue.extend(before_enter_guards(&diff.activated));
        queue.push(Step::ResolveComponents(diff.activated.clone()));
        self.run_queue(queue, id, route, current, &mut entered).await?;

        let mut queue = enter_guards(&diff.activated);
        queue.extend(self.inner.resolve_hooks.snapshot().into_iter().map(Step::Guard));
        self.run_queue(queue, id, route, current, &mut entered).await?;

        if !self.finish(id) {
            return Err(NavigationFailure::cancelled(current.clone(), route.clone()).into());
        }
        Ok(entered)
    }

    async fn run_queue(
        &self,
        queue: Vec<Step>,
        id: u64,
        route: &Route,
        current: &Route,
        entered: &mut Vec<PendingEnter>,
    ) -> Result<(), Abort> {
        for step in queue {
            self.check_pending(id, route, current)?;
            let verdict = match &step {
                Step::Guard(guard) | Step::Enter { guard, .. } => {
                    (**guard).check_dyn(route, current).await
                }
                Step::ResolveComponents(records) => {
                    resolve_components(records).await.map(|()| Next::Continue)
                }
            };
            // A superseded navigation ignores whatever its guard decided.
            self.check_pending(id, route, current)?;

            match verdict {
                Ok(Next::Continue) => {}
                Ok(Next::OnEnter(callback)) => {
                    if let Step::Enter { record, slot, .. } = step {
                        entered.push(PendingEnter {
                            record,
                            slot,
                            callback,
                        });
                    }
                }
                Ok(Next::Redirect(to)) if to.path.is_none() && to.name.is_none() => {}
                Ok(Next::Redirect(to)) => {
                    return Err(Abort::Redirect {
                        failure: NavigationFailure::redirected(current.clone(), route.clone()),
                        to,
                    });
                }
                Ok(Next::Abort) => {
                    self.ensure_url(true);
                    return Err(NavigationFailure::aborted(current.clone(), route.clone()).into());
                }
                Err(err) => {
                    self.ensure_url(true);
                    return Err(Abort::Error(NavigationError::Guard(err)));
                }
            }
        }
        Ok(())
    }

    fn begin(&self, route: &Route) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.state().pending = Some((id, route.clone()));
        id
    }

    fn is_pending(&self, id: u64) -> bool {
        matches!(self.inner.state().pending, Some((pending, _)) if pending == id)
    }

    fn check_pending(&self, id: u64, route: &Route, current: &Route) -> Result<(), Abort> {
        if self.is_pending(id) {
            Ok(())
        } else {
            Err(NavigationFailure::cancelled(current.clone(), route.clone()).into())
        }
    }

    fn finish(&self, id: u64) -> bool {
        let mut state = self.inner.state();
        match state.pending {
            Some((pending, _)) if pending == id => {
                state.pending = None;
                true
            }
            _ => false,
        }
    }

    fn commit(&self, route: &Route) {
        self.inner.state().current = route.clone();
        for listener in self.inner.listeners.snapshot() {
            listener(route);
        }
    }

    fn flush_ready(&self, route: &Route) {
        let callbacks = {
            let mut readiness = self.inner.readiness();
            if readiness.ready {
                return;
            }
            readiness.ready = true;
            readiness.on_error.clear();
            std::mem::take(&mut readiness.on_ready)
        };
        for callback in callbacks {
            callback(route);
        }
    }

    fn settle_failure(&self, err: &NavigationError, route: &Route) {
        let mut readiness = self.inner.readiness();
        if readiness.ready {
            return;
        }
        readiness.ready = true;
        // A redirect still leaves the app in a stable state.
        if err.is_failure(FailureKind::REDIRECTED) {
            readiness.on_error.clear();
            let callbacks = std::mem::take(&mut readiness.on_ready);
            drop(readiness);
            for callback in callbacks {
                callback(route);
            }
        } else {
            readiness.on_ready.clear();
            let callbacks = std::mem::take(&mut readiness.on_error);
            drop(readiness);
            for callback in callbacks {
                callback(err);
            }
        }
    }

    fn notify_error(&self, err: &NavigationError) {
        let observers = self.inner.error_observers.snapshot();
        if observers.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %err, "uncaught error during route navigation");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
            return;
        }
        for observer in observers {
            observer(err);
        }
    }

    fn schedule_enter_callbacks(&self, route: &Route, entered: Vec<PendingEnter>) {
        if entered.is_empty() {
            return;
        }
        let inner = Arc::downgrade(&self.inner);
        let route = route.clone();
        self.inner.ticker.next_tick(Box::new(move || {
            for enter in entered {
                poll_instance(inner.clone(), route.clone(), enter);
            }
        }));
    }
}

fn is_duplicate(route: &Route, current: &Route) -> bool {
    let (next, prev) = (route.matched(), current.matched());
    let same_leaf = match (next.last(), prev.last()) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    };
    is_same_route(route, current, false) && next.len() == prev.len() && same_leaf
}

// Hand the instance to the callback once it is mounted. Re-arms while
// `route` is still the current route.
fn poll_instance(inner: Weak<Inner>, route: Route, enter: PendingEnter) {
    let Some(strong) = inner.upgrade() else {
        return;
    };
    if let Some(instance) = strong.instances.get(enter.record, &enter.slot) {
        if !instance.is_being_destroyed() {
            (enter.callback)(instance);
            return;
        }
    }
    if strong.current().ptr_eq(&route) {
        strong.ticker.after(
            ENTER_POLL_INTERVAL,
            Box::new(move || poll_instance(inner, route, enter)),
        );
    }
}
