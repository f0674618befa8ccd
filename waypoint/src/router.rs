//! The router facade.

use crate::options::RouterOptions;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use waypoint_core::{
    AfterHook, Component, ConfigError, Guard, History, Location, NavigationError, RawLocation,
    Route, Ticker,
};
use waypoint_std::{
    CompileOptions, FrameTicker, HookHandle, InstanceRegistry, Matcher, ResolveError, RouteConfig,
    TransitionEngine, UrlUpdate,
};

static NEXT_APP: AtomicU64 = AtomicU64::new(0);

/// Identity of a host application mounting the router.
///
/// Clones refer to the same application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    id: u64,
}

impl AppContext {
    /// A new application identity.
    pub fn new() -> Self {
        Self {
            id: NEXT_APP.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The normalized target.
    pub location: Location,
    /// The route it matches.
    pub route: Route,
    /// Link target: base plus the full path that was asked for.
    pub href: String,
}

/// A router: route table, navigation engine and history, behind one handle.
///
/// ```
/// use waypoint::{MemoryHistory, RouteConfig, Router, RouterOptions};
///
/// let routes = [
///     RouteConfig::new("/").name("home"),
///     RouteConfig::new("/users/:id").name("user"),
/// ];
/// let router = Router::new(&routes, RouterOptions::new(), MemoryHistory::new()).unwrap();
/// let resolved = router.resolve("/users/42", None, false).unwrap();
/// assert_eq!(resolved.route.name(), Some("user"));
/// assert_eq!(resolved.route.param("id"), Some("42"));
/// ```
pub struct Router {
    engine: TransitionEngine,
    base: String,
    frames: Option<FrameTicker>,
    apps: Mutex<Vec<AppContext>>,
}

impl Router {
    /// Compile `routes` and build a router on `history`.
    pub fn new(
        routes: &[RouteConfig],
        mut options: RouterOptions,
        history: impl History,
    ) -> Result<Self, ConfigError> {
        let matcher = Matcher::from_routes(
            routes,
            CompileOptions {
                case_sensitive: options.is_case_sensitive(),
                strict: options.is_strict(),
            },
        )?;
        let (ticker, frames): (Arc<dyn Ticker>, _) = match options.take_ticker() {
            Some(ticker) => (ticker, None),
            None => {
                let frames = FrameTicker::new();
                (Arc::new(frames.clone()), Some(frames))
            }
        };
        Ok(Self {
            engine: TransitionEngine::new(Arc::new(matcher), Arc::new(history), ticker),
            base: options.base_path(),
            frames,
            apps: Mutex::new(Vec::new()),
        })
    }

    /// Mount the router in `app`.
    ///
    /// The first mount navigates to the history's current location and
    /// starts listening for history moves. Mounting again, with this or any
    /// other application, does nothing and returns `Ok(None)`.
    pub async fn init(&self, app: &AppContext) -> Result<Option<Route>, NavigationError> {
        {
            let mut apps = self.apps();
            if apps.contains(app) {
                return Ok(None);
            }
            apps.push(app.clone());
            if apps.len() > 1 {
                return Ok(None);
            }
        }

        let location = self.engine.history().current_location();
        let result = self.engine.transition_to(location, UrlUpdate::None).await;
        self.engine.setup_listeners();
        result.map(Some)
    }

    /// Unmount the router from `app`. Once no application is left the
    /// history listeners are released.
    pub fn unmount(&self, app: &AppContext) {
        let mut apps = self.apps();
        apps.retain(|mounted| mounted != app);
        if apps.is_empty() {
            drop(apps);
            self.engine.teardown();
        }
    }

    /// Navigate to `to`, adding a history entry.
    pub async fn push(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        self.engine.push(to).await
    }

    /// Navigate to `to`, replacing the current history entry.
    pub async fn replace(&self, to: impl Into<RawLocation>) -> Result<Route, NavigationError> {
        self.engine.replace(to).await
    }

    /// Move `delta` entries through the history.
    pub async fn go(&self, delta: isize) -> Result<Option<Route>, NavigationError> {
        self.engine.go(delta).await
    }

    /// Go back one entry.
    pub async fn back(&self) -> Result<Option<Route>, NavigationError> {
        self.go(-1).await
    }

    /// Go forward one entry.
    pub async fn forward(&self) -> Result<Option<Route>, NavigationError> {
        self.go(1).await
    }

    /// Resolve `to` without navigating.
    ///
    /// Relative targets resolve against `current`, or the current route.
    pub fn resolve(
        &self,
        to: impl Into<RawLocation>,
        current: Option<&Route>,
        append: bool,
    ) -> Result<Resolved, ResolveError> {
        let current = current.cloned().unwrap_or_else(|| self.engine.current());
        let matcher = self.engine.matcher();
        let location = matcher.normalize(&to.into(), Some(&current), append);
        let route =
            matcher.resolve_from(&RawLocation::from(location.clone()), Some(&current), None)?;
        let href = format!(
            "{}{}",
            self.base,
            route.redirected_from().unwrap_or(route.full_path())
        );
        Ok(Resolved {
            location,
            route,
            href,
        })
    }

    /// Register more routes.
    ///
    /// Once the router has navigated, the current location is resolved
    /// again so that it can pick up a newly added match.
    pub async fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        self.engine.matcher().add_routes(routes)?;
        if !self.engine.current().is_start() {
            let location = self.engine.history().current_location();
            let outcome = self.engine.transition_to(location, UrlUpdate::None).await;
            #[cfg(feature = "tracing")]
            if let Err(err) = &outcome {
                tracing::debug!(error = %err, "current location kept after adding routes");
            }
            #[cfg(not(feature = "tracing"))]
            let _ = outcome;
        }
        Ok(())
    }

    /// The last committed route.
    pub fn current_route(&self) -> Route {
        self.engine.current()
    }

    /// Loaded components of `route`, or of the current route, outermost first.
    pub fn matched_components(&self, route: Option<&Route>) -> Vec<Arc<dyn Component>> {
        let current;
        let route = match route {
            Some(route) => route,
            None => {
                current = self.engine.current();
                &current
            }
        };
        route
            .matched()
            .iter()
            .flat_map(|record| record.components.values())
            .filter_map(|slot| slot.get())
            .collect()
    }

    /// Run `guard` before every navigation.
    pub fn before_each(&self, guard: impl Guard) -> HookHandle {
        self.engine.before_each(guard)
    }

    /// Run `guard` once every other guard passed and components are loaded.
    pub fn before_resolve(&self, guard: impl Guard) -> HookHandle {
        self.engine.before_resolve(guard)
    }

    /// Call `hook` after every committed navigation.
    pub fn after_each(&self, hook: impl AfterHook) -> HookHandle {
        self.engine.after_each(hook)
    }

    /// Call `callback` once the first navigation has finished.
    pub fn on_ready(&self, callback: impl FnOnce(&Route) + Send + 'static) {
        self.engine.on_ready(Box::new(callback), None);
    }

    /// Like [`on_ready`](Self::on_ready), calling `on_error` instead when the
    /// first navigation fails.
    pub fn on_ready_or_error(
        &self,
        on_ready: impl FnOnce(&Route) + Send + 'static,
        on_error: impl FnOnce(&NavigationError) + Send + 'static,
    ) {
        self.engine
            .on_ready(Box::new(on_ready), Some(Box::new(on_error)));
    }

    /// Observe guard and resolver errors.
    pub fn on_error(
        &self,
        observer: impl Fn(&NavigationError) + Send + Sync + 'static,
    ) -> HookHandle {
        self.engine.on_error(observer)
    }

    /// Call `listener` with every committed route.
    pub fn listen(&self, listener: impl Fn(&Route) + Send + Sync + 'static) -> HookHandle {
        self.engine.listen(listener)
    }

    /// Release history listeners and forget every mounted application.
    pub fn teardown(&self) {
        self.apps().clear();
        self.engine.teardown();
    }

    /// Normalized base path.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Mounted component instances.
    pub fn instances(&self) -> &InstanceRegistry {
        self.engine.instances()
    }

    /// The frame queue enter callbacks run on, unless a ticker was
    /// configured. The host drains it after rendering.
    pub fn frames(&self) -> Option<&FrameTicker> {
        self.frames.as_ref()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    fn apps(&self) -> MutexGuard<'_, Vec<AppContext>> {
        self.apps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
