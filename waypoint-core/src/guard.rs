//! Navigation guards.
//!
//! A guard inspects an in-flight navigation and returns a [`Next`] that
//! lets it proceed, aborts it, or redirects it. Returning `Err` aborts the
//! navigation with an application error.
//!
//! ```
//! use waypoint_core::{guard_fn, Next};
//!
//! let require_login = guard_fn(|to, _from| async move {
//!     if to.meta().contains_key("requiresAuth") {
//!         Ok(Next::redirect("/login"))
//!     } else {
//!         Ok(Next::Continue)
//!     }
//! });
//! # let _ = require_login;
//! ```

use crate::{component::Instance, error::BoxError, location::RawLocation, route::Route};
use std::{fmt, future::Future, pin::Pin, sync::Arc};

/// Callback receiving the entered component instance once it exists.
pub type EnterCallback = Box<dyn FnOnce(Arc<dyn Instance>) + Send>;

/// A guard's verdict.
pub enum Next {
    /// Proceed to the next guard.
    Continue,
    /// Stop the navigation and restore the previous URL.
    Abort,
    /// Stop the navigation and navigate to another target instead.
    Redirect(RawLocation),
    /// Proceed, and call back with the component instance once it is mounted.
    ///
    /// Only meaningful from enter guards; elsewhere it behaves as `Continue`.
    OnEnter(EnterCallback),
}

impl Next {
    /// Redirect to `to`.
    pub fn redirect(to: impl Into<RawLocation>) -> Self {
        Next::Redirect(to.into())
    }

    /// Proceed and receive the entered instance later.
    pub fn on_enter(callback: impl FnOnce(Arc<dyn Instance>) + Send + 'static) -> Self {
        Next::OnEnter(Box::new(callback))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Continue => f.write_str("Continue"),
            Next::Abort => f.write_str("Abort"),
            Next::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
            Next::OnEnter(_) => f.write_str("OnEnter(..)"),
        }
    }
}

impl From<bool> for Next {
    fn from(proceed: bool) -> Self {
        if proceed { Next::Continue } else { Next::Abort }
    }
}

impl From<()> for Next {
    fn from(_: ()) -> Self {
        Next::Continue
    }
}

impl From<RawLocation> for Next {
    fn from(to: RawLocation) -> Self {
        Next::Redirect(to)
    }
}

impl From<&str> for Next {
    fn from(to: &str) -> Self {
        Next::Redirect(to.into())
    }
}

/// A navigation guard.
///
/// Guards run strictly one at a time; the navigation waits for each
/// returned future.
///
/// # Static vs Dynamic Dispatch
///
/// This trait uses native `async fn`. Guard lists are stored as
/// [`DynGuard`] trait objects.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a navigation guard",
    label = "missing `Guard` implementation",
    note = "Implement `Guard::check`, wrap a closure with `guard_fn`, or use `#[guard]`."
)]
pub trait Guard: Send + Sync + 'static {
    /// Decide on the navigation from `from` to `to`.
    fn check(
        &self,
        to: &Route,
        from: &Route,
    ) -> impl Future<Output = Result<Next, BoxError>> + Send;
}

/// Dynamic object-safe version of [`Guard`].
pub trait DynGuard: Send + Sync + 'static {
    /// Decide on the navigation (dynamic dispatch version).
    fn check_dyn<'a>(
        &'a self,
        to: &'a Route,
        from: &'a Route,
    ) -> Pin<Box<dyn Future<Output = Result<Next, BoxError>> + Send + 'a>>;
}

impl<T: Guard> DynGuard for T {
    fn check_dyn<'a>(
        &'a self,
        to: &'a Route,
        from: &'a Route,
    ) -> Pin<Box<dyn Future<Output = Result<Next, BoxError>> + Send + 'a>> {
        Box::pin(self.check(to, from))
    }
}

impl Guard for Box<dyn DynGuard> {
    async fn check(&self, to: &Route, from: &Route) -> Result<Next, BoxError> {
        (**self).check_dyn(to, from).await
    }
}

impl Guard for Arc<dyn DynGuard> {
    async fn check(&self, to: &Route, from: &Route) -> Result<Next, BoxError> {
        (**self).check_dyn(to, from).await
    }
}

/// A [`Guard`] backed by an async closure taking owned routes.
pub struct GuardFn<F>(F);

/// Wrap an async closure as a [`Guard`].
pub fn guard_fn<F, Fut>(check: F) -> GuardFn<F>
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Next, BoxError>> + Send + 'static,
{
    GuardFn(check)
}

impl<F, Fut> Guard for GuardFn<F>
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Next, BoxError>> + Send + 'static,
{
    fn check(
        &self,
        to: &Route,
        from: &Route,
    ) -> impl Future<Output = Result<Next, BoxError>> + Send {
        (self.0)(to.clone(), from.clone())
    }
}

/// A [`Guard`] backed by a synchronous closure.
pub struct SyncGuardFn<F>(F);

/// Wrap a synchronous closure as a [`Guard`].
pub fn guard_sync<F>(check: F) -> SyncGuardFn<F>
where
    F: Fn(&Route, &Route) -> Result<Next, BoxError> + Send + Sync + 'static,
{
    SyncGuardFn(check)
}

impl<F> Guard for SyncGuardFn<F>
where
    F: Fn(&Route, &Route) -> Result<Next, BoxError> + Send + Sync + 'static,
{
    fn check(
        &self,
        to: &Route,
        from: &Route,
    ) -> impl Future<Output = Result<Next, BoxError>> + Send {
        std::future::ready((self.0)(to, from))
    }
}

/// Observer called after every committed navigation.
pub trait AfterHook: Send + Sync + 'static {
    /// Called with the new route and the route it replaced.
    fn after(&self, to: &Route, from: &Route);
}

impl<F> AfterHook for F
where
    F: Fn(&Route, &Route) + Send + Sync + 'static,
{
    fn after(&self, to: &Route, from: &Route) {
        self(to, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closures_become_guards() {
        let guard: Arc<dyn DynGuard> = Arc::new(guard_fn(|to, _from| async move {
            Ok(Next::from(to.path() != "/blocked"))
        }));
        let start = Route::start();
        assert!(matches!(
            guard.check(&start, &start).await.unwrap(),
            Next::Continue
        ));
    }

    #[tokio::test]
    async fn shared_guard_objects_dispatch_to_the_inner_guard() {
        let arc: Arc<dyn DynGuard> = Arc::new(guard_sync(|_, _| Ok(Next::Abort)));
        let boxed: Box<dyn DynGuard> = Box::new(guard_sync(|_, _| Ok(Next::Abort)));
        let start = Route::start();

        assert!(matches!(arc.check_dyn(&start, &start).await.unwrap(), Next::Abort));
        assert!(matches!(arc.check(&start, &start).await.unwrap(), Next::Abort));
        assert!(matches!(boxed.check(&start, &start).await.unwrap(), Next::Abort));

        let nested: Arc<dyn DynGuard> = Arc::new(arc.clone());
        assert!(matches!(nested.check_dyn(&start, &start).await.unwrap(), Next::Abort));
    }

    #[tokio::test]
    async fn sync_guards_redirect() {
        let guard = guard_sync(|_, _| Ok("/login".into()));
        let start = Route::start();
        match guard.check(&start, &start).await.unwrap() {
            Next::Redirect(to) => assert_eq!(to.path.as_deref(), Some("/login")),
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn bool_conversion() {
        assert!(matches!(Next::from(false), Next::Abort));
        assert!(matches!(Next::from(true), Next::Continue));
    }
}
