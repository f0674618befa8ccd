//! Contracts for the host's view components.
//!
//! Routing treats components as opaque. It only asks them for their
//! per-route guards, loads lazy ones before entering, and hands live
//! instances to enter callbacks.

use crate::{error::BoxError, guard::DynGuard};
use async_trait::async_trait;
use std::{any::Any, future::Future, sync::Arc};

/// Which in-component guard to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKind {
    /// Runs before the component's route is entered.
    Enter,
    /// Runs when the route changes but the component is reused.
    Update,
    /// Runs before the component's route is left.
    Leave,
}

/// A routed view component.
///
/// All guard lists default to empty.
pub trait Component: Send + Sync + 'static {
    /// Guards to run before entering a route that renders this component.
    fn before_route_enter(&self) -> Vec<Arc<dyn DynGuard>> {
        Vec::new()
    }

    /// Guards to run when a reused instance sees new params or query.
    fn before_route_update(&self) -> Vec<Arc<dyn DynGuard>> {
        Vec::new()
    }

    /// Guards to run before leaving a route that renders this component.
    fn before_route_leave(&self) -> Vec<Arc<dyn DynGuard>> {
        Vec::new()
    }

    /// Guards of the given kind.
    fn guards(&self, kind: GuardKind) -> Vec<Arc<dyn DynGuard>> {
        match kind {
            GuardKind::Enter => self.before_route_enter(),
            GuardKind::Update => self.before_route_update(),
            GuardKind::Leave => self.before_route_leave(),
        }
    }
}

/// A component that has to be loaded before it can be used.
#[async_trait]
pub trait LazyComponent: Send + Sync + 'static {
    /// Load the component.
    async fn load(&self) -> Result<Arc<dyn Component>, BoxError>;
}

/// A [`LazyComponent`] backed by an async closure.
pub struct LazyFn<F>(F);

/// Wrap an async closure as a [`LazyComponent`].
pub fn lazy<F, Fut>(load: F) -> LazyFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn Component>, BoxError>> + Send + 'static,
{
    LazyFn(load)
}

#[async_trait]
impl<F, Fut> LazyComponent for LazyFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn Component>, BoxError>> + Send + 'static,
{
    async fn load(&self) -> Result<Arc<dyn Component>, BoxError> {
        (self.0)().await
    }
}

/// A live instance of a component, registered by the host while mounted.
pub trait Instance: Send + Sync + 'static {
    /// Whether the instance is being torn down.
    fn is_being_destroyed(&self) -> bool {
        false
    }

    /// Downcast support for enter callbacks.
    fn as_any(&self) -> &dyn Any;
}
