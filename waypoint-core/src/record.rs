//! Compiled route records.

use crate::{
    component::{Component, LazyComponent},
    error::BoxError,
    guard::DynGuard,
    location::RawLocation,
    pattern::PathPattern,
    route::Route,
};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, OnceLock},
};

/// Opaque per-route metadata.
pub type Meta = serde_json::Map<String, Value>;

/// Name of the slot used when a route has a single component.
pub const DEFAULT_SLOT: &str = "default";

/// Index of a record in its table.
///
/// Records refer to their parent by id rather than by pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(usize);

impl RecordId {
    /// Wrap an arena index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Function computing a redirect target from the route being redirected.
pub type RedirectFn = dyn Fn(&Route) -> Result<RawLocation, BoxError> + Send + Sync;

/// Where a redirecting record sends navigations.
#[derive(Clone)]
pub enum Redirect {
    /// A fixed target.
    Literal(RawLocation),
    /// A target computed from the matched route.
    Resolver(Arc<RedirectFn>),
}

impl Redirect {
    /// A computed redirect.
    pub fn resolver<F>(resolve: F) -> Self
    where
        F: Fn(&Route) -> Result<RawLocation, BoxError> + Send + Sync + 'static,
    {
        Redirect::Resolver(Arc::new(resolve))
    }

    /// The target for `route`.
    pub fn target(&self, route: &Route) -> Result<RawLocation, BoxError> {
        match self {
            Redirect::Literal(to) => Ok(to.clone()),
            Redirect::Resolver(resolve) => resolve(route),
        }
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Literal(to) => f.debug_tuple("Literal").field(to).finish(),
            Redirect::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for Redirect {
    fn from(path: &str) -> Self {
        Redirect::Literal(path.into())
    }
}

impl From<String> for Redirect {
    fn from(path: String) -> Self {
        Redirect::Literal(path.into())
    }
}

impl From<RawLocation> for Redirect {
    fn from(to: RawLocation) -> Self {
        Redirect::Literal(to)
    }
}

/// Function deriving component props from a route.
pub type PropsFn = dyn Fn(&Route) -> Meta + Send + Sync;

/// How a slot's component receives props.
#[derive(Clone, Default)]
pub enum Props {
    /// No props.
    #[default]
    None,
    /// The route params, as strings.
    Params,
    /// A fixed map.
    Fixed(Meta),
    /// Computed from the route.
    Derived(Arc<PropsFn>),
}

impl Props {
    /// Props for `route`, or `None` when the slot takes none.
    pub fn resolve(&self, route: &Route) -> Option<Meta> {
        match self {
            Props::None => None,
            Props::Params => Some(
                route
                    .params()
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            Props::Fixed(props) => Some(props.clone()),
            Props::Derived(derive) => Some(derive(route)),
        }
    }
}

impl From<bool> for Props {
    fn from(params: bool) -> Self {
        if params { Props::Params } else { Props::None }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Props::None => f.write_str("None"),
            Props::Params => f.write_str("Params"),
            Props::Fixed(props) => f.debug_tuple("Fixed").field(props).finish(),
            Props::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// A component reference in one named slot.
///
/// Lazy components are loaded at most once; clones share the loaded value.
#[derive(Clone)]
pub struct ComponentSlot {
    loader: Option<Arc<dyn LazyComponent>>,
    resolved: Arc<OnceLock<Arc<dyn Component>>>,
}

impl ComponentSlot {
    /// A slot holding an already available component.
    pub fn ready(component: impl Component) -> Self {
        Self::from_arc(Arc::new(component))
    }

    /// A slot holding a shared component.
    pub fn from_arc(component: Arc<dyn Component>) -> Self {
        let resolved = OnceLock::new();
        let _ = resolved.set(component);
        Self {
            loader: None,
            resolved: Arc::new(resolved),
        }
    }

    /// A slot whose component is loaded on first navigation.
    pub fn lazy(loader: impl LazyComponent) -> Self {
        Self {
            loader: Some(Arc::new(loader)),
            resolved: Arc::new(OnceLock::new()),
        }
    }

    /// The component, if available.
    pub fn get(&self) -> Option<Arc<dyn Component>> {
        self.resolved.get().cloned()
    }

    /// Whether the component is available without loading.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Load the component if needed.
    pub async fn resolve(&self) -> Result<Arc<dyn Component>, BoxError> {
        if let Some(component) = self.get() {
            return Ok(component);
        }
        let Some(loader) = &self.loader else {
            return Err("component slot has neither a component nor a loader".into());
        };
        let component = loader.load().await?;
        Ok(self.resolved.get_or_init(|| component).clone())
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("lazy", &self.loader.is_some())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A compiled route.
///
/// Records are built once by the route compiler and shared behind `Arc`;
/// they are never mutated afterwards.
pub struct RouteRecord {
    /// Position in the table's arena.
    pub id: RecordId,
    /// Normalized path pattern.
    pub path: String,
    /// Compiled form of `path`.
    pub pattern: PathPattern,
    /// Route name.
    pub name: Option<String>,
    /// Enclosing record.
    pub parent: Option<RecordId>,
    /// Redirect target.
    pub redirect: Option<Redirect>,
    /// Canonical path pattern when this record is an alias.
    pub match_as: Option<String>,
    /// User metadata.
    pub meta: Meta,
    /// Components by slot name.
    pub components: BTreeMap<String, ComponentSlot>,
    /// Props by slot name.
    pub props: BTreeMap<String, Props>,
    /// Guard declared in the route configuration.
    pub before_enter: Option<Arc<dyn DynGuard>>,
}

impl RouteRecord {
    /// Props for `slot`.
    pub fn props_for(&self, slot: &str) -> &Props {
        static NONE: Props = Props::None;
        self.props.get(slot).unwrap_or(&NONE)
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("redirect", &self.redirect)
            .field("match_as", &self.match_as)
            .field("meta", &self.meta)
            .field("components", &self.components)
            .field("before_enter", &self.before_enter.is_some())
            .finish()
    }
}
