//! Resolved routes.
//!
//! A [`Route`] is an immutable snapshot produced by resolving a location.
//! Cloning is cheap; all clones share one allocation.

use crate::{
    location::Params,
    query::{Query, stringify_query},
    record::{Meta, RouteRecord},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, LazyLock},
};

static START: LazyLock<Route> = LazyLock::new(|| {
    Route::new(RouteParts {
        path: "/".to_string(),
        ..RouteParts::default()
    })
});

/// The fields a route is built from.
#[derive(Default)]
pub struct RouteParts {
    /// Route name.
    pub name: Option<String>,
    /// Concrete path. Empty means `/`.
    pub path: String,
    /// Hash fragment.
    pub hash: String,
    /// Query entries.
    pub query: Query,
    /// Params.
    pub params: Params,
    /// Matched records, outermost first.
    pub matched: Vec<Arc<RouteRecord>>,
    /// Full path of the location that redirected here.
    pub redirected_from: Option<String>,
}

struct RouteData {
    name: Option<String>,
    path: String,
    hash: String,
    query: Query,
    params: Params,
    full_path: String,
    matched: Vec<Arc<RouteRecord>>,
    meta: Meta,
    redirected_from: Option<String>,
}

/// An immutable resolved route.
#[derive(Clone)]
pub struct Route(Arc<RouteData>);

impl Route {
    /// Build a route. The full path and meta are derived from the parts.
    pub fn new(parts: RouteParts) -> Self {
        let path = if parts.path.is_empty() {
            "/".to_string()
        } else {
            parts.path
        };
        let full_path = format!("{path}{}{}", stringify_query(&parts.query), parts.hash);
        let meta = parts
            .matched
            .last()
            .map(|record| record.meta.clone())
            .unwrap_or_default();
        Route(Arc::new(RouteData {
            name: parts.name,
            path,
            hash: parts.hash,
            query: parts.query,
            params: parts.params,
            full_path,
            matched: parts.matched,
            meta,
            redirected_from: parts.redirected_from,
        }))
    }

    /// The route that is current before the first navigation.
    pub fn start() -> Self {
        START.clone()
    }

    /// Whether this is the initial route.
    pub fn is_start(&self) -> bool {
        self.ptr_eq(&START)
    }

    /// Whether both handles point at the same snapshot.
    pub fn ptr_eq(&self, other: &Route) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Route name.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Concrete path.
    pub fn path(&self) -> &str {
        &self.0.path
    }

    /// Hash fragment, `#`-prefixed when non-empty.
    pub fn hash(&self) -> &str {
        &self.0.hash
    }

    /// Query entries.
    pub fn query(&self) -> &Query {
        &self.0.query
    }

    /// Params.
    pub fn params(&self) -> &Params {
        &self.0.params
    }

    /// A single param.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.0.params.get(key).map(String::as_str)
    }

    /// Path, query and hash.
    pub fn full_path(&self) -> &str {
        &self.0.full_path
    }

    /// Matched records, outermost first. Empty when nothing matched.
    pub fn matched(&self) -> &[Arc<RouteRecord>] {
        &self.0.matched
    }

    /// Meta of the innermost matched record.
    pub fn meta(&self) -> &Meta {
        &self.0.meta
    }

    /// Full path of the location that redirected here.
    pub fn redirected_from(&self) -> Option<&str> {
        self.0.redirected_from.as_deref()
    }

    /// The serializable form of this route.
    pub fn descriptor(&self) -> RouteDescriptor {
        RouteDescriptor {
            name: self.0.name.clone(),
            path: self.0.path.clone(),
            hash: self.0.hash.clone(),
            query: self.0.query.clone(),
            params: self.0.params.clone(),
            full_path: self.0.full_path.clone(),
            matched: self
                .0
                .matched
                .iter()
                .map(|record| RecordDescriptor {
                    path: record.path.clone(),
                    name: record.name.clone(),
                    meta: record.meta.clone(),
                })
                .collect(),
            redirected_from: self.0.redirected_from.clone(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.0.name)
            .field("full_path", &self.0.full_path)
            .field("params", &self.0.params)
            .field(
                "matched",
                &self.0.matched.iter().map(|r| &r.path).collect::<Vec<_>>(),
            )
            .field("redirected_from", &self.0.redirected_from)
            .finish()
    }
}

/// Serializable form of a [`Route`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// Route name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Concrete path.
    pub path: String,
    /// Hash fragment.
    pub hash: String,
    /// Query entries.
    pub query: Query,
    /// Params.
    pub params: Params,
    /// Path, query and hash.
    pub full_path: String,
    /// Matched records, outermost first.
    pub matched: Vec<RecordDescriptor>,
    /// Full path of the location that redirected here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirected_from: Option<String>,
}

/// Serializable form of a matched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Path pattern.
    pub path: String,
    /// Route name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Record meta.
    #[serde(default)]
    pub meta: Meta,
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Whether `a` and `b` describe the same location.
///
/// Paths are compared ignoring one trailing slash. Unless `only_path` is set,
/// hash and query must match too; named routes without a path also compare
/// params.
pub fn is_same_route(a: &Route, b: &Route, only_path: bool) -> bool {
    if b.is_start() {
        return a.ptr_eq(b);
    }
    if !a.path().is_empty() && !b.path().is_empty() {
        return strip_trailing_slash(a.path()) == strip_trailing_slash(b.path())
            && (only_path || (a.hash() == b.hash() && a.query() == b.query()));
    }
    match (a.name(), b.name()) {
        (Some(a_name), Some(b_name)) => {
            a_name == b_name
                && (only_path
                    || (a.hash() == b.hash() && a.query() == b.query() && a.params() == b.params()))
        }
        _ => false,
    }
}

fn with_trailing_slash(path: &str) -> String {
    format!("{}/", strip_trailing_slash(path))
}

/// Whether `current` is `target` or nested below it.
///
/// The target's hash must match when it has one, and every query key of the
/// target must be present in `current`.
pub fn is_included_route(current: &Route, target: &Route) -> bool {
    with_trailing_slash(current.path()).starts_with(&with_trailing_slash(target.path()))
        && (target.hash().is_empty() || current.hash() == target.hash())
        && target
            .query()
            .keys()
            .all(|key| current.query().contains_key(key))
}
