//! Navigation targets before and after normalization.

use crate::query::{Query, QueryValue};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Route parameters by name.
pub type Params = BTreeMap<String, String>;

/// A navigation target as supplied by callers.
///
/// A raw location is a path string (possibly relative, possibly carrying a
/// query and hash), a route name with params, or just params relative to the
/// current route. Strings convert with [`From`]:
///
/// ```
/// use waypoint_core::RawLocation;
///
/// let to = RawLocation::from("/users/42?tab=posts#top");
/// assert_eq!(to.path.as_deref(), Some("/users/42?tab=posts#top"));
///
/// let named = RawLocation::named("user").param("id", "42");
/// assert_eq!(named.params.unwrap()["id"], "42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLocationRepr")]
pub struct RawLocation {
    /// Route name. Takes priority over `path`.
    pub name: Option<String>,
    /// Path, possibly relative and possibly with `?query#hash`.
    pub path: Option<String>,
    /// Params for named or relative navigation.
    pub params: Option<Params>,
    /// Query entries, overlaid on the path's own query.
    pub query: Option<Query>,
    /// Hash fragment, with or without the leading `#`.
    pub hash: Option<String>,
    /// Resolve a relative path without dropping the base's last segment.
    pub append: bool,
    /// Replace the current history entry instead of pushing one.
    pub replace: bool,
    normalized: bool,
}

impl RawLocation {
    /// A path target.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A named target.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A params-only target, relative to the current route.
    pub fn with_params(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    /// Add a param.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a query entry.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the hash.
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Mark the target as replacing the current history entry.
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Resolve relative paths in append mode.
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// Whether this target came from an already normalized [`Location`].
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        RawLocation::path(path)
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        RawLocation::path(path)
    }
}

impl From<&String> for RawLocation {
    fn from(path: &String) -> Self {
        RawLocation::path(path.as_str())
    }
}

impl From<Location> for RawLocation {
    fn from(location: Location) -> Self {
        Self {
            name: location.name,
            path: location.path,
            params: Some(location.params),
            query: Some(location.query),
            hash: Some(location.hash),
            append: location.append,
            replace: location.replace,
            normalized: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocationRepr {
    Path(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        params: Option<Params>,
        #[serde(default)]
        query: Option<Query>,
        #[serde(default)]
        hash: Option<String>,
        #[serde(default)]
        append: bool,
        #[serde(default)]
        replace: bool,
    },
}

impl From<RawLocationRepr> for RawLocation {
    fn from(repr: RawLocationRepr) -> Self {
        match repr {
            RawLocationRepr::Path(path) => RawLocation::path(path),
            RawLocationRepr::Object {
                name,
                path,
                params,
                query,
                hash,
                append,
                replace,
            } => RawLocation {
                name,
                path,
                params,
                query,
                hash,
                append,
                replace,
                normalized: false,
            },
        }
    }
}

/// A normalized navigation target.
///
/// Either `name` (with `params`) or `path` is set. Owns all of its data, so
/// later changes to the raw input never leak into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Route name for named targets.
    pub name: Option<String>,
    /// Absolute path for path targets.
    pub path: Option<String>,
    /// Params.
    pub params: Params,
    /// Query entries.
    pub query: Query,
    /// Hash, `#`-prefixed when non-empty.
    pub hash: String,
    /// Carried over from the raw target.
    pub append: bool,
    /// Carried over from the raw target.
    pub replace: bool,
}

impl Location {
    /// A path location.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A named location.
    pub fn from_name(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: Some(name.into()),
            params,
            ..Self::default()
        }
    }
}
