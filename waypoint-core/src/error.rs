//! Error types for Waypoint.
//!
//! - [`ConfigError`] - fatal errors while compiling a route table
//! - [`ConfigWarning`] - non-fatal configuration diagnostics
//! - [`NavigationFailure`] - expected outcomes of a navigation that did not commit
//! - [`NavigationError`] - everything a transition can end with besides success

use crate::route::Route;
use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

/// A boxed error type for application errors raised by guards and resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal route configuration errors. Compilation stops at the first one.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A route definition has no `path`.
    #[error("\"path\" is required in a route configuration (route name: {name:?})")]
    MissingPath {
        /// Name of the offending definition, if it had one.
        name: Option<String>,
    },

    /// A path pattern could not be compiled.
    #[error("invalid path pattern {path:?}: {source}")]
    InvalidPattern {
        /// The normalized pattern.
        path: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Non-fatal configuration diagnostics.
///
/// Warnings never stop compilation or resolution; they are collected on the
/// table and logged through `tracing` when that feature is enabled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Two definitions share a name; the first registration wins.
    #[error("duplicate named routes definition: {{ name: \"{name}\", path: \"{path}\" }}")]
    DuplicateName {
        /// The duplicated name.
        name: String,
        /// Path of the ignored definition.
        path: String,
    },

    /// A pattern declares the same parameter twice.
    #[error("duplicate param key \"{param}\" in route with path: \"{path}\"")]
    DuplicateParam {
        /// The pattern.
        path: String,
        /// The repeated parameter.
        param: String,
    },

    /// A top-level path does not start with `/`.
    #[error("non-nested routes must include a leading slash character: \"{path}\"")]
    MissingLeadingSlash {
        /// The offending path.
        path: String,
    },

    /// An alias equals its own path and was skipped.
    #[error("found an alias with the same value as the path: \"{path}\"; the alias is ignored")]
    AliasSameAsPath {
        /// The path.
        path: String,
    },

    /// A named route without redirect has a default child.
    #[error(
        "named route '{name}' has a default child route; navigating to it by name will not render that child"
    )]
    NamedRouteWithDefaultChild {
        /// The parent route name.
        name: String,
    },

    /// A redirect target has neither a name nor a path.
    #[error("invalid redirect option for route with path \"{path}\"")]
    InvalidRedirect {
        /// Path of the redirecting record.
        path: String,
    },

    /// A named navigation or redirect references an unknown name.
    #[error("route with name '{name}' does not exist")]
    UnknownNamedRoute {
        /// The unknown name.
        name: String,
    },

    /// Relative params navigation had no usable current route.
    #[error("relative params navigation requires a current route")]
    RelativeParamsWithoutCurrent,

    /// A pattern could not be filled with the given params.
    #[error("missing param for {context}: {message}")]
    MissingParam {
        /// What was being filled.
        context: String,
        /// The fill error.
        message: String,
    },
}

bitflags! {
    /// Kinds of navigation failure.
    ///
    /// Kinds are flags so one check can cover several of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FailureKind: u8 {
        /// A guard redirected the navigation elsewhere.
        const REDIRECTED = 0b0000_0010;
        /// A guard aborted the navigation.
        const ABORTED = 0b0000_0100;
        /// A newer navigation superseded this one.
        const CANCELLED = 0b0000_1000;
        /// The target is the current route.
        const DUPLICATED = 0b0001_0000;
    }
}

/// An expected, structured outcome of a navigation that did not commit.
///
/// Failures are not application errors and never reach error observers.
#[derive(Debug, Clone)]
pub struct NavigationFailure {
    kind: FailureKind,
    from: Route,
    to: Route,
}

impl NavigationFailure {
    /// Create a failure of the given kind.
    pub fn new(kind: FailureKind, from: Route, to: Route) -> Self {
        Self { kind, from, to }
    }

    /// A guard redirected the navigation.
    pub fn redirected(from: Route, to: Route) -> Self {
        Self::new(FailureKind::REDIRECTED, from, to)
    }

    /// A guard aborted the navigation.
    pub fn aborted(from: Route, to: Route) -> Self {
        Self::new(FailureKind::ABORTED, from, to)
    }

    /// A newer navigation superseded this one.
    pub fn cancelled(from: Route, to: Route) -> Self {
        Self::new(FailureKind::CANCELLED, from, to)
    }

    /// The navigation targeted the current route.
    pub fn duplicated(from: Route, to: Route) -> Self {
        Self::new(FailureKind::DUPLICATED, from, to)
    }

    /// The failure kind.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The route that was current when the navigation started.
    pub fn from(&self) -> &Route {
        &self.from
    }

    /// The route that was being navigated to.
    pub fn to(&self) -> &Route {
        &self.to
    }

    /// Whether this failure is any of `kinds`.
    pub fn is(&self, kinds: FailureKind) -> bool {
        self.kind.intersects(kinds)
    }
}

impl fmt::Display for NavigationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.full_path();
        let to = self.to.full_path();
        if self.kind.contains(FailureKind::REDIRECTED) {
            write!(
                f,
                "redirected when going from \"{from}\" to \"{to}\" via a navigation guard"
            )
        } else if self.kind.contains(FailureKind::ABORTED) {
            write!(
                f,
                "navigation aborted from \"{from}\" to \"{to}\" via a navigation guard"
            )
        } else if self.kind.contains(FailureKind::CANCELLED) {
            write!(
                f,
                "navigation cancelled from \"{from}\" to \"{to}\" with a new navigation"
            )
        } else {
            write!(f, "avoided redundant navigation to current location: \"{to}\"")
        }
    }
}

impl std::error::Error for NavigationFailure {}

/// Everything a transition can end with besides success.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// An expected navigation-flow outcome.
    #[error(transparent)]
    Failure(#[from] NavigationFailure),

    /// A guard failed or rejected the navigation with an error.
    #[error("guard error: {0}")]
    Guard(#[source] BoxError),

    /// Resolving the target location failed (for example a redirect resolver).
    #[error("resolve error: {0}")]
    Resolve(#[source] BoxError),
}

impl NavigationError {
    /// The navigation failure, if this is one.
    pub fn failure(&self) -> Option<&NavigationFailure> {
        match self {
            NavigationError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Whether this is a navigation failure of any of `kinds`.
    pub fn is_failure(&self, kinds: FailureKind) -> bool {
        self.failure().is_some_and(|f| f.is(kinds))
    }
}

/// Check whether `err` is a navigation failure, optionally of specific kinds.
pub fn is_navigation_failure(err: &NavigationError, kinds: Option<FailureKind>) -> bool {
    match (err.failure(), kinds) {
        (Some(failure), Some(kinds)) => failure.is(kinds),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_combine() {
        let failure = NavigationFailure::aborted(Route::start(), Route::start());
        assert!(failure.is(FailureKind::ABORTED));
        assert!(failure.is(FailureKind::ABORTED | FailureKind::CANCELLED));
        assert!(!failure.is(FailureKind::REDIRECTED));
    }

    #[test]
    fn navigation_failure_check() {
        let err = NavigationError::from(NavigationFailure::cancelled(
            Route::start(),
            Route::start(),
        ));
        assert!(is_navigation_failure(&err, None));
        assert!(is_navigation_failure(&err, Some(FailureKind::CANCELLED)));
        assert!(!is_navigation_failure(&err, Some(FailureKind::DUPLICATED)));

        let guard_err = NavigationError::Guard("boom".into());
        assert!(!is_navigation_failure(&guard_err, None));
    }

    #[test]
    fn failure_display() {
        let failure = NavigationFailure::duplicated(Route::start(), Route::start());
        assert_eq!(
            failure.to_string(),
            "avoided redundant navigation to current location: \"/\""
        );
    }
}
