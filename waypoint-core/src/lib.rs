//! # waypoint-core
//!
//! Value types and contracts for the Waypoint router.
//!
//! This crate holds everything that route definitions, guards, components
//! and history backends have to agree on, without any of the machinery that
//! compiles tables or runs navigations. That lives in `waypoint-std`.
//!
//! # Building Blocks
//!
//! - **Paths and queries**: [`resolve_path`], [`parse_path`], [`parse_query`],
//!   [`stringify_query`] and [`PathPattern`] for `:param` style patterns
//! - **Targets**: [`RawLocation`] as callers write it, [`Location`] once
//!   normalized
//! - **Results**: [`RouteRecord`] for compiled routes, [`Route`] for the
//!   immutable outcome of a resolution
//! - **Guards**: [`Guard`] / [`DynGuard`] returning a [`Next`] verdict
//! - **Collaborators**: [`Component`], [`Instance`], [`History`], [`Ticker`]
//!
//! # Error Types
//!
//! - [`ConfigError`] - Fatal route configuration errors
//! - [`ConfigWarning`] - Non-fatal configuration diagnostics
//! - [`NavigationFailure`] - Duplicate, cancelled, aborted or redirected navigations
//! - [`NavigationError`] - Failures plus guard and resolver errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod component;
mod error;
mod guard;
mod history;
mod location;
mod path;
mod pattern;
mod query;
mod record;
mod route;
mod ticker;

// Re-exports
pub use component::{Component, GuardKind, Instance, LazyComponent, LazyFn, lazy};
pub use error::{
    BoxError, ConfigError, ConfigWarning, FailureKind, NavigationError, NavigationFailure,
    is_navigation_failure,
};
pub use guard::{
    AfterHook, DynGuard, EnterCallback, Guard, GuardFn, Next, SyncGuardFn, guard_fn, guard_sync,
};
pub use history::{History, PopFuture, PopListener};
pub use location::{Location, Params, RawLocation};
pub use path::{ParsedPath, clean_path, parse_path, resolve_path};
pub use pattern::{FillError, PATH_MATCH, ParamKey, PathPattern, PatternOptions, fill_params};
pub use query::{Query, QueryValue, decode, encode, parse_query, resolve_query, stringify_query};
pub use record::{
    ComponentSlot, DEFAULT_SLOT, Meta, Props, PropsFn, RecordId, Redirect, RedirectFn,
    RouteRecord,
};
pub use route::{
    RecordDescriptor, Route, RouteDescriptor, RouteParts, is_included_route, is_same_route,
};
pub use ticker::{Task, Ticker};
