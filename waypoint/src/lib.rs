//! # waypoint - Route Resolution and Navigation
//!
//! `waypoint` maps locations to routes and drives guarded navigations
//! between them. A [`Router`] compiles a tree of [`RouteConfig`]s, resolves
//! paths and named targets (following redirects and aliases), and runs
//! every navigation through a strictly sequential guard queue before
//! committing it to the history.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use waypoint::prelude::*;
//!
//! let routes = [
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/admin").meta("requiresAuth", true),
//!     RouteConfig::new("/login").name("login"),
//! ];
//! let router = Router::new(&routes, RouterOptions::new(), MemoryHistory::new())?;
//!
//! router.before_each(guard_sync(|to, _from| {
//!     Ok(if to.meta().contains_key("requiresAuth") {
//!         Next::redirect("/login")
//!     } else {
//!         Next::Continue
//!     })
//! }));
//!
//! router.init(&AppContext::new()).await?;
//! router.push("/admin").await; // redirected to /login
//! ```
//!
//! ## Crates
//!
//! - [`waypoint_core`]: value types and contracts
//! - [`waypoint_std`]: compiler, matcher, transition engine and backends

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod options;
mod router;

pub use options::RouterOptions;
pub use router::{AppContext, Resolved, Router};

pub use waypoint_core::{
    // Guards
    AfterHook,
    // Errors
    BoxError,
    // Components
    Component,
    ConfigError,
    ConfigWarning,
    DynGuard,
    FailureKind,
    Guard,
    GuardKind,
    // History
    History,
    Instance,
    LazyComponent,
    Location,
    NavigationError,
    NavigationFailure,
    Next,
    // Locations
    Params,
    PopListener,
    Query,
    QueryValue,
    RawLocation,
    // Routes
    Route,
    RouteRecord,
    Ticker,
    guard_fn,
    guard_sync,
    is_navigation_failure,
    is_same_route,
    lazy,
};

pub use waypoint_std::{
    FrameTicker, HookHandle, Matcher, MemoryHistory, ResolveError, RouteConfig, TransitionEngine,
};

#[cfg(feature = "tokio")]
pub use waypoint_std::TokioTicker;

pub use waypoint_core;
pub use waypoint_std;

/// Standard guards and hooks.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use waypoint_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use waypoint_std::testing::*;
}

/// Prelude module - common imports for Waypoint.
///
/// # Usage
///
/// ```rust,ignore
/// use waypoint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AppContext, BoxError, Component, FailureKind, Guard, MemoryHistory, NavigationError,
        Next, RawLocation, Route, RouteConfig, Router, RouterOptions, guard_fn, guard_sync,
    };

    #[cfg(feature = "macros")]
    pub use crate::guard;
}

#[cfg(feature = "macros")]
pub use waypoint_macros::{Component, guard};
