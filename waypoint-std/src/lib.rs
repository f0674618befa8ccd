//! # waypoint-std
//!
//! Route compilation, matching and navigation for Waypoint.
//!
//! This crate provides:
//! - **Configuration**: [`RouteConfig`] trees, deserializable or built in code
//! - **Compilation**: [`RouteTable`] with ordered paths and name lookup
//! - **Matching**: [`Matcher`] resolving targets to routes, with redirects and aliases
//! - **Transitions**: [`TransitionEngine`] running guard queues and committing routes
//! - **Backends**: [`MemoryHistory`], [`FrameTicker`] and, with `tokio`, `TokioTicker`
//! - **Standard hooks**: Logging, Conditional, Timeout
//! - **Testing**: recorders and scripted components in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use waypoint_core;

// Modules
pub mod config;
pub mod diagnostics;
pub mod fill;
pub mod history;
pub mod hooks;
pub mod instances;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod table;
pub mod testing;
pub mod tick;
pub mod transition;

pub use config::RouteConfig;
pub use diagnostics::Diagnostics;
pub use history::{HistoryOp, MemoryHistory};
pub use instances::InstanceRegistry;
pub use matcher::{MAX_REDIRECTS, Matcher, ResolveError};
pub use normalize::normalize_location;
pub use registry::{HookHandle, HookList};
pub use table::{CompileOptions, RouteTable};
#[cfg(feature = "tokio")]
pub use tick::TokioTicker;
pub use tick::FrameTicker;
pub use transition::{TransitionEngine, UrlUpdate};
