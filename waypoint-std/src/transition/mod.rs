//! Navigation transitions.
//!
//! A transition resolves a target, runs the guard queue, and commits the
//! new route exactly once if every guard lets it through. The queue runs in
//! this order:
//!
//! 1. leave guards of mounted components being left, innermost first
//! 2. global before hooks
//! 3. update guards of mounted components being reused
//! 4. `before_enter` guards of the records being entered
//! 5. loading of lazy components being entered
//! 6. enter guards of the components being entered
//! 7. global resolve hooks
//!
//! Starting a new transition while one is in flight supersedes it: the old
//! one ends as cancelled before its next guard.

mod engine;
mod queue;

pub use engine::{
    ENTER_POLL_INTERVAL, ErrorObserver, ReadyCallback, ReadyErrorCallback, RouteListener,
    TransitionEngine, UrlUpdate,
};
pub use queue::{ChainDiff, resolve_queue};
