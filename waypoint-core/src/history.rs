//! The platform history contract.
//!
//! A history backend owns the URL representation: a browser address bar, a
//! native navigation stack, or an in-memory list. Locations are exchanged
//! as route full paths; backends that serve the app under a base path add
//! and strip it themselves.

use std::{future::Future, pin::Pin, sync::Arc};

/// Work started by a [`PopListener`]; the backend drives it to completion.
pub type PopFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Called by a backend when the platform moves to another location on its
/// own, such as a back button press.
pub type PopListener = Arc<dyn Fn(String) -> PopFuture + Send + Sync>;

/// A history backend.
pub trait History: Send + Sync + 'static {
    /// Add an entry for `full_path`.
    fn push(&self, full_path: &str);

    /// Replace the current entry with `full_path`.
    fn replace(&self, full_path: &str);

    /// Move `delta` entries.
    ///
    /// Backends that move synchronously return the location they arrived
    /// at. Backends that move asynchronously return `None` and report the
    /// arrival through their pop listener.
    fn go(&self, delta: isize) -> Option<String>;

    /// The location currently represented by the platform.
    fn current_location(&self) -> String;

    /// Start reporting platform-initiated moves to `listener`.
    fn setup_listeners(&self, listener: PopListener) {
        let _ = listener;
    }

    /// Release platform listeners.
    fn teardown(&self) {}
}
