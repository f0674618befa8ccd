//! Standard guards and hooks.

mod conditional;
mod logging;
#[cfg(feature = "tokio")]
mod timeout;

pub use conditional::{ConditionalGuard, when_meta};
pub use logging::{LoggingAfterHook, LoggingGuard};
#[cfg(feature = "tokio")]
pub use timeout::{TimeoutError, TimeoutGuard};
