//! Router configuration.

use serde::Deserialize;
use std::{fmt, sync::Arc};
use waypoint_core::Ticker;

/// Options for [`Router::new`](crate::Router::new).
///
/// Deserializable, except for the ticker, which is attached in code.
///
/// ```
/// use waypoint::RouterOptions;
///
/// let options = RouterOptions::new().base("app/").strict(true);
/// assert_eq!(options.base_path(), "/app");
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterOptions {
    base: String,
    strict: bool,
    case_sensitive: bool,
    #[serde(skip)]
    ticker: Option<Arc<dyn Ticker>>,
}

impl RouterOptions {
    /// Default options: no base, lenient trailing slashes, case-insensitive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for every generated href.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Whether trailing slashes are significant by default.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether patterns match case-sensitively by default.
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }

    /// Run enter callbacks on `ticker` instead of a host-drained frame queue.
    pub fn ticker(mut self, ticker: impl Ticker) -> Self {
        self.ticker = Some(Arc::new(ticker));
        self
    }

    /// The base with a leading `/` and without a trailing one; empty for the
    /// root.
    pub fn base_path(&self) -> String {
        normalize_base(&self.base)
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.strict
    }

    pub(crate) fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub(crate) fn take_ticker(&mut self) -> Option<Arc<dyn Ticker>> {
        self.ticker.take()
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("base", &self.base)
            .field("strict", &self.strict)
            .field("case_sensitive", &self.case_sensitive)
            .field("ticker", &self.ticker.is_some())
            .finish()
    }
}

fn normalize_base(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        String::new()
    } else if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    }
}
