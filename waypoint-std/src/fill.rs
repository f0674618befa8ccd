//! Param substitution with a compiled pattern cache.

use crate::diagnostics::Diagnostics;
use std::{
    collections::HashMap,
    sync::{LazyLock, Mutex, PoisonError},
};
use waypoint_core::{ConfigWarning, FillError, Params, PathPattern, PatternOptions};

static PATTERNS: LazyLock<Mutex<HashMap<String, PathPattern>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Substitute `params` into `path`, caching the compiled pattern.
pub fn fill(path: &str, params: &Params) -> Result<String, FillError> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(pattern) = cache.get(path) {
        return pattern.fill(params);
    }
    let pattern = PathPattern::compile(path, PatternOptions::default())?;
    let filled = pattern.fill(params);
    cache.insert(path.to_string(), pattern);
    filled
}

/// Like [`fill`], reporting failures as a warning and yielding an empty path.
pub(crate) fn fill_or_warn(
    path: &str,
    params: &Params,
    context: &str,
    diagnostics: &Diagnostics,
) -> String {
    match fill(path, params) {
        Ok(filled) => filled,
        Err(err) => {
            diagnostics.report(ConfigWarning::MissingParam {
                context: context.to_string(),
                message: err.to_string(),
            });
            String::new()
        }
    }
}
