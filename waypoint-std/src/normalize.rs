//! Location normalization.
//!
//! Turns a [`RawLocation`] into a [`Location`] that the matcher can use
//! directly. Rules, first match wins:
//!
//! 1. already normalized targets are returned as they are
//! 2. named targets are copied, never resolved against the current path
//! 3. params-only targets merge into the current route's params
//! 4. paths are resolved against the current path, the query string is
//!    merged with explicit query entries and the hash gets its `#`

use crate::{diagnostics::Diagnostics, fill::fill_or_warn};
use waypoint_core::{
    ConfigWarning, Location, RawLocation, Route, parse_path, resolve_path, resolve_query,
};

/// Normalize `raw` relative to `current`.
///
/// `append` resolves relative paths below the current path instead of next
/// to it, as does the target's own `append` flag.
pub fn normalize_location(
    raw: &RawLocation,
    current: Option<&Route>,
    append: bool,
    diagnostics: &Diagnostics,
) -> Location {
    if raw.is_normalized() || raw.name.is_some() {
        return copy_location(raw);
    }

    if let (None, Some(params), Some(current)) = (&raw.path, &raw.params, current) {
        let mut merged = current.params().clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut location = copy_location(raw);
        if let Some(name) = current.name() {
            location.name = Some(name.to_string());
            location.params = merged;
        } else if let Some(record) = current.matched().last() {
            location.path = Some(fill_or_warn(
                &record.path,
                &merged,
                &format!("path {}", current.path()),
                diagnostics,
            ));
            location.params = merged;
        } else {
            diagnostics.report(ConfigWarning::RelativeParamsWithoutCurrent);
        }
        return location;
    }

    let parsed = parse_path(raw.path.as_deref().unwrap_or_default());
    let base = current.map(Route::path).unwrap_or("/");
    let path = if parsed.path.is_empty() {
        base.to_string()
    } else {
        resolve_path(&parsed.path, base, append || raw.append)
    };
    let query = resolve_query(&parsed.query, raw.query.as_ref());
    let hash = match raw.hash.as_deref().filter(|hash| !hash.is_empty()) {
        Some(hash) => hash.to_string(),
        None => parsed.hash,
    };
    let hash = if hash.is_empty() || hash.starts_with('#') {
        hash
    } else {
        format!("#{hash}")
    };

    Location {
        name: None,
        path: Some(path),
        params: Default::default(),
        query,
        hash,
        append: raw.append,
        replace: raw.replace,
    }
}

fn copy_location(raw: &RawLocation) -> Location {
    Location {
        name: raw.name.clone(),
        path: raw.path.clone(),
        params: raw.params.clone().unwrap_or_default(),
        query: raw.query.clone().unwrap_or_default(),
        hash: raw.hash.clone().unwrap_or_default(),
        append: raw.append,
        replace: raw.replace,
    }
}
