//! Location resolution.
//!
//! The [`Matcher`] owns the route table and turns navigation targets into
//! [`Route`]s. Named targets are looked up by name, path targets by testing
//! each pattern in order. Redirect and alias records are followed until a
//! plain record, or nothing, matches. Failing to match is not an error: the
//! result is a route with an empty `matched` list.

use crate::{
    config::RouteConfig,
    diagnostics::Diagnostics,
    fill::fill_or_warn,
    normalize::normalize_location,
    table::{CompileOptions, RouteTable},
};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use waypoint_core::{
    BoxError, ConfigError, ConfigWarning, Location, RawLocation, Route, RouteParts, RouteRecord,
    parse_path, parse_query, resolve_path, stringify_query,
};

/// Redirects and aliases followed before giving up.
pub const MAX_REDIRECTS: usize = 32;

/// Errors resolving a location.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A redirect resolver function failed.
    #[error("redirect resolver for \"{path}\" failed: {source}")]
    Redirect {
        /// Pattern of the redirecting record.
        path: String,
        /// The resolver's error.
        #[source]
        source: BoxError,
    },

    /// Redirects or aliases kept pointing at each other.
    #[error("too many redirects while resolving \"{0}\"")]
    TooManyRedirects(String),
}

/// Resolves locations against a route table.
#[derive(Debug)]
pub struct Matcher {
    table: RwLock<RouteTable>,
}

impl Matcher {
    /// Wrap a compiled table.
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Compile `routes` and wrap the result.
    pub fn from_routes(routes: &[RouteConfig], options: CompileOptions) -> Result<Self, ConfigError> {
        Ok(Self::new(RouteTable::compile(routes, options)?))
    }

    /// Compile more routes into the table.
    pub fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_routes(routes)
    }

    /// The table's warning sink.
    pub fn diagnostics(&self) -> Diagnostics {
        self.with_table(|table| table.diagnostics().clone())
    }

    /// Run `f` with read access to the table.
    pub fn with_table<R>(&self, f: impl FnOnce(&RouteTable) -> R) -> R {
        f(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Normalize `raw` against `current` without matching it.
    pub fn normalize(&self, raw: &RawLocation, current: Option<&Route>, append: bool) -> Location {
        self.with_table(|table| normalize_location(raw, current, append, table.diagnostics()))
    }

    /// Resolve `raw` relative to `current`.
    pub fn resolve(
        &self,
        raw: impl Into<RawLocation>,
        current: Option<&Route>,
    ) -> Result<Route, ResolveError> {
        self.resolve_from(&raw.into(), current, None)
    }

    /// Resolve `raw`, recording `redirected_from` as the location that led here.
    pub fn resolve_from(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Result<Route, ResolveError> {
        self.with_table(|table| {
            let location = normalize_location(raw, current, false, table.diagnostics());
            Resolution { table, hops: 0 }.match_location(location, current, redirected_from)
        })
    }
}

struct Resolution<'a> {
    table: &'a RouteTable,
    hops: usize,
}

impl Resolution<'_> {
    fn match_location(
        &mut self,
        mut location: Location,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Result<Route, ResolveError> {
        let table = self.table;

        if let Some(name) = location.name.clone() {
            let Some(record) = table.by_name(&name) else {
                table
                    .diagnostics()
                    .report(ConfigWarning::UnknownNamedRoute { name });
                return Ok(self.create_route(None, &location, None));
            };

            if let Some(current) = current {
                let required: Vec<&str> = record.pattern.required_params().collect();
                for (key, value) in current.params() {
                    if required.contains(&key.as_str()) && !location.params.contains_key(key) {
                        location.params.insert(key.clone(), value.clone());
                    }
                }
            }
            location.path = Some(fill_or_warn(
                &record.path,
                &location.params,
                &format!("named route \"{name}\""),
                table.diagnostics(),
            ));
            return self.create(Some(record), location, redirected_from);
        }

        if let Some(path) = location.path.clone().filter(|path| !path.is_empty()) {
            location.params.clear();
            for record in table.ordered_records() {
                if let Some(params) = record.pattern.captures(&path) {
                    location.params = params;
                    return self.create(Some(record), location, redirected_from);
                }
            }
        }

        Ok(self.create_route(None, &location, None))
    }

    fn create(
        &mut self,
        record: Option<&Arc<RouteRecord>>,
        location: Location,
        redirected_from: Option<&Location>,
    ) -> Result<Route, ResolveError> {
        if let Some(record) = record {
            if record.redirect.is_some() {
                return self.redirect(record, redirected_from.unwrap_or(&location));
            }
            if let Some(match_as) = &record.match_as {
                return self.alias(match_as, location);
            }
        }
        Ok(self.create_route(record, &location, redirected_from))
    }

    fn redirect(
        &mut self,
        record: &Arc<RouteRecord>,
        location: &Location,
    ) -> Result<Route, ResolveError> {
        self.hop(location)?;
        let table = self.table;
        let Some(redirect) = &record.redirect else {
            return Ok(self.create_route(Some(record), location, None));
        };
        let target = redirect
            .target(&self.create_route(Some(record), location, None))
            .map_err(|source| ResolveError::Redirect {
                path: record.path.clone(),
                source,
            })?;

        let mut query = target.query.unwrap_or_else(|| location.query.clone());
        let mut hash = target.hash.unwrap_or_else(|| location.hash.clone());
        let params = target.params.unwrap_or_else(|| location.params.clone());
        let diagnostics = table.diagnostics();

        if let Some(name) = target.name {
            if table.by_name(&name).is_none() {
                diagnostics.report(ConfigWarning::UnknownNamedRoute { name: name.clone() });
            }
            let next = Location {
                name: Some(name),
                params,
                query,
                hash,
                ..Location::default()
            };
            return self.match_location(next, None, Some(location));
        }

        if let Some(path) = target.path.filter(|path| !path.is_empty()) {
            let parsed = parse_path(&path);
            // Keys written into the target win over the original query.
            query.extend(parse_query(&parsed.query));
            if hash.is_empty() {
                hash = parsed.hash;
            }

            let parent = record
                .parent
                .and_then(|id| table.record(id))
                .map(|parent| parent.path.as_str())
                .unwrap_or("/");
            let raw_path = resolve_path(&parsed.path, parent, true);
            let next = Location {
                path: Some(fill_or_warn(
                    &raw_path,
                    &params,
                    &format!("redirect route with path \"{raw_path}\""),
                    diagnostics,
                )),
                query,
                hash,
                ..Location::default()
            };
            return self.match_location(next, None, Some(location));
        }

        diagnostics.report(ConfigWarning::InvalidRedirect {
            path: record.path.clone(),
        });
        Ok(self.create_route(None, location, None))
    }

    fn alias(&mut self, match_as: &str, mut location: Location) -> Result<Route, ResolveError> {
        self.hop(&location)?;
        let canonical = fill_or_warn(
            match_as,
            &location.params,
            &format!("aliased route with path \"{match_as}\""),
            self.table.diagnostics(),
        );
        let aliased = self.match_location(Location::from_path(canonical), None, None)?;
        match aliased.matched().last() {
            Some(record) => {
                location.params = aliased.params().clone();
                self.create(Some(record), location, None)
            }
            None => Ok(self.create_route(None, &location, None)),
        }
    }

    fn hop(&mut self, location: &Location) -> Result<(), ResolveError> {
        self.hops += 1;
        if self.hops > MAX_REDIRECTS {
            return Err(ResolveError::TooManyRedirects(full_path(location)));
        }
        Ok(())
    }

    fn create_route(
        &self,
        record: Option<&Arc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
    ) -> Route {
        Route::new(RouteParts {
            name: location
                .name
                .clone()
                .or_else(|| record.and_then(|record| record.name.clone())),
            path: location.path.clone().unwrap_or_default(),
            hash: location.hash.clone(),
            query: location.query.clone(),
            params: location.params.clone(),
            matched: record
                .map(|record| self.table.ancestry(record))
                .unwrap_or_default(),
            redirected_from: redirected_from.map(full_path),
        })
    }
}

fn full_path(location: &Location) -> String {
    let path = location.path.as_deref().filter(|path| !path.is_empty()).unwrap_or("/");
    format!("{path}{}{}", stringify_query(&location.query), location.hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(routes: Vec<RouteConfig>) -> Matcher {
        Matcher::from_routes(&routes, CompileOptions::default()).unwrap()
    }

    #[test]
    fn resolves_path_to_named_record() {
        let matcher = matcher(vec![
            RouteConfig::new("/").name("home"),
            RouteConfig::new("/users/:id").name("user"),
        ]);
        let route = matcher.resolve("/users/42", None).unwrap();
        assert_eq!(route.name(), Some("user"));
        assert_eq!(route.path(), "/users/42");
        assert_eq!(route.param("id"), Some("42"));
        assert_eq!(route.matched().len(), 1);
        assert_eq!(route.matched()[0].path, "/users/:id");

        let home = matcher.resolve("/", None).unwrap();
        assert_eq!(home.name(), Some("home"));
    }

    #[test]
    fn unknown_targets_resolve_to_no_match() {
        let matcher = matcher(vec![RouteConfig::new("/a")]);
        let route = matcher.resolve("/nope?x=1", None).unwrap();
        assert!(route.matched().is_empty());
        assert_eq!(route.full_path(), "/nope?x=1");

        let named = matcher.resolve(RawLocation::named("ghost"), None).unwrap();
        assert!(named.matched().is_empty());
        assert!(matcher.diagnostics().warnings().contains(&ConfigWarning::UnknownNamedRoute {
            name: "ghost".into()
        }));
    }

    #[test]
    fn named_navigation_inherits_required_params() {
        let matcher = matcher(vec![
            RouteConfig::new("/:lang/about").name("about"),
            RouteConfig::new("/:lang/home/:section?").name("home"),
        ]);
        let current = matcher.resolve("/fr/home/news", None).unwrap();
        let about = matcher.resolve(RawLocation::named("about"), Some(&current)).unwrap();
        assert_eq!(about.path(), "/fr/about");
        assert!(about.param("section").is_none());
    }

    #[test]
    fn idempotent_on_normalized_location() {
        let matcher = matcher(vec![RouteConfig::new("/users/:id")]);
        let location = matcher.normalize(&"/users/7?a=1#x".into(), None, false);
        let first = matcher.resolve(RawLocation::from(location.clone()), None).unwrap();
        let second = matcher.resolve(RawLocation::from(location), None).unwrap();
        assert_eq!(first.full_path(), second.full_path());
        assert_eq!(first.full_path(), "/users/7?a=1#x");
    }

    #[test]
    fn redirect_loops_are_cut_off() {
        let matcher = matcher(vec![
            RouteConfig::new("/ping").redirect("/pong"),
            RouteConfig::new("/pong").redirect("/ping"),
        ]);
        assert!(matches!(
            matcher.resolve("/ping", None),
            Err(ResolveError::TooManyRedirects(_))
        ));
    }

    #[test]
    fn redirect_resolver_errors_propagate() {
        let matcher = matcher(vec![
            RouteConfig::new("/fail").redirect_with(|_| Err("no target".into())),
        ]);
        let err = matcher.resolve("/fail", None).unwrap_err();
        assert!(matches!(err, ResolveError::Redirect { ref path, .. } if path == "/fail"));
    }

    #[test]
    fn invalid_redirect_warns() {
        let matcher = matcher(vec![RouteConfig::new("/empty").redirect(RawLocation::default())]);
        let route = matcher.resolve("/empty", None).unwrap();
        assert!(route.matched().is_empty());
        assert!(matcher.diagnostics().warnings().contains(&ConfigWarning::InvalidRedirect {
            path: "/empty".into()
        }));
    }
}
