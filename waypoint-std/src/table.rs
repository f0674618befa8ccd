//! Route table compilation.
//!
//! The compiler walks a [`RouteConfig`] tree depth-first and produces three
//! indices over an arena of [`RouteRecord`]s: the ordered list of distinct
//! path patterns, records by pattern, and records by name.
//!
//! Registration is first-wins for both patterns and names, so compiling the
//! same definitions again leaves the table as it was. Patterns equal to the
//! `*` wildcard always sort after every other pattern.

use crate::{config::RouteConfig, diagnostics::Diagnostics};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use waypoint_core::{
    ConfigError, ConfigWarning, PathPattern, PatternOptions, RecordId, RouteRecord, clean_path,
};

/// Table-wide pattern defaults. Definitions may override them per route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Match patterns case-sensitively.
    pub case_sensitive: bool,
    /// Keep trailing slashes significant.
    pub strict: bool,
}

/// Compiled routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    records: Vec<Arc<RouteRecord>>,
    paths: Vec<String>,
    by_path: HashMap<String, RecordId>,
    by_name: HashMap<String, RecordId>,
    options: CompileOptions,
    diagnostics: Diagnostics,
}

impl RouteTable {
    /// An empty table.
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Compile `routes` into a fresh table.
    pub fn compile(routes: &[RouteConfig], options: CompileOptions) -> Result<Self, ConfigError> {
        let mut table = Self::new(options);
        table.add_routes(routes)?;
        Ok(table)
    }

    /// Compile more routes into this table.
    ///
    /// Existing records and registrations are never touched. On error the
    /// routes compiled before the failing definition stay registered.
    pub fn add_routes(&mut self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        let result = routes
            .iter()
            .try_for_each(|route| self.add_record(route, None, None));

        self.move_wildcards_last();
        self.check_leading_slashes();
        result
    }

    /// The sink receiving this table's warnings.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Replace the warning sink.
    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    /// Distinct path patterns in match order.
    pub fn ordered_paths(&self) -> &[String] {
        &self.paths
    }

    /// Records in match order.
    pub fn ordered_records(&self) -> impl Iterator<Item = &Arc<RouteRecord>> {
        self.paths.iter().filter_map(|path| self.by_path(path))
    }

    /// A record by id.
    pub fn record(&self, id: RecordId) -> Option<&Arc<RouteRecord>> {
        self.records.get(id.index())
    }

    /// The record registered for a normalized pattern.
    pub fn by_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
        self.by_path.get(path).and_then(|id| self.record(*id))
    }

    /// The record registered under `name`.
    pub fn by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.by_name.get(name).and_then(|id| self.record(*id))
    }

    /// Registered route names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// `record` and its ancestors, outermost first.
    pub fn ancestry(&self, record: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
        let mut chain = vec![record.clone()];
        let mut parent = record.parent;
        while let Some(record) = parent.and_then(|id| self.record(id)) {
            chain.push(record.clone());
            parent = record.parent;
        }
        chain.reverse();
        chain
    }

    fn add_record(
        &mut self,
        route: &RouteConfig,
        parent: Option<RecordId>,
        match_as: Option<String>,
    ) -> Result<(), ConfigError> {
        let Some(path) = route.path.as_deref() else {
            return Err(ConfigError::MissingPath {
                name: route.name.clone(),
            });
        };

        let options = PatternOptions {
            sensitive: route.case_sensitive.unwrap_or(self.options.case_sensitive),
            strict: route.strict.unwrap_or(self.options.strict),
        };
        let parent_path = parent
            .and_then(|id| self.record(id))
            .map(|record| record.path.clone());
        let normalized = normalize_path(path, parent_path.as_deref(), options.strict);
        let pattern = PathPattern::compile(&normalized, options).map_err(|source| {
            ConfigError::InvalidPattern {
                path: normalized.clone(),
                source,
            }
        })?;

        for param in pattern.duplicate_params() {
            self.diagnostics.report(ConfigWarning::DuplicateParam {
                path: normalized.clone(),
                param: param.to_string(),
            });
        }
        if let Some(name) = &route.name {
            let has_default_child = route
                .children
                .iter()
                .any(|child| matches!(child.path.as_deref(), Some("" | "/")));
            if route.redirect.is_none() && has_default_child {
                self.diagnostics
                    .report(ConfigWarning::NamedRouteWithDefaultChild { name: name.clone() });
            }
        }

        let id = RecordId::new(self.records.len());
        self.records.push(Arc::new(RouteRecord {
            id,
            path: normalized.clone(),
            pattern,
            name: route.name.clone(),
            parent,
            redirect: route.redirect.clone(),
            match_as: match_as.clone(),
            meta: route.meta.clone(),
            components: route.components.clone(),
            props: route.props.clone(),
            before_enter: route.before_enter.clone(),
        }));

        for child in &route.children {
            let child_match_as = match_as.as_ref().map(|prefix| {
                clean_path(&format!("{prefix}/{}", child.path.as_deref().unwrap_or_default()))
            });
            self.add_record(child, Some(id), child_match_as)?;
        }

        let registered = !self.by_path.contains_key(&normalized);
        if registered {
            self.paths.push(normalized.clone());
            self.by_path.insert(normalized.clone(), id);
        }

        for alias in &route.alias {
            if alias == path {
                self.diagnostics
                    .report(ConfigWarning::AliasSameAsPath { path: path.to_string() });
                continue;
            }
            let alias_route = RouteConfig {
                path: Some(alias.clone()),
                children: route.children.clone(),
                ..RouteConfig::default()
            };
            let canonical = if normalized.is_empty() { "/" } else { &normalized };
            self.add_record(&alias_route, parent, Some(canonical.to_string()))?;
        }

        if let Some(name) = &route.name {
            if self.by_name.contains_key(name) {
                if match_as.is_none() {
                    self.diagnostics.report(ConfigWarning::DuplicateName {
                        name: name.clone(),
                        path: normalized,
                    });
                }
            } else if registered {
                self.by_name.insert(name.clone(), id);
            }
        }
        Ok(())
    }

    fn move_wildcards_last(&mut self) {
        let (mut ordered, wildcards): (Vec<_>, Vec<_>) =
            self.paths.drain(..).partition(|path| path != "*");
        ordered.extend(wildcards);
        self.paths = ordered;
    }

    fn check_leading_slashes(&self) {
        for path in &self.paths {
            if !path.is_empty() && !path.starts_with(['*', '/']) {
                self.diagnostics
                    .report(ConfigWarning::MissingLeadingSlash { path: path.clone() });
            }
        }
    }
}

fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };
    match parent {
        Some(parent) if !path.starts_with('/') => clean_path(&format!("{parent}/{path}")),
        _ => path.to_string(),
    }
}
