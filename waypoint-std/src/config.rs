//! Declarative route definitions.
//!
//! A [`RouteConfig`] tree is what applications write; the compiler in
//! [`crate::table`] turns it into records. Trees can be built in code or
//! deserialized, in which case guards, components and computed redirects
//! are attached afterwards.
//!
//! ```
//! use waypoint_std::RouteConfig;
//!
//! let routes = vec![
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/users/:id")
//!         .name("user")
//!         .child(RouteConfig::new("posts").name("user-posts")),
//!     RouteConfig::new("/old").redirect("/"),
//! ];
//! # let _ = routes;
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use waypoint_core::{
    BoxError, Component, ComponentSlot, DEFAULT_SLOT, DynGuard, Guard, LazyComponent, Meta, Props,
    RawLocation, Redirect, Route,
};

/// One route definition, possibly with nested children.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteConfig {
    /// Path pattern. Required; relative paths nest under the parent.
    pub path: Option<String>,
    /// Unique route name.
    pub name: Option<String>,
    /// Extra paths resolving to this route.
    #[serde(deserialize_with = "one_or_many")]
    pub alias: Vec<String>,
    /// Where to send navigations that match this route.
    #[serde(deserialize_with = "literal_redirect")]
    pub redirect: Option<Redirect>,
    /// Opaque metadata.
    pub meta: Meta,
    /// Nested routes.
    pub children: Vec<RouteConfig>,
    /// Override case sensitivity for this pattern.
    pub case_sensitive: Option<bool>,
    /// Override trailing slash strictness for this pattern.
    pub strict: Option<bool>,
    /// Components by slot name.
    #[serde(skip)]
    pub components: BTreeMap<String, ComponentSlot>,
    /// Props by slot name.
    #[serde(skip)]
    pub props: BTreeMap<String, Props>,
    /// Guard run before entering this route.
    #[serde(skip)]
    pub before_enter: Option<Arc<dyn DynGuard>>,
}

impl RouteConfig {
    /// A definition for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Set the route name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an alias path.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    /// Redirect matching navigations to a fixed target.
    pub fn redirect(mut self, to: impl Into<Redirect>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    /// Redirect matching navigations to a target computed from the route.
    pub fn redirect_with<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&Route) -> Result<RawLocation, BoxError> + Send + Sync + 'static,
    {
        self.redirect = Some(Redirect::resolver(resolve));
        self
    }

    /// Add a meta entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Add a nested route.
    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Add several nested routes.
    pub fn children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the default slot's component.
    pub fn component(self, component: impl Component) -> Self {
        self.slot(DEFAULT_SLOT, ComponentSlot::ready(component))
    }

    /// Set the default slot's component, loaded on first use.
    pub fn lazy_component(self, loader: impl LazyComponent) -> Self {
        self.slot(DEFAULT_SLOT, ComponentSlot::lazy(loader))
    }

    /// Set a named slot.
    pub fn slot(mut self, name: impl Into<String>, slot: ComponentSlot) -> Self {
        self.components.insert(name.into(), slot);
        self
    }

    /// Set the default slot's props.
    pub fn props(self, props: impl Into<Props>) -> Self {
        self.slot_props(DEFAULT_SLOT, props)
    }

    /// Set a named slot's props.
    pub fn slot_props(mut self, name: impl Into<String>, props: impl Into<Props>) -> Self {
        self.props.insert(name.into(), props.into());
        self
    }

    /// Guard entering this route.
    pub fn before_enter(mut self, guard: impl Guard) -> Self {
        self.before_enter = Some(Arc::new(guard));
        self
    }

    /// Match this pattern case-sensitively or not.
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    /// Require or ignore an exact trailing slash.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(alias) => vec![alias],
        OneOrMany::Many(aliases) => aliases,
    })
}

fn literal_redirect<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Redirect>, D::Error> {
    Ok(Option::<RawLocation>::deserialize(deserializer)?.map(Redirect::Literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_route_tree() {
        let routes: Vec<RouteConfig> = serde_json::from_str(
            r#"[
                {"path": "/", "name": "home", "meta": {"title": "Home"}},
                {"path": "/a", "alias": "/b", "children": [{"path": "c"}]},
                {"path": "/old", "redirect": {"name": "home"}, "caseSensitive": true},
                {"name": "broken"}
            ]"#,
        )
        .unwrap();

        assert_eq!(routes[0].meta["title"], "Home");
        assert_eq!(routes[1].alias, vec!["/b".to_string()]);
        assert_eq!(routes[1].children[0].path.as_deref(), Some("c"));
        assert!(matches!(
            &routes[2].redirect,
            Some(Redirect::Literal(to)) if to.name.as_deref() == Some("home")
        ));
        assert_eq!(routes[2].case_sensitive, Some(true));
        assert!(routes[3].path.is_none());
    }

    #[test]
    fn builder_sets_default_slot() {
        struct View;
        impl Component for View {}

        let route = RouteConfig::new("/a").component(View).props(true);
        assert!(route.components.contains_key(DEFAULT_SLOT));
        assert!(matches!(route.props[DEFAULT_SLOT], Props::Params));
    }
}
