//! Procedural macros for Waypoint.
//!
//! - `#[guard]` turns an async function into a navigation guard type
//! - `#[derive(Component)]` implements a component without in-component guards

use proc_macro::TokenStream;

mod component;
mod guard;

/// Derive `Component` with the default (empty) guard lists.
#[proc_macro_derive(Component)]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::expand(input)
}

/// Turn an async function into a navigation guard.
///
/// The function takes the target route and, optionally, the route being
/// left, and returns `Result<Next, BoxError>`. A unit struct with the
/// function's name (or `name = "..."`) implementing `Guard` replaces it.
///
/// `when = <expr>` skips the body, letting the navigation through, unless
/// `expr(to, from)` holds.
///
/// ```rust,ignore
/// #[waypoint::guard(when = |to: &Route, _: &Route| to.meta().contains_key("auth"))]
/// async fn require_login(to: &Route) -> Result<Next, BoxError> {
///     Ok(Next::redirect("/login"))
/// }
///
/// router.before_each(require_login);
/// ```
#[proc_macro_attribute]
pub fn guard(attr: TokenStream, item: TokenStream) -> TokenStream {
    guard::expand(attr, item)
}
