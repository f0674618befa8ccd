use waypoint_std::{
    CompileOptions, Matcher, RouteConfig,
    waypoint_core::{PATH_MATCH, Params, QueryValue, RawLocation},
};

fn matcher(routes: Vec<RouteConfig>) -> Matcher {
    Matcher::from_routes(&routes, CompileOptions::default()).unwrap()
}

fn chain(route: &waypoint_std::waypoint_core::Route) -> Vec<String> {
    route.matched().iter().map(|record| record.path.clone()).collect()
}

#[test]
fn nested_routes_match_full_chain() {
    let matcher = matcher(vec![
        RouteConfig::new("/users/:id")
            .name("user")
            .child(RouteConfig::new("posts").name("user-posts")),
    ]);

    let route = matcher.resolve("/users/3/posts", None).unwrap();

    assert_eq!(route.name(), Some("user-posts"));
    assert_eq!(route.param("id"), Some("3"));
    assert_eq!(chain(&route), ["/users/:id", "/users/:id/posts"]);
}

#[test]
fn alias_keeps_its_path_and_matches_canonical_records() {
    let matcher = matcher(vec![
        RouteConfig::new("/home")
            .alias("/start")
            .child(RouteConfig::new("tab").name("tab")),
    ]);

    let route = matcher.resolve("/start/tab", None).unwrap();

    assert_eq!(route.path(), "/start/tab");
    assert_eq!(route.name(), Some("tab"));
    assert_eq!(chain(&route), ["/home", "/home/tab"]);
}

#[test]
fn named_redirect_carries_params() {
    let matcher = matcher(vec![
        RouteConfig::new("/users/:id").name("user"),
        RouteConfig::new("/u/:id").redirect(RawLocation::named("user")),
    ]);

    let route = matcher.resolve("/u/5?tab=info", None).unwrap();

    assert_eq!(route.full_path(), "/users/5?tab=info");
    assert_eq!(route.redirected_from(), Some("/u/5?tab=info"));
}

#[test]
fn relative_redirect_resolves_under_parent() {
    let matcher = matcher(vec![
        RouteConfig::new("/parent")
            .child(RouteConfig::new("old").redirect("new"))
            .child(RouteConfig::new("new")),
    ]);

    let route = matcher.resolve("/parent/old", None).unwrap();

    assert_eq!(route.path(), "/parent/new");
    assert_eq!(chain(&route), ["/parent", "/parent/new"]);
}

#[test]
fn redirect_target_query_merges_with_original() {
    let matcher = matcher(vec![
        RouteConfig::new("/search"),
        RouteConfig::new("/legacy").redirect("/search?q=x"),
    ]);

    let route = matcher.resolve("/legacy?page=2", None).unwrap();
    assert_eq!(route.full_path(), "/search?page=2&q=x");

    let route = matcher.resolve("/legacy?q=y&page=3", None).unwrap();
    assert_eq!(route.full_path(), "/search?page=3&q=x");
}

#[test]
fn redirect_chain_keeps_first_origin() {
    let matcher = matcher(vec![
        RouteConfig::new("/x").redirect("/a"),
        RouteConfig::new("/a").redirect("/b"),
        RouteConfig::new("/b").name("b"),
    ]);

    let route = matcher.resolve("/x", None).unwrap();

    assert_eq!(route.full_path(), "/b");
    assert_eq!(route.name(), Some("b"));
    assert_eq!(route.redirected_from(), Some("/x"));
}

#[test]
fn redirect_resolver_sees_matched_params() {
    let matcher = matcher(vec![
        RouteConfig::new("/users/:id"),
        RouteConfig::new("/profile/:id").redirect_with(|route| {
            Ok(RawLocation::path(format!(
                "/users/{}",
                route.param("id").unwrap_or_default()
            )))
        }),
    ]);

    let route = matcher.resolve("/profile/9", None).unwrap();

    assert_eq!(route.path(), "/users/9");
    assert_eq!(route.redirected_from(), Some("/profile/9"));
}

#[test]
fn catch_all_matches_last() {
    let matcher = matcher(vec![
        RouteConfig::new("*").name("not-found"),
        RouteConfig::new("/about"),
    ]);

    let about = matcher.resolve("/about", None).unwrap();
    let missing = matcher.resolve("/no/such/page", None).unwrap();

    assert_eq!(chain(&about), ["/about"]);
    assert_eq!(missing.name(), Some("not-found"));
    assert_eq!(missing.param(PATH_MATCH), Some("/no/such/page"));
}

#[test]
fn params_only_target_is_relative_to_current() {
    let matcher = matcher(vec![RouteConfig::new("/users/:id/:tab?").name("user")]);
    let current = matcher.resolve("/users/1/posts", None).unwrap();

    let mut params = Params::new();
    params.insert("id".into(), "2".into());
    let route = matcher
        .resolve(RawLocation::with_params(params), Some(&current))
        .unwrap();

    assert_eq!(route.path(), "/users/2/posts");
}

#[test]
fn explicit_query_overrides_path_query() {
    let matcher = matcher(vec![RouteConfig::new("/list")]);

    let route = matcher
        .resolve(RawLocation::path("/list?page=1&sort=asc").query("page", "3"), None)
        .unwrap();

    assert_eq!(route.query()["page"], QueryValue::from("3"));
    assert_eq!(route.full_path(), "/list?page=3&sort=asc");
}

#[test]
fn relative_paths_resolve_against_current() {
    let matcher = matcher(vec![
        RouteConfig::new("/docs/intro"),
        RouteConfig::new("/docs/setup"),
        RouteConfig::new("/docs/intro/more"),
    ]);
    let current = matcher.resolve("/docs/intro", None).unwrap();

    let sibling = matcher.resolve("setup", Some(&current)).unwrap();
    let appended = matcher
        .resolve(RawLocation::path("more").appending(), Some(&current))
        .unwrap();

    assert_eq!(sibling.path(), "/docs/setup");
    assert_eq!(appended.path(), "/docs/intro/more");
}

#[test]
fn routes_added_later_become_matchable() {
    let matcher = matcher(vec![RouteConfig::new("*")]);
    assert_eq!(chain(&matcher.resolve("/late", None).unwrap()), ["*"]);

    matcher
        .add_routes(&[RouteConfig::new("/late").name("late")])
        .unwrap();

    let route = matcher.resolve("/late", None).unwrap();
    assert_eq!(route.name(), Some("late"));
    assert_eq!(
        matcher.resolve(RawLocation::named("late"), None).unwrap().path(),
        "/late"
    );
}

#[test]
fn case_sensitivity_per_route() {
    let matcher = matcher(vec![
        RouteConfig::new("/about"),
        RouteConfig::new("/Exact").case_sensitive(true),
    ]);

    assert_eq!(chain(&matcher.resolve("/ABOUT", None).unwrap()), ["/about"]);
    assert!(matcher.resolve("/exact", None).unwrap().matched().is_empty());
}

#[test]
fn deserialized_configuration_compiles() {
    let routes: Vec<RouteConfig> = serde_json::from_str(
        r#"[
            { "path": "/", "name": "home" },
            { "path": "/old", "redirect": "/" },
            { "path": "/docs", "alias": "/help", "meta": { "section": true },
              "children": [ { "path": "intro", "name": "intro" } ] }
        ]"#,
    )
    .unwrap();
    let matcher = matcher(routes);

    assert_eq!(matcher.resolve("/old", None).unwrap().name(), Some("home"));
    let intro = matcher.resolve("/help/intro", None).unwrap();
    assert_eq!(intro.name(), Some("intro"));
    assert_eq!(chain(&intro), ["/docs", "/docs/intro"]);
    assert_eq!(intro.matched()[0].meta["section"], true);
}
