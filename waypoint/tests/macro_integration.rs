#![cfg(feature = "macros")]

use waypoint::{
    BoxError, Component, FailureKind, Guard, MemoryHistory, Next, Route, RouteConfig, Router,
    RouterOptions,
};

#[waypoint::guard]
async fn block_admin(to: &Route) -> Result<Next, BoxError> {
    Ok(if to.path().starts_with("/admin") {
        Next::Abort
    } else {
        Next::Continue
    })
}

#[waypoint::guard(name = "RequireLogin", when = |to: &Route, _: &Route| to.meta().contains_key("auth"))]
async fn require_login(_to: &Route, _from: &Route) -> Result<Next, BoxError> {
    Ok(Next::redirect("/login"))
}

#[derive(Component)]
struct Dashboard;

fn router() -> Router {
    Router::new(
        &[
            RouteConfig::new("/").component(Dashboard),
            RouteConfig::new("/admin"),
            RouteConfig::new("/account").meta("auth", true),
            RouteConfig::new("/login"),
        ],
        RouterOptions::new(),
        MemoryHistory::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn guard_macro_generates_guard_type() {
    let start = Route::start();
    let router = router();
    let admin = router.resolve("/admin", None, false).unwrap().route;

    assert!(matches!(block_admin.check(&admin, &start).await.unwrap(), Next::Abort));
    assert!(matches!(block_admin.check(&start, &start).await.unwrap(), Next::Continue));
}

#[tokio::test]
async fn guard_macro_honors_when_predicate() {
    let router = router();
    router.before_each(block_admin);
    router.before_each(RequireLogin);

    router.push("/").await.unwrap();
    let err = router.push("/admin").await.unwrap_err();
    assert!(err.is_failure(FailureKind::ABORTED));

    let err = router.push("/account").await.unwrap_err();
    assert!(err.is_failure(FailureKind::REDIRECTED));
    assert_eq!(router.current_route().path(), "/login");
}

#[test]
fn derived_component_has_no_guards() {
    assert!(Dashboard.before_route_enter().is_empty());
    assert!(Dashboard.before_route_leave().is_empty());
}
