use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use waypoint_std::{
    HistoryOp, MemoryHistory, RouteConfig,
    testing::{RecordingGuard, ScriptedGuard, TestComponent, TestInstance, Verdict},
    transition::ENTER_POLL_INTERVAL,
    waypoint_core::{
        BoxError, Component, FailureKind, NavigationError, Next, RawLocation, Route, guard_sync,
        lazy,
    },
};

mod common;
use common::Harness;

fn simple_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/a"),
        RouteConfig::new("/b"),
        RouteConfig::new("/c"),
    ]
}

#[tokio::test]
async fn guards_run_in_queue_order() {
    let h = Harness::new(Vec::new());
    let log = h.log.clone();
    h.engine
        .matcher()
        .add_routes(&[
            RouteConfig::new("/a")
                .component(TestComponent::new().on_leave(RecordingGuard::new("leave", &log))),
            RouteConfig::new("/b")
                .before_enter(RecordingGuard::new("beforeEnter", &log))
                .component(TestComponent::new().on_enter(RecordingGuard::new("enter", &log))),
        ])
        .unwrap();
    h.engine.before_each(RecordingGuard::new("beforeEach", &log));
    h.engine.before_resolve(RecordingGuard::new("beforeResolve", &log));
    h.engine.after_each(log.after_hook("afterEach"));

    h.engine.push("/a").await.unwrap();
    h.engine
        .instances()
        .register(h.record_id("/a"), "default", TestInstance::new("a"));
    log.clear();

    h.engine.push("/b").await.unwrap();

    assert_eq!(
        log.entries(),
        vec!["leave", "beforeEach", "beforeEnter", "enter", "beforeResolve", "afterEach"]
    );
}

#[tokio::test]
async fn reused_components_see_update_guards() {
    let h = Harness::new(Vec::new());
    let log = h.log.clone();
    h.engine
        .matcher()
        .add_routes(&[RouteConfig::new("/users/:id")
            .before_enter(RecordingGuard::new("beforeEnter", &log))
            .component(TestComponent::new().on_update(RecordingGuard::new("update", &log)))])
        .unwrap();
    h.engine.before_each(RecordingGuard::new("beforeEach", &log));

    h.engine.push("/users/1").await.unwrap();
    h.engine
        .instances()
        .register(h.record_id("/users/:id"), "default", TestInstance::new("user"));
    log.clear();

    let route = h.engine.push("/users/2").await.unwrap();

    assert_eq!(route.param("id"), Some("2"));
    assert_eq!(log.entries(), vec!["beforeEach", "update"]);
}

#[tokio::test]
async fn unmounted_components_skip_leave_guards() {
    let h = Harness::new(Vec::new());
    let log = h.log.clone();
    h.engine
        .matcher()
        .add_routes(&[
            RouteConfig::new("/a")
                .component(TestComponent::new().on_leave(RecordingGuard::new("leave", &log))),
            RouteConfig::new("/b"),
        ])
        .unwrap();

    h.engine.push("/a").await.unwrap();
    h.engine.push("/b").await.unwrap();

    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn duplicate_navigation_fails_without_touching_history() {
    let h = Harness::new(simple_routes());

    h.engine.push("/a").await.unwrap();
    let err = h.engine.push("/a").await.unwrap_err();

    assert!(err.is_failure(FailureKind::DUPLICATED));
    assert_eq!(h.history.ops(), vec![HistoryOp::Push("/a".into())]);
}

#[tokio::test]
async fn query_change_is_not_a_duplicate() {
    let h = Harness::new(simple_routes());

    h.engine.push("/a").await.unwrap();
    let route = h.engine.push("/a?page=2").await.unwrap();

    assert_eq!(route.full_path(), "/a?page=2");
}

#[tokio::test]
async fn aborting_guard_keeps_current_route() {
    let h = Harness::new(simple_routes());
    h.engine.before_each(guard_sync(|to, _| {
        Ok(if to.path() == "/b" { Next::Abort } else { Next::Continue })
    }));

    h.engine.push("/a").await.unwrap();
    let err = h.engine.push("/b").await.unwrap_err();

    assert!(err.is_failure(FailureKind::ABORTED));
    assert_eq!(h.current_path(), "/a");
    assert_eq!(h.history.ops(), vec![HistoryOp::Push("/a".into())]);
}

#[tokio::test]
async fn aborted_pop_restores_the_url() {
    let h = Harness::new(simple_routes());
    let block_a = Arc::new(AtomicBool::new(false));
    let flag = block_a.clone();
    h.engine.before_each(guard_sync(move |to, _| {
        Ok((to.path() != "/a" || !flag.load(Ordering::SeqCst)).into())
    }));
    h.engine.setup_listeners();

    h.engine.push("/a").await.unwrap();
    h.engine.push("/b").await.unwrap();
    block_a.store(true, Ordering::SeqCst);
    h.history.clear_ops();

    assert!(h.history.pop(-1).await);

    assert_eq!(h.current_path(), "/b");
    assert_eq!(h.history.ops(), vec![HistoryOp::Push("/b".into())]);
}

#[tokio::test]
async fn guard_redirect_navigates_to_new_target() {
    let h = Harness::new(vec![RouteConfig::new("/private"), RouteConfig::new("/login")]);
    h.engine.before_each(guard_sync(|to, _| {
        Ok(if to.path() == "/private" {
            Next::redirect("/login")
        } else {
            Next::Continue
        })
    }));

    let err = h.engine.push("/private").await.unwrap_err();

    assert!(err.is_failure(FailureKind::REDIRECTED));
    assert_eq!(h.current_path(), "/login");
    assert_eq!(h.history.ops(), vec![HistoryOp::Push("/login".into())]);
}

#[tokio::test]
async fn replacing_redirect_replaces_history_entry() {
    let h = Harness::new(vec![RouteConfig::new("/private"), RouteConfig::new("/login")]);
    h.engine.before_each(guard_sync(|to, _| {
        Ok(if to.path() == "/private" {
            Next::Redirect(RawLocation::path("/login").replacing())
        } else {
            Next::Continue
        })
    }));

    let _ = h.engine.push("/private").await;

    assert_eq!(h.history.ops(), vec![HistoryOp::Replace("/login".into())]);
}

#[tokio::test]
async fn newer_navigation_cancels_pending_one() {
    let h = Harness::new(simple_routes());
    let (gate_guard, gate) = RecordingGuard::new("gate", &h.log).gated();
    h.engine.before_each(gate_guard);

    let slow = tokio::spawn({
        let engine = h.engine.clone();
        async move { engine.push("/a").await }
    });
    tokio::task::yield_now().await;
    assert_eq!(h.engine.pending().map(|r| r.path().to_string()), Some("/a".into()));

    let fast = h.engine.push("/b").await.unwrap();
    gate.open();
    let slow = slow.await.unwrap().unwrap_err();

    assert_eq!(fast.path(), "/b");
    assert!(slow.is_failure(FailureKind::CANCELLED));
    assert_eq!(h.current_path(), "/b");
    assert_eq!(h.history.ops(), vec![HistoryOp::Push("/b".into())]);
    assert!(h.engine.pending().is_none());
}

#[tokio::test]
async fn guard_errors_reach_observers_but_failures_do_not() {
    let h = Harness::new(simple_routes());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    h.engine.on_error(move |err: &NavigationError| {
        assert!(err.failure().is_none());
        counter.fetch_add(1, Ordering::SeqCst);
    });
    h.engine.before_each(guard_sync(|to, _| match to.path() {
        "/b" => Err("boom".into()),
        "/c" => Ok(Next::Abort),
        _ => Ok(Next::Continue),
    }));

    h.engine.push("/a").await.unwrap();
    let err = h.engine.push("/b").await.unwrap_err();
    assert!(matches!(err, NavigationError::Guard(_)));
    let _ = h.engine.push("/c").await;
    let _ = h.engine.push("/a").await;

    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lazy_components_load_once_before_enter_guards() {
    let h = Harness::new(Vec::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let log = h.log.clone();
    let enter_log = log.clone();
    h.engine
        .matcher()
        .add_routes(&[
            RouteConfig::new("/home"),
            RouteConfig::new("/lazy").lazy_component(lazy(move || {
                let counter = counter.clone();
                let log = enter_log.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    log.record("load");
                    let component: Arc<dyn Component> =
                        Arc::new(TestComponent::new().on_enter(RecordingGuard::new("enter", &log)));
                    Ok(component)
                }
            })),
        ])
        .unwrap();

    h.engine.push("/lazy").await.unwrap();
    h.engine.push("/home").await.unwrap();
    h.engine.push("/lazy").await.unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(log.entries(), vec!["load", "enter", "enter"]);
}

#[tokio::test]
async fn failed_lazy_load_stops_navigation() {
    let h = Harness::new(Vec::new());
    h.engine
        .matcher()
        .add_routes(&[RouteConfig::new("/broken").lazy_component(lazy(|| async {
            Err::<Arc<dyn Component>, BoxError>("chunk failed".into())
        }))])
        .unwrap();

    let err = h.engine.push("/broken").await.unwrap_err();

    assert!(matches!(err, NavigationError::Guard(ref e) if e.to_string() == "chunk failed"));
    assert!(h.engine.current().is_start());
}

#[tokio::test]
async fn enter_callback_receives_mounted_instance() {
    let h = Harness::new(Vec::new());
    let log = h.log.clone();
    h.engine
        .matcher()
        .add_routes(&[RouteConfig::new("/a").component(
            TestComponent::new()
                .on_enter(RecordingGuard::new("enter", &log).returning(Verdict::OnEnter)),
        )])
        .unwrap();

    h.engine.push("/a").await.unwrap();
    assert_eq!(h.ticker.flush(), 1);
    assert_eq!(h.ticker.pending_timers(), 1);

    h.engine
        .instances()
        .register(h.record_id("/a"), "default", TestInstance::new("a"));
    h.ticker.advance(ENTER_POLL_INTERVAL);

    assert_eq!(log.entries(), vec!["enter", "enter:entered"]);
    assert_eq!(h.ticker.pending_timers(), 0);
}

#[tokio::test]
async fn enter_callback_polling_stops_after_leaving() {
    let h = Harness::new(Vec::new());
    let log = h.log.clone();
    h.engine
        .matcher()
        .add_routes(&[
            RouteConfig::new("/a").component(
                TestComponent::new()
                    .on_enter(RecordingGuard::new("enter", &log).returning(Verdict::OnEnter)),
            ),
            RouteConfig::new("/b"),
        ])
        .unwrap();

    h.engine.push("/a").await.unwrap();
    h.ticker.flush();
    h.ticker.advance(ENTER_POLL_INTERVAL * 3);
    assert_eq!(h.ticker.pending_timers(), 1);

    h.engine.push("/b").await.unwrap();
    h.ticker.advance(ENTER_POLL_INTERVAL);

    assert_eq!(h.ticker.pending_timers(), 0);
    assert_eq!(log.entries(), vec!["enter"]);
}

#[tokio::test]
async fn ready_fires_once_with_first_route() {
    let h = Harness::new(simple_routes());
    let log = h.log.clone();
    let ready_log = log.clone();
    h.engine.on_ready(
        Box::new(move |route: &Route| ready_log.record(format!("ready {}", route.full_path()))),
        None,
    );

    h.engine.push("/a").await.unwrap();
    h.engine.push("/b").await.unwrap();
    let late_log = log.clone();
    h.engine.on_ready(
        Box::new(move |route: &Route| late_log.record(format!("late {}", route.full_path()))),
        None,
    );

    assert!(h.engine.is_ready());
    assert_eq!(log.entries(), vec!["ready /a", "late /b"]);
}

#[tokio::test]
async fn first_redirect_counts_as_ready() {
    let h = Harness::new(vec![RouteConfig::new("/private"), RouteConfig::new("/login")]);
    h.engine.before_each(guard_sync(|to, _| {
        Ok(if to.path() == "/private" {
            Next::redirect("/login")
        } else {
            Next::Abort
        })
    }));
    let log = h.log.clone();
    let (ready_log, error_log) = (log.clone(), log.clone());
    h.engine.on_ready(
        Box::new(move |route: &Route| ready_log.record(format!("ready {}", route.full_path()))),
        Some(Box::new(move |err: &NavigationError| error_log.record(format!("error {err}")))),
    );

    let err = h.engine.push("/private").await.unwrap_err();

    assert!(err.is_failure(FailureKind::REDIRECTED));
    assert_eq!(log.entries(), vec!["ready /private"]);
    assert!(h.engine.current().is_start());
}

#[tokio::test]
async fn failed_first_navigation_reports_ready_error() {
    let h = Harness::new(simple_routes());
    h.engine.before_each(guard_sync(|_, _| Ok(Next::Abort)));
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    h.engine.on_ready(
        Box::new(|_: &Route| panic!("first navigation should not commit")),
        Some(Box::new(move |err: &NavigationError| {
            assert!(err.is_failure(FailureKind::ABORTED));
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );

    let _ = h.engine.push("/a").await;
    let _ = h.engine.push("/b").await;

    assert!(h.engine.is_ready());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pop_navigates_without_new_history_entry() {
    let h = Harness::new(simple_routes());
    h.engine.setup_listeners();

    h.engine.push("/a").await.unwrap();
    h.engine.push("/b").await.unwrap();
    assert!(h.history.pop(-1).await);

    assert_eq!(h.current_path(), "/a");
    assert_eq!(
        h.history.ops(),
        vec![HistoryOp::Push("/a".into()), HistoryOp::Push("/b".into())]
    );
}

#[tokio::test]
async fn go_moves_through_history() {
    let h = Harness::with_history(simple_routes(), MemoryHistory::new());

    h.engine.push("/a").await.unwrap();
    h.engine.push("/b").await.unwrap();
    let back = h.engine.go(-1).await.unwrap();
    let nowhere = h.engine.go(-5).await.unwrap();

    assert_eq!(back.map(|r| r.path().to_string()), Some("/a".into()));
    assert!(nowhere.is_none());
    assert_eq!(h.history.index(), 0);
}

#[tokio::test]
async fn removed_listener_stops_receiving_routes() {
    let h = Harness::new(simple_routes());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let handle = h.engine.listen(move |_: &Route| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    h.engine.push("/a").await.unwrap();
    handle.remove();
    h.engine.push("/b").await.unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_target_commits_unmatched_route() {
    let h = Harness::new(simple_routes());

    let route = h.engine.push("/missing").await.unwrap();

    assert!(route.matched().is_empty());
    assert_eq!(h.current_path(), "/missing");
}

#[tokio::test]
async fn before_enter_guard_verdicts_apply_per_attempt() {
    let h = Harness::new(vec![
        RouteConfig::new("/a"),
        RouteConfig::new("/login"),
        RouteConfig::new("/guarded").before_enter(ScriptedGuard::new([
            Verdict::Abort,
            Verdict::Redirect("/login".into()),
        ])),
    ]);
    h.engine.push("/a").await.unwrap();

    let aborted = h.engine.push("/guarded").await.unwrap_err();
    let redirected = h.engine.push("/guarded").await.unwrap_err();
    let entered = h.engine.push("/guarded").await.unwrap();

    assert!(aborted.is_failure(FailureKind::ABORTED));
    assert!(redirected.is_failure(FailureKind::REDIRECTED));
    assert_eq!(entered.path(), "/guarded");
    assert_eq!(
        h.history.ops(),
        vec![
            HistoryOp::Push("/a".into()),
            HistoryOp::Push("/login".into()),
            HistoryOp::Push("/guarded".into()),
        ]
    );
}
