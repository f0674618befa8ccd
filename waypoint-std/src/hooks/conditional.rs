//! Guards that only run for some navigations.

use waypoint_core::{BoxError, Guard, Next, Route};

/// Runs `inner` only when the predicate accepts the navigation; otherwise
/// lets it through.
pub struct ConditionalGuard<G, P> {
    inner: G,
    predicate: P,
}

impl<G, P> ConditionalGuard<G, P> {
    /// Create a conditional guard.
    pub fn new(inner: G, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<G, P> Guard for ConditionalGuard<G, P>
where
    G: Guard,
    P: Fn(&Route, &Route) -> bool + Send + Sync + 'static,
{
    async fn check(&self, to: &Route, from: &Route) -> Result<Next, BoxError> {
        if (self.predicate)(to, from) {
            self.inner.check(to, from).await
        } else {
            Ok(Next::Continue)
        }
    }
}

/// Run `inner` only for targets whose matched records carry meta `key`.
pub fn when_meta<G: Guard>(
    key: &'static str,
    inner: G,
) -> ConditionalGuard<G, impl Fn(&Route, &Route) -> bool + Send + Sync + 'static> {
    ConditionalGuard::new(inner, move |to: &Route, _: &Route| {
        to.matched()
            .iter()
            .any(|record| record.meta.get(key).is_some_and(|value| value != &false))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::guard_sync;

    #[tokio::test]
    async fn skips_when_predicate_rejects() {
        let guard = ConditionalGuard::new(guard_sync(|_, _| Ok(Next::Abort)), |to: &Route, _: &Route| {
            to.path() == "/admin"
        });
        let start = Route::start();
        assert!(matches!(guard.check(&start, &start).await.unwrap(), Next::Continue));
    }
}
