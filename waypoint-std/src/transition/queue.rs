//! Guard queue construction.

use crate::instances::InstanceRegistry;
use std::sync::Arc;
use waypoint_core::{BoxError, DynGuard, GuardKind, RecordId, RouteRecord};

/// How two matched chains differ.
#[derive(Debug, Default)]
pub struct ChainDiff {
    /// Shared prefix; these records stay and see an update.
    pub updated: Vec<Arc<RouteRecord>>,
    /// Records only in the target chain.
    pub activated: Vec<Arc<RouteRecord>>,
    /// Records only in the current chain.
    pub deactivated: Vec<Arc<RouteRecord>>,
}

/// Split `current` and `next` at their longest common prefix, compared by
/// record identity.
pub fn resolve_queue(current: &[Arc<RouteRecord>], next: &[Arc<RouteRecord>]) -> ChainDiff {
    let shared = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| Arc::ptr_eq(a, b))
        .count();
    ChainDiff {
        updated: next[..shared].to_vec(),
        activated: next[shared..].to_vec(),
        deactivated: current[shared..].to_vec(),
    }
}

/// One entry of a guard queue.
pub(crate) enum Step {
    /// A plain guard.
    Guard(Arc<dyn DynGuard>),
    /// An enter guard of the component in `slot` of `record`.
    Enter {
        guard: Arc<dyn DynGuard>,
        record: RecordId,
        slot: String,
    },
    /// Load lazy components of the given records.
    ResolveComponents(Vec<Arc<RouteRecord>>),
}

type SlotGuards = (RecordId, String, Vec<Arc<dyn DynGuard>>);

fn component_guards(
    records: &[Arc<RouteRecord>],
    kind: GuardKind,
    instances: Option<&InstanceRegistry>,
) -> Vec<SlotGuards> {
    let mut groups = Vec::new();
    for record in records {
        for (slot, component) in &record.components {
            let Some(component) = component.get() else {
                continue;
            };
            if instances.is_some_and(|instances| !instances.contains(record.id, slot)) {
                continue;
            }
            let guards = component.guards(kind);
            if !guards.is_empty() {
                groups.push((record.id, slot.clone(), guards));
            }
        }
    }
    groups
}

/// Leave guards of mounted components, innermost component first.
pub(crate) fn leave_guards(
    deactivated: &[Arc<RouteRecord>],
    instances: &InstanceRegistry,
) -> Vec<Step> {
    component_guards(deactivated, GuardKind::Leave, Some(instances))
        .into_iter()
        .rev()
        .flat_map(|(_, _, guards)| guards)
        .map(Step::Guard)
        .collect()
}

/// Update guards of mounted components, outermost first.
pub(crate) fn update_guards(updated: &[Arc<RouteRecord>], instances: &InstanceRegistry) -> Vec<Step> {
    component_guards(updated, GuardKind::Update, Some(instances))
        .into_iter()
        .flat_map(|(_, _, guards)| guards)
        .map(Step::Guard)
        .collect()
}

/// Enter guards of the activated components, outermost first.
pub(crate) fn enter_guards(activated: &[Arc<RouteRecord>]) -> Vec<Step> {
    component_guards(activated, GuardKind::Enter, None)
        .into_iter()
        .flat_map(|(record, slot, guards)| {
            guards.into_iter().map(move |guard| Step::Enter {
                guard,
                record,
                slot: slot.clone(),
            })
        })
        .collect()
}

/// Guards declared in the route configuration of activated records.
pub(crate) fn before_enter_guards(activated: &[Arc<RouteRecord>]) -> Vec<Step> {
    activated
        .iter()
        .filter_map(|record| record.before_enter.clone())
        .map(Step::Guard)
        .collect()
}

/// Load every unresolved component of `records` concurrently.
pub(crate) async fn resolve_components(records: &[Arc<RouteRecord>]) -> Result<(), BoxError> {
    let loads = records.iter().flat_map(|record| {
        record
            .components
            .values()
            .filter(|slot| !slot.is_resolved())
            .map(|slot| slot.resolve())
    });
    futures::future::try_join_all(loads).await?;
    Ok(())
}
