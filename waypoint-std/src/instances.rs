//! Live component instances.
//!
//! Hosts register an instance when a routed view mounts and unregister it
//! when the view goes away. Leave and update guards only run for slots with
//! a registered instance, and enter callbacks wait for one to appear.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use waypoint_core::{Instance, RecordId};

type Slots = HashMap<(RecordId, String), Arc<dyn Instance>>;

/// Instances by record and slot. Clones share one registry.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl InstanceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the instance rendering `slot` of `record`, replacing any previous one.
    pub fn register(&self, record: RecordId, slot: impl Into<String>, instance: Arc<dyn Instance>) {
        self.lock().insert((record, slot.into()), instance);
    }

    /// Remove the instance for `slot` of `record`.
    pub fn unregister(&self, record: RecordId, slot: &str) -> Option<Arc<dyn Instance>> {
        self.lock().remove(&(record, slot.to_string()))
    }

    /// The instance for `slot` of `record`.
    pub fn get(&self, record: RecordId, slot: &str) -> Option<Arc<dyn Instance>> {
        self.lock().get(&(record, slot.to_string())).cloned()
    }

    /// Whether `slot` of `record` has an instance.
    pub fn contains(&self, record: RecordId, slot: &str) -> bool {
        self.lock().contains_key(&(record, slot.to_string()))
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
