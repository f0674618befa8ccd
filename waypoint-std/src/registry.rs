//! Runtime hook registration.

use std::sync::{
    Arc, Mutex, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
};

/// Hooks in registration order.
pub struct HookList<T: ?Sized> {
    hooks: Mutex<Vec<(u64, Arc<T>)>>,
    next_id: AtomicU64,
}

impl<T: ?Sized> Default for HookList<T> {
    fn default() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> HookList<T> {
    /// An empty list.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append a hook. The returned handle removes it again.
    pub fn register(self: &Arc<Self>, hook: Arc<T>) -> HookHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, hook));

        let list: Weak<Self> = Arc::downgrade(self);
        HookHandle {
            remove: Some(Box::new(move || {
                if let Some(list) = list.upgrade() {
                    list.hooks
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(hook_id, _)| *hook_id != id);
                }
            })),
        }
    }

    /// The registered hooks, in order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect()
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every hook.
    pub fn clear(&self) {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Removes a registered hook.
///
/// Dropping the handle keeps the hook registered.
pub struct HookHandle {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl HookHandle {
    /// Unregister the hook.
    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_remove_their_hook() {
        let list: Arc<HookList<str>> = HookList::new();
        let first = list.register(Arc::from("first"));
        let _second = list.register(Arc::from("second"));
        assert_eq!(list.len(), 2);

        first.remove();
        let remaining: Vec<String> = list.snapshot().iter().map(|s| s.to_string()).collect();
        assert_eq!(remaining, ["second"]);
    }
}
