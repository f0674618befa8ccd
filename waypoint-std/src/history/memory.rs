//! In-memory history.

use std::sync::{Arc, Mutex, PoisonError};
use waypoint_core::{History, PopListener};

/// A call made on a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOp {
    /// `push(path)`.
    Push(String),
    /// `replace(path)`.
    Replace(String),
    /// `go(delta)`.
    Go(isize),
}

#[derive(Default)]
struct Stack {
    entries: Vec<String>,
    index: usize,
    ops: Vec<HistoryOp>,
    listener: Option<PopListener>,
}

/// A history kept in memory: a stack of full paths and a cursor.
///
/// Used where there is no platform history, and in tests, where
/// [`ops`](Self::ops) shows exactly what the router asked for.
/// Clones share one stack.
#[derive(Clone, Default)]
pub struct MemoryHistory {
    stack: Arc<Mutex<Stack>>,
}

impl MemoryHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history with one entry for `path`.
    pub fn starting_at(path: impl Into<String>) -> Self {
        let history = Self::new();
        history.lock().entries.push(path.into());
        history
    }

    /// All entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.lock().index
    }

    /// Calls received so far.
    pub fn ops(&self) -> Vec<HistoryOp> {
        self.lock().ops.clone()
    }

    /// Forget recorded calls.
    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// Move `delta` entries as if the user did, notifying the pop listener
    /// and waiting for it. Returns `false` when the move is out of range.
    pub async fn pop(&self, delta: isize) -> bool {
        let (location, listener) = {
            let mut stack = self.lock();
            let Some(target) = target_index(&stack, delta) else {
                return false;
            };
            stack.index = target;
            (stack.entries[target].clone(), stack.listener.clone())
        };
        if let Some(listener) = listener {
            listener(location).await;
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn target_index(stack: &Stack, delta: isize) -> Option<usize> {
    stack
        .index
        .checked_add_signed(delta)
        .filter(|target| *target < stack.entries.len())
}

impl History for MemoryHistory {
    fn push(&self, full_path: &str) {
        let mut stack = self.lock();
        stack.ops.push(HistoryOp::Push(full_path.to_string()));
        if stack.entries.is_empty() {
            stack.entries.push(full_path.to_string());
            stack.index = 0;
            return;
        }
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(full_path.to_string());
        stack.index = keep;
    }

    fn replace(&self, full_path: &str) {
        let mut stack = self.lock();
        stack.ops.push(HistoryOp::Replace(full_path.to_string()));
        let index = stack.index;
        match stack.entries.get_mut(index) {
            Some(entry) => *entry = full_path.to_string(),
            None => stack.entries.push(full_path.to_string()),
        }
    }

    fn go(&self, delta: isize) -> Option<String> {
        let mut stack = self.lock();
        stack.ops.push(HistoryOp::Go(delta));
        let target = target_index(&stack, delta)?;
        stack.index = target;
        Some(stack.entries[target].clone())
    }

    fn current_location(&self) -> String {
        let stack = self.lock();
        stack
            .entries
            .get(stack.index)
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn setup_listeners(&self, listener: PopListener) {
        self.lock().listener = Some(listener);
    }

    fn teardown(&self) {
        self.lock().listener = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_forward_entries() {
        let history = MemoryHistory::starting_at("/a");
        history.push("/b");
        history.push("/c");
        assert_eq!(history.go(-2).as_deref(), Some("/a"));
        history.push("/d");
        assert_eq!(history.entries(), ["/a", "/d"]);
        assert_eq!(history.current_location(), "/d");
    }

    #[test]
    fn go_stays_in_bounds() {
        let history = MemoryHistory::starting_at("/a");
        assert!(history.go(1).is_none());
        assert!(history.go(-1).is_none());
        assert_eq!(history.index(), 0);
        assert_eq!(
            history.ops(),
            [HistoryOp::Go(1), HistoryOp::Go(-1)]
        );
    }

    #[test]
    fn replace_rewrites_current_entry() {
        let history = MemoryHistory::new();
        assert_eq!(history.current_location(), "/");
        history.replace("/x");
        history.push("/y");
        history.replace("/z");
        assert_eq!(history.entries(), ["/x", "/z"]);
    }
}
