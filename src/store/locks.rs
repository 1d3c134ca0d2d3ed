//! Per-slot writer serialization
//!
//! A slot is "busy" while a writer or deleter holds its guard. The table only
//! contains busy names, so it never grows beyond the number of concurrent
//! writers.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct SlotLocks {
    busy: Mutex<HashSet<String>>,
    released: Condvar,
}

impl SlotLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Blocks until `name` is free, then marks it busy until the guard drops.
    pub(crate) fn acquire(&self, name: &str) -> SlotGuard<'_> {
        let mut busy = self.table();
        while busy.contains(name) {
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(name.to_string());
        SlotGuard {
            locks: self,
            name: name.to_string(),
        }
    }

    /// Number of slots currently held.
    pub(crate) fn held(&self) -> usize {
        self.table().len()
    }

    // The set is updated in single calls, so a panic elsewhere cannot leave
    // it inconsistent; poisoning is ignored.
    fn table(&self) -> MutexGuard<'_, HashSet<String>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct SlotGuard<'a> {
    locks: &'a SlotLocks,
    name: String,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.locks.table().remove(&self.name);
        self.locks.released.notify_all();
    }
}
