//! Per-name mutation locks.
//!
//! Writers to one name queue behind each other; writers to different names
//! never share a lock. Slots are created on demand and dropped once the last
//! holder or waiter lets go, so the registry only holds names being written.

use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct NameLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while a name is being mutated.
pub(crate) struct NameGuard<'a> {
    locks: &'a NameLocks,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NameLocks {
    pub(crate) async fn lock(&self, name: &str) -> NameGuard<'_> {
        let slot = self.slots.lock().entry(name.to_string()).or_default().clone();
        let guard = slot.lock_owned().await;
        NameGuard {
            locks: self,
            name: name.to_string(),
            guard: Some(guard),
        }
    }

    /// Lock two distinct names, always in lexicographic order. Guards are
    /// returned in argument order.
    pub(crate) async fn lock_pair<'a>(
        &'a self,
        first: &str,
        second: &str,
    ) -> (NameGuard<'a>, NameGuard<'a>) {
        if first <= second {
            let a = self.lock(first).await;
            let b = self.lock(second).await;
            (a, b)
        } else {
            let b = self.lock(second).await;
            let a = self.lock(first).await;
            (a, b)
        }
    }

    fn release(&self, name: &str) {
        let mut slots = self.slots.lock();
        if slots
            .get(name)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(name);
        }
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.name);
    }
}
