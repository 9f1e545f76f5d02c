//! Per-group mutual exclusion.
//!
//! A batch leases every group id it touches before reading observations and
//! releases them after its commit. Leases on disjoint id sets never wait on
//! each other. All ids of a lease are taken in one step, so two batches can
//! not deadlock by acquiring overlapping sets in different orders.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::trace;

/// Table of currently leased group ids
#[derive(Debug, Default)]
pub struct GroupLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Exclusive hold on a set of group ids; released on drop
#[derive(Debug)]
pub struct GroupLease<'a> {
    locks: &'a GroupLocks,
    ids: Vec<String>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until none of `ids` is leased elsewhere, then lease them all
    pub fn acquire<'a, I, S>(&'a self, ids: I) -> GroupLease<'a>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut held = self.lock_table();
        while ids.iter().any(|id| held.contains(id)) {
            trace!("waiting for group lease on {:?}", ids);
            held = self.released.wait(held).unwrap_or_else(PoisonError::into_inner);
        }
        held.extend(ids.iter().cloned());

        GroupLease { locks: self, ids }
    }

    /// Whether `id` is currently leased
    pub fn is_held(&self, id: &str) -> bool {
        self.lock_table().contains(id)
    }

    // The table only holds plain ids, so a panic elsewhere cannot leave it inconsistent
    fn lock_table(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GroupLease<'_> {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Drop for GroupLease<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.lock_table();
        for id in &self.ids {
            held.remove(id);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
