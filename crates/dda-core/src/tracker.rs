//! Thread-safe set of alive peer coordinator and worker ids.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::ids::Role;

#[derive(Debug, Default)]
struct TrackerState {
    coordinators: HashSet<String>,
    workers: HashSet<String>,
}

/// Tracks which peer coordinators and workers are currently known to be
/// alive, from this instance's point of view. Entries are created on
/// observed announcements (or self, at startup) and removed only on
/// observed leaves — there is no timeout-based eviction, so temporary
/// isolation from the substrate is tolerated.
#[derive(Debug, Default)]
pub struct Tracker {
    state: RwLock<TrackerState>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` into `role`'s set. Returns `true` iff it was newly
    /// inserted (idempotent otherwise).
    pub fn try_join(&self, role: Role, id: impl Into<String>) -> bool {
        let mut state = self.state.write();
        match role {
            Role::Coordinator => state.coordinators.insert(id.into()),
            Role::Worker => state.workers.insert(id.into()),
        }
    }

    /// Remove `id` from `role`'s set. No-op if absent.
    pub fn leave(&self, role: Role, id: impl AsRef<str>) {
        let mut state = self.state.write();
        match role {
            Role::Coordinator => {
                state.coordinators.remove(id.as_ref());
            }
            Role::Worker => {
                state.workers.remove(id.as_ref());
            }
        }
    }

    /// Atomic snapshot of `(num_coordinators, num_workers)`.
    pub fn count(&self) -> (usize, usize) {
        let state = self.state.read();
        (state.coordinators.len(), state.workers.len())
    }
}
