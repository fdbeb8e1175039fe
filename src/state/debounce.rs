//! Self-expiring uuid markers.
//!
//! Used to remember players kicked moments ago. Each mark carries a stamp;
//! an expiry only removes the mark it was scheduled for, so a second kick
//! inside the window restarts the window instead of being cut short by the
//! first kick's expiry.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct DebounceSet {
    entries: DashMap<Uuid, u64>,
    next_stamp: AtomicU64,
}

impl DebounceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `uuid` and return the stamp its expiry must present.
    pub fn mark(&self, uuid: Uuid) -> u64 {
        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(uuid, stamp);
        stamp
    }

    /// Remove the mark if it is still the one identified by `stamp`.
    pub fn expire(&self, uuid: Uuid, stamp: u64) -> bool {
        self.entries.remove_if(&uuid, |_, s| *s == stamp).is_some()
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.entries.contains_key(&uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
