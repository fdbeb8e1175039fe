use super::PlaceholderCache;
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use uuid::Uuid;

/// Placeholder values keyed by player, with a per-player block flag.
#[derive(Debug, Default)]
pub struct MemoryPlaceholderCache {
    values: DashMap<Uuid, HashMap<String, String>>,
    blocked: DashSet<Uuid>,
}

impl MemoryPlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a resolved value. Refused while the player is blocked.
    pub fn store(&self, uuid: Uuid, placeholder: &str, value: impl Into<String>) -> bool {
        if self.blocked.contains(&uuid) {
            return false;
        }
        self.values
            .entry(uuid)
            .or_default()
            .insert(placeholder.to_string(), value.into());
        true
    }

    pub fn get(&self, uuid: Uuid, placeholder: &str) -> Option<String> {
        self.values.get(&uuid)?.get(placeholder).cloned()
    }

    pub fn is_blocked(&self, uuid: Uuid) -> bool {
        self.blocked.contains(&uuid)
    }

    pub fn cached_players(&self) -> usize {
        self.values.len()
    }
}

impl PlaceholderCache for MemoryPlaceholderCache {
    fn clear_all(&self, uuid: Uuid) {
        self.blocked.insert(uuid);
        self.values.remove(&uuid);
    }

    fn unblock(&self, uuid: Uuid) {
        self.blocked.remove(&uuid);
    }
}
