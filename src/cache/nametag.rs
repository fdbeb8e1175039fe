use super::NametagCache;
use crate::config::Group;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Team assignment per player: `uuid -> (group, team)`.
#[derive(Debug, Default)]
pub struct MemoryNametagCache {
    teams: DashMap<Uuid, (String, String)>,
    resets: AtomicUsize,
}

impl MemoryNametagCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, uuid: Uuid, group: &Group, team: impl Into<String>) {
        self.teams.insert(uuid, (group.name.clone(), team.into()));
    }

    pub fn team(&self, uuid: Uuid) -> Option<String> {
        self.teams.get(&uuid).map(|t| t.1.clone())
    }

    /// Number of resets performed so far.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }
}

impl NametagCache for MemoryNametagCache {
    fn reset(&self, uuid: Uuid, group: &Group) {
        self.resets.fetch_add(1, Ordering::Relaxed);
        // A collision-tolerant group shares teams across groups, so any
        // assignment is stale once the player lands in it.
        self.teams
            .remove_if(&uuid, |_, (owner, _)| group.collisions || *owner == group.name);
    }
}
