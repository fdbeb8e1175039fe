//! Per-player synchronization record.

use crate::config::Group;
use crate::proxy::{ProxyPlayer, Text};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Synchronization state for one connected player.
///
/// `loaded` is false from the start of every group transition until the
/// deferred population for the target group has completed. Each
/// [`TabPlayer::begin_load`] bumps a generation so only the most recent
/// load request may complete.
#[derive(Debug)]
pub struct TabPlayer {
    uuid: Uuid,
    player: RwLock<Arc<dyn ProxyPlayer>>,
    group: RwLock<Option<Arc<Group>>>,
    loaded: AtomicBool,
    load_generation: AtomicU64,
    last_header_footer: RwLock<(Text, Text)>,
    /// Display names of other players as last sent to this viewer.
    relational_names: DashMap<Uuid, Text>,
}

impl TabPlayer {
    pub fn new(player: Arc<dyn ProxyPlayer>, group: Option<Arc<Group>>) -> Self {
        Self {
            uuid: player.uuid(),
            player: RwLock::new(player),
            group: RwLock::new(group),
            loaded: AtomicBool::new(false),
            load_generation: AtomicU64::new(0),
            last_header_footer: RwLock::new((Text::new(), Text::new())),
            relational_names: DashMap::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Live connection handle.
    pub fn player(&self) -> Arc<dyn ProxyPlayer> {
        Arc::clone(&self.player.read())
    }

    /// Point the record at a newer connection for the same uuid.
    pub fn rebind(&self, player: Arc<dyn ProxyPlayer>) {
        *self.player.write() = player;
    }

    pub fn group(&self) -> Option<Arc<Group>> {
        self.group.read().clone()
    }

    pub fn set_group(&self, group: Option<Arc<Group>>) {
        *self.group.write() = group;
    }

    /// Whether this record currently targets the group named `name`.
    pub fn targets(&self, name: &str) -> bool {
        self.group.read().as_ref().is_some_and(|g| g.name == name)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }

    /// Start a new load: marks the record unloaded and returns the ticket the
    /// deferred population must still hold when it fires.
    pub fn begin_load(&self) -> u64 {
        self.set_loaded(false);
        self.load_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current_load(&self, generation: u64) -> bool {
        self.load_generation.load(Ordering::Acquire) == generation
    }

    pub fn last_header_footer(&self) -> (Text, Text) {
        self.last_header_footer.read().clone()
    }

    pub fn set_last_header_footer(&self, header: Text, footer: Text) {
        *self.last_header_footer.write() = (header, footer);
    }

    pub fn remember_name(&self, target: Uuid, name: Text) {
        self.relational_names.insert(target, name);
    }

    pub fn remembered_name(&self, target: Uuid) -> Option<Text> {
        self.relational_names.get(&target).map(|n| n.clone())
    }

    /// Forget what this viewer was shown for `target`.
    pub fn forget(&self, target: Uuid) {
        self.relational_names.remove(&target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::MemoryPlayer;

    fn record(group: Option<&str>) -> TabPlayer {
        let player = Arc::new(MemoryPlayer::new(Uuid::new_v4(), "alice"));
        let group = group.map(|name| Arc::new(Group::new(name, &[]).unwrap()));
        TabPlayer::new(player, group)
    }

    #[test]
    fn later_load_supersedes_earlier() {
        let tp = record(Some("lobby"));
        let first = tp.begin_load();
        let second = tp.begin_load();

        assert!(!tp.is_current_load(first));
        assert!(tp.is_current_load(second));
    }

    #[test]
    fn begin_load_marks_unloaded() {
        let tp = record(Some("lobby"));
        tp.set_loaded(true);
        tp.begin_load();
        assert!(!tp.is_loaded());
    }

    #[test]
    fn targets_compares_group_name() {
        let tp = record(Some("lobby"));
        assert!(tp.targets("lobby"));
        assert!(!tp.targets("survival"));

        tp.set_group(None);
        assert!(!tp.targets("lobby"));
    }

    #[test]
    fn relational_names_are_per_target() {
        let tp = record(None);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        tp.remember_name(a, "A".into());
        tp.remember_name(b, "B".into());

        tp.forget(a);
        assert_eq!(tp.remembered_name(a), None);
        assert_eq!(tp.remembered_name(b).as_deref(), Some("B"));
    }
}
