//! The player directory.
//!
//! Two coupled mappings: uuid to [`TabPlayer`] and group to roster. A third
//! map, uuid to group name, indexes roster membership so every structural
//! change for one uuid goes through that uuid's index entry.
//!
//! # Lock order
//!
//! membership entry, then roster shard. Never the reverse, and never while
//! holding a `players` guard. Reads clone out of the maps (see
//! [`DashMapExt`]) so rendering never waits on an unrelated mutation.

use super::dashmap_ext::DashMapExt;
use super::tab_player::TabPlayer;
use crate::config::Group;
use crate::metrics;
use crate::proxy::{Proxy, ProxyPlayer, TabEntry};
use crate::registry::GroupRegistry;
use crate::render::TabRenderer;
use crate::scheduler::TaskScheduler;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub struct Directory {
    players: DashMap<Uuid, Arc<TabPlayer>>,
    membership: DashMap<Uuid, String>,
    rosters: DashMap<String, im::HashSet<Uuid>>,
    registry: Arc<dyn GroupRegistry>,
    proxy: Arc<dyn Proxy>,
    renderer: Arc<dyn TabRenderer>,
    scheduler: TaskScheduler,
}

impl Directory {
    pub fn new(
        registry: Arc<dyn GroupRegistry>,
        proxy: Arc<dyn Proxy>,
        renderer: Arc<dyn TabRenderer>,
        scheduler: TaskScheduler,
    ) -> Self {
        Self {
            players: DashMap::new(),
            membership: DashMap::new(),
            rosters: DashMap::new(),
            registry,
            proxy,
            renderer,
            scheduler,
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn lookup(&self, uuid: Uuid) -> Option<Arc<TabPlayer>> {
        self.players.get_cloned(&uuid)
    }

    pub fn resolve_group(&self, server: &str) -> Option<Arc<Group>> {
        self.registry.resolve(server)
    }

    /// Name of the group whose roster holds `uuid`.
    pub fn group_of(&self, uuid: Uuid) -> Option<String> {
        self.membership.get_cloned(&uuid)
    }

    /// Snapshot of a group's roster.
    pub fn members(&self, group: &str) -> im::HashSet<Uuid> {
        self.rosters.get_cloned(group).unwrap_or_default()
    }

    pub fn loaded_players(&self) -> Vec<Arc<TabPlayer>> {
        self.players
            .values_cloned()
            .into_iter()
            .filter(|tp| tp.is_loaded())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn proxy(&self) -> &Arc<dyn Proxy> {
        &self.proxy
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Target `group` for `player` now and populate its tab list after `delay`.
    ///
    /// A later call for the same player supersedes this one. The deferred
    /// population re-checks that this exact record still targets `group`
    /// with the same load ticket and gives up silently otherwise.
    pub fn load_player(
        self: &Arc<Self>,
        player: Arc<dyn ProxyPlayer>,
        group: Arc<Group>,
        delay: Duration,
    ) {
        let uuid = player.uuid();
        let record = match self.players.entry(uuid) {
            Entry::Occupied(slot) => {
                let record = Arc::clone(slot.get());
                record.rebind(player);
                record.set_group(Some(Arc::clone(&group)));
                record
            }
            Entry::Vacant(slot) => {
                let record = Arc::new(TabPlayer::new(player, Some(Arc::clone(&group))));
                slot.insert(Arc::clone(&record));
                record
            }
        };
        metrics::set_tracked_players(self.players.len());

        let generation = record.begin_load();
        debug!(
            uuid = %uuid,
            group = %group.name,
            delay_ms = delay.as_millis() as u64,
            "Scheduled tab list load"
        );

        let check = (Arc::clone(self), Arc::clone(&record), group.name.clone());
        let directory = Arc::clone(self);
        self.scheduler.run_guarded(
            "load-player",
            delay,
            move || {
                let (directory, record, group) = check;
                directory.is_current_load(&record, &group, generation)
            },
            async move { directory.populate(&record) },
        );
    }

    fn is_current_load(&self, record: &Arc<TabPlayer>, group: &str, generation: u64) -> bool {
        let still_tracked = self
            .players
            .get(&record.uuid())
            .is_some_and(|current| Arc::ptr_eq(current.value(), record));
        still_tracked
            && record.targets(group)
            && record.is_current_load(generation)
            && record.player().is_active()
    }

    /// Fill the player's tab list for its target group and mirror its entry
    /// to everyone who should see it.
    fn populate(&self, record: &Arc<TabPlayer>) {
        let Some(group) = record.group() else {
            return;
        };
        let uuid = record.uuid();
        self.assign(uuid, &group.name);

        let player = record.player();
        let audience = self.audience(&group.name, uuid, true);

        // Entries left over from a previous group have no place here.
        let visible: HashSet<Uuid> = audience
            .iter()
            .map(|tp| tp.uuid())
            .chain(std::iter::once(uuid))
            .collect();
        for stale in player.tab_entries() {
            if !visible.contains(&stale) {
                player.remove_tab_entry(stale);
            }
        }

        player.add_tab_entry(self.entry_for(record, record, &group));
        for viewer in &audience {
            viewer
                .player()
                .add_tab_entry(self.entry_for(viewer, record, &group));
            if let Some(viewer_group) = viewer.group() {
                player.add_tab_entry(self.entry_for(record, viewer, &viewer_group));
            }
        }

        self.render_header_footer(record, &group, true);
        record.set_loaded(true);
        debug!(
            uuid = %uuid,
            group = %group.name,
            viewers = audience.len(),
            "Tab list loaded"
        );
    }

    /// Remove the player and its roster membership, telling every viewer.
    /// Returns false (and changes nothing) when the player is not tracked.
    pub fn remove_player(&self, uuid: Uuid) -> bool {
        let record = self.players.remove(&uuid).map(|(_, tp)| tp);
        let group = self.unassign(uuid);
        if record.is_none() && group.is_none() {
            return false;
        }
        metrics::set_tracked_players(self.players.len());

        if let Some(record) = &record {
            record.set_loaded(false);
        }
        let group = group.or_else(|| {
            record
                .as_ref()
                .and_then(|r| r.group())
                .map(|g| g.name.clone())
        });

        let viewers = self.audience(group.as_deref().unwrap_or_default(), uuid, false);
        for viewer in &viewers {
            viewer.player().remove_tab_entry(uuid);
        }
        self.clear_cached_data(uuid);
        debug!(uuid = %uuid, viewers = viewers.len(), "Removed player from tab lists");
        true
    }

    /// Drop the record and roster membership without telling anyone. The
    /// caller schedules the visible cleanup itself.
    pub fn evict(&self, uuid: Uuid) -> Option<Arc<TabPlayer>> {
        let record = self.players.remove(&uuid).map(|(_, tp)| tp);
        self.unassign(uuid);
        if let Some(record) = &record {
            record.set_loaded(false);
            metrics::set_tracked_players(self.players.len());
        }
        record
    }

    /// Remove `uuid`'s leftover entry from `group`'s members, unless the
    /// uuid has meanwhile been placed back into `group`.
    pub fn remove_old_entry(&self, group: &str, uuid: Uuid) -> bool {
        if self.membership.get(&uuid).is_some_and(|g| g.value() == group) {
            debug!(uuid = %uuid, group = %group, "Entry belongs to the group again, keeping it");
            return false;
        }
        for member in self.members(group) {
            if let Some(viewer) = self.lookup(member) {
                viewer.player().remove_tab_entry(uuid);
                viewer.forget(uuid);
            }
        }
        true
    }

    /// Forget everything other players memoized about `uuid`.
    pub fn clear_cached_data(&self, uuid: Uuid) {
        for viewer in self.players.values_cloned() {
            viewer.forget(uuid);
        }
    }

    /// Re-render header and footer for every loaded player after a reload.
    /// Membership is untouched; records pick up the new snapshot of their
    /// group when one with the same name still exists.
    pub fn reload_update(&self) -> usize {
        let settings = self.registry.settings();
        let mut refreshed = 0;
        for record in self.loaded_players() {
            let Some(current) = record.group() else {
                continue;
            };
            let group = match settings.group(&current.name) {
                Some(fresh) => {
                    record.set_group(Some(Arc::clone(fresh)));
                    Arc::clone(fresh)
                }
                None => current,
            };
            self.render_header_footer(&record, &group, true);
            refreshed += 1;
        }
        info!(players = refreshed, "Re-rendered tab list headers after reload");
        refreshed
    }

    /// Periodic refresh: re-render loaded members of `group`, sending only
    /// what changed. Returns how many players received new text.
    pub fn refresh_header_footer(&self, group: &str) -> usize {
        let mut changed = 0;
        for member in self.members(group) {
            let Some(record) = self.lookup(member).filter(|tp| tp.is_loaded()) else {
                continue;
            };
            let Some(current) = record.group() else {
                continue;
            };
            if self.render_header_footer(&record, &current, false) {
                changed += 1;
            }
        }
        changed
    }

    /// Remove entries from `player`'s client for uuids not connected to
    /// `server`. Returns the number removed.
    pub fn reconcile_with_backend(&self, player: &dyn ProxyPlayer, server: &str) -> usize {
        let backend: HashSet<Uuid> = self
            .proxy
            .players_on(server)
            .iter()
            .map(|p| p.uuid())
            .collect();
        let stale: Vec<Uuid> = player
            .tab_entries()
            .into_iter()
            .filter(|uuid| !backend.contains(uuid))
            .collect();
        for uuid in &stale {
            player.remove_tab_entry(*uuid);
        }
        stale.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn entry_for(&self, viewer: &TabPlayer, target: &TabPlayer, group: &Group) -> TabEntry {
        let target_player = target.player();
        let display_name =
            self.renderer
                .display_name(viewer.player().as_ref(), target_player.as_ref(), group);
        viewer.remember_name(target.uuid(), display_name.clone());
        TabEntry {
            uuid: target.uuid(),
            username: target_player.username(),
            display_name,
        }
    }

    /// Render and send; when not forced, only sends if the text changed.
    fn render_header_footer(&self, record: &TabPlayer, group: &Group, force: bool) -> bool {
        let player = record.player();
        let (header, footer) = self.renderer.header_footer(player.as_ref(), group);
        if !force && record.last_header_footer() == (header.clone(), footer.clone()) {
            return false;
        }
        player.send_header_footer(header.clone(), footer.clone());
        record.set_last_header_footer(header, footer);
        true
    }

    /// Players who see entries of `group`'s members.
    fn audience(&self, group: &str, exclude: Uuid, loaded_only: bool) -> Vec<Arc<TabPlayer>> {
        let candidates = if self.registry.settings().show_all_players_from_all_groups {
            self.players.values_cloned()
        } else {
            self.members(group)
                .iter()
                .filter_map(|uuid| self.lookup(*uuid))
                .collect()
        };
        candidates
            .into_iter()
            .filter(|tp| tp.uuid() != exclude && (!loaded_only || tp.is_loaded()))
            .collect()
    }

    fn assign(&self, uuid: Uuid, group: &str) {
        match self.membership.entry(uuid) {
            Entry::Occupied(mut slot) => {
                if slot.get() != group {
                    let previous = slot.insert(group.to_string());
                    self.roster_remove(&previous, uuid);
                }
                self.roster_insert(group, uuid);
            }
            Entry::Vacant(slot) => {
                self.roster_insert(group, uuid);
                slot.insert(group.to_string());
            }
        }
    }

    fn unassign(&self, uuid: Uuid) -> Option<String> {
        match self.membership.entry(uuid) {
            Entry::Occupied(slot) => {
                let group = slot.get().clone();
                self.roster_remove(&group, uuid);
                slot.remove();
                Some(group)
            }
            Entry::Vacant(_) => None,
        }
    }

    fn roster_insert(&self, group: &str, uuid: Uuid) {
        let count = {
            let mut roster = self.rosters.entry(group.to_string()).or_default();
            roster.insert(uuid);
            roster.len()
        };
        metrics::set_roster_members(group, count);
    }

    fn roster_remove(&self, group: &str, uuid: Uuid) {
        let count = match self.rosters.get_mut(group) {
            Some(mut roster) => {
                roster.remove(&uuid);
                roster.len()
            }
            None => return,
        };
        if count == 0 {
            self.rosters.remove_if(group, |_, roster| roster.is_empty());
        }
        metrics::set_roster_members(group, count);
    }
}
