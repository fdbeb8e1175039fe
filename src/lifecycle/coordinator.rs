//! Lifecycle state machine.
//!
//! Every event is turned into a transition that runs on the shared
//! [`TaskScheduler`], so transitions never interleave and a slow collaborator
//! never holds up the proxy's event delivery. Follow-up work is scheduled
//! with a delay and re-checks the directory when it fires.

use super::bus::{EventBus, EventHandler, EventPriority};
use super::cleanup;
use super::event::{EventKind, JoinEvent, KickEvent, LifecycleEvent, LoginStatus, QuitEvent};
use crate::cache::{NametagCache, PlaceholderCache};
use crate::metrics;
use crate::proxy::{Proxy, ProxyPlayer};
use crate::registry::GroupRegistry;
use crate::render::TabRenderer;
use crate::scheduler::TaskScheduler;
use crate::state::{DebounceSet, Directory};
use crate::telemetry::spans;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

/// Placeholder resolution resumes this long after a join.
pub const UNBLOCK_DELAY: Duration = Duration::from_millis(10);
/// Corrective removal of an entry left behind in the previous group.
pub const OLD_ENTRY_DELAY: Duration = Duration::from_millis(100);
/// Repair pass for a player that left every group.
pub const RECONCILE_DELAY: Duration = Duration::from_millis(250);
/// How long a kicked uuid counts as having just quit.
pub const JUST_QUIT_WINDOW: Duration = Duration::from_millis(300);
/// Load delay for a player rejoining inside the just-quit window.
pub const REJOIN_LOAD_DELAY: Duration = Duration::from_millis(400);
/// Load delay for every other join.
pub const LOAD_DELAY: Duration = Duration::from_millis(500);

/// External services the coordinator drives.
pub struct Collaborators {
    pub registry: Arc<dyn GroupRegistry>,
    pub proxy: Arc<dyn Proxy>,
    pub placeholders: Arc<dyn PlaceholderCache>,
    pub nametags: Arc<dyn NametagCache>,
    pub renderer: Arc<dyn TabRenderer>,
}

pub struct LifecycleCoordinator {
    this: Weak<Self>,
    directory: Arc<Directory>,
    registry: Arc<dyn GroupRegistry>,
    placeholders: Arc<dyn PlaceholderCache>,
    nametags: Arc<dyn NametagCache>,
    just_quit: Arc<DebounceSet>,
    scheduler: TaskScheduler,
    refreshers: Mutex<Vec<JoinHandle<()>>>,
}

impl LifecycleCoordinator {
    pub fn new(collaborators: Collaborators, scheduler: TaskScheduler) -> Arc<Self> {
        metrics::init();
        let Collaborators {
            registry,
            proxy,
            placeholders,
            nametags,
            renderer,
        } = collaborators;
        let directory = Arc::new(Directory::new(
            Arc::clone(&registry),
            proxy,
            renderer,
            scheduler.clone(),
        ));
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            directory,
            registry,
            placeholders,
            nametags,
            just_quit: Arc::new(DebounceSet::new()),
            scheduler,
            refreshers: Mutex::new(Vec::new()),
        })
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn just_quit(&self) -> &DebounceSet {
        &self.just_quit
    }

    /// Subscribe to the bus. Join and quit run after every other subscriber
    /// so the destination server and disconnect reason are final.
    pub fn register(self: &Arc<Self>, bus: &EventBus) {
        let handler: Arc<dyn EventHandler> = Arc::clone(self) as Arc<dyn EventHandler>;
        bus.subscribe(EventKind::Kick, EventPriority::NORMAL, Arc::clone(&handler));
        bus.subscribe(EventKind::Join, EventPriority::LAST, Arc::clone(&handler));
        bus.subscribe(EventKind::Quit, EventPriority::LAST, Arc::clone(&handler));
        bus.subscribe(EventKind::Reload, EventPriority::NORMAL, handler);
    }

    // ========================================================================
    // Event entry points
    // ========================================================================

    pub fn on_kick(&self, event: KickEvent) {
        let uuid = event.player.uuid();
        self.transition(EventKind::Kick, Some(uuid), move |this| async move {
            this.kick(&event);
        });
    }

    pub fn on_join(&self, event: JoinEvent) {
        let uuid = event.player.uuid();
        self.transition(EventKind::Join, Some(uuid), move |this| async move {
            this.join(&event);
        });
    }

    pub fn on_quit(&self, event: QuitEvent) {
        let uuid = event.player.uuid();
        if event.status == LoginStatus::ConflictingLogin {
            metrics::record_event(EventKind::Quit.label());
            debug!(uuid = %uuid, "Quit superseded by a newer login, leaving it to the join");
            return;
        }
        self.transition(EventKind::Quit, Some(uuid), move |this| async move {
            this.quit(&event);
        });
    }

    pub fn on_reload(&self) {
        self.transition(EventKind::Reload, None, |this| async move {
            this.reload().await;
        });
    }

    fn transition<F, Fut>(&self, kind: EventKind, uuid: Option<uuid::Uuid>, body: F)
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        metrics::record_event(kind.label());
        let task = body(this).instrument(spans::lifecycle_event(kind.label(), uuid));
        if let Err(error) = self.scheduler.run(kind.label(), task) {
            warn!(kind = %kind, error = %error, "Dropped lifecycle event");
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn kick(&self, event: &KickEvent) {
        let player = event.player.as_ref();
        let uuid = player.uuid();
        clear_client(player, false);

        if !event.result.removes_player() {
            debug!(uuid = %uuid, server = %event.server, "Kick only notified the player");
            return;
        }

        self.directory.remove_player(uuid);
        clear_client(player, true);

        let stamp = self.just_quit.mark(uuid);
        let just_quit = Arc::clone(&self.just_quit);
        self.scheduler
            .run_delayed("just-quit-expiry", JUST_QUIT_WINDOW, async move {
                just_quit.expire(uuid, stamp);
            });
        debug!(uuid = %uuid, server = %event.server, "Kicked player removed from tab lists");
    }

    fn join(&self, event: &JoinEvent) {
        let player = &event.player;
        let uuid = player.uuid();
        let server = event.server.as_str();
        let settings = self.registry.settings();

        let group = self.directory.resolve_group(server);
        let previous = self.directory.lookup(uuid);
        let previous_group = previous.as_ref().and_then(|tp| tp.group());

        self.directory.clear_cached_data(uuid);
        self.placeholders.clear_all(uuid);
        if let Some(previous) = &previous {
            previous.set_loaded(false);
        }

        if !settings.show_all_players_from_all_groups
            && let Some(old) = &previous_group
            && group.as_ref().is_none_or(|g| g.name != old.name)
        {
            self.directory.evict(uuid);
            let directory = Arc::clone(&self.directory);
            let old_name = old.name.clone();
            self.scheduler
                .run_delayed("remove-old-entry", OLD_ENTRY_DELAY, async move {
                    directory.remove_old_entry(&old_name, uuid);
                });

            if group.is_none()
                && let Some(current) = player.current_server()
            {
                self.schedule_reconcile(Arc::clone(player), current);
            }
        }

        let fallback_or_none = group.as_ref().is_none_or(|g| g.is_default(&settings));
        let listed = settings.groups.iter().any(|g| g.contains_server(server));
        if fallback_or_none && !settings.fallback_enabled && !listed {
            if let Some(previous) = &previous
                && event.previous_server.is_some()
            {
                cleanup::schedule(&self.directory, &self.scheduler, previous);
                self.directory.remove_player(uuid);
            }
            debug!(uuid = %uuid, server = %server, "Server is excluded from tab lists");
            return;
        }

        let Some(group) = group else {
            debug!(uuid = %uuid, server = %server, "No group applies to server");
            return;
        };

        self.nametags.reset(uuid, &group);
        let placeholders = Arc::clone(&self.placeholders);
        self.scheduler
            .run_delayed("unblock-placeholders", UNBLOCK_DELAY, async move {
                placeholders.unblock(uuid);
            });

        let delay = if self.just_quit.contains(uuid) {
            REJOIN_LOAD_DELAY
        } else {
            LOAD_DELAY
        };
        debug!(uuid = %uuid, group = %group.name, server = %server, "Player joining group");
        self.directory.load_player(Arc::clone(player), group, delay);
    }

    fn schedule_reconcile(&self, player: Arc<dyn ProxyPlayer>, server: String) {
        let uuid = player.uuid();
        let check = (Arc::clone(&self.directory), Arc::clone(&player), server.clone());
        let directory = Arc::clone(&self.directory);
        self.scheduler.run_guarded(
            "reconcile-backend",
            RECONCILE_DELAY,
            move || {
                let (directory, player, server) = check;
                player.is_active()
                    && player.current_server().as_deref() == Some(server.as_str())
                    && directory.lookup(uuid).is_none()
            },
            async move {
                let removed = directory.reconcile_with_backend(player.as_ref(), &server);
                if removed > 0 {
                    debug!(
                        uuid = %uuid,
                        server = %server,
                        removed,
                        "Removed entries missing from backend"
                    );
                }
            },
        );
    }

    fn quit(&self, event: &QuitEvent) {
        let uuid = event.player.uuid();
        self.directory.remove_player(uuid);
        self.placeholders.clear_all(uuid);
        self.placeholders.unblock(uuid);
    }

    async fn reload(&self) {
        if let Err(error) = self.registry.reload().await {
            warn!(
                error = %error,
                "Failed to reload tab list configuration, keeping previous groups"
            );
            return;
        }
        info!("Tab list configuration reloaded");
        self.directory.reload_update();
        self.start_refreshers();
    }

    // ========================================================================
    // Periodic refresh
    // ========================================================================

    /// (Re)start one header/footer refresh task per group with a non-zero
    /// update rate. Previous tasks are aborted.
    pub fn start_refreshers(&self) {
        let settings = self.registry.settings();
        let mut refreshers = self.refreshers.lock();
        for handle in refreshers.drain(..) {
            handle.abort();
        }

        for group in settings
            .groups
            .iter()
            .filter(|g| g.header_footer_update_rate_ms > 0)
        {
            let period = Duration::from_millis(group.header_footer_update_rate_ms);
            let directory = Arc::clone(&self.directory);
            let scheduler = self.scheduler.clone();
            let name = group.name.clone();

            refreshers.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let directory = Arc::clone(&directory);
                    let name = name.clone();
                    let queued = scheduler.run("refresh-header-footer", async move {
                        directory.refresh_header_footer(&name);
                    });
                    if queued.is_err() {
                        break;
                    }
                }
            }));
        }
        debug!(tasks = refreshers.len(), "Header refresh tasks started");
    }

    pub fn refresher_count(&self) -> usize {
        self.refreshers.lock().len()
    }

    /// Stop the refresh tasks. Queued transitions still run.
    pub fn shutdown(&self) {
        for handle in self.refreshers.lock().drain(..) {
            handle.abort();
        }
    }
}

#[async_trait]
impl EventHandler for LifecycleCoordinator {
    async fn handle(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Kick(kick) => self.on_kick(kick.clone()),
            LifecycleEvent::Join(join) => self.on_join(join.clone()),
            LifecycleEvent::Quit(quit) => self.on_quit(quit.clone()),
            LifecycleEvent::Reload => self.on_reload(),
        }
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        for handle in self.refreshers.get_mut().drain(..) {
            handle.abort();
        }
    }
}

/// Strip a client's view: foreign entries always, its own entry on request,
/// and the header/footer.
fn clear_client(player: &dyn ProxyPlayer, including_own: bool) {
    let uuid = player.uuid();
    for entry in player.tab_entries() {
        if including_own || entry != uuid {
            player.remove_tab_entry(entry);
        }
    }
    player.clear_header_footer();
}
