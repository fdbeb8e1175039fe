//! Integration test harness.
//!
//! Builds a coordinator over the in-memory proxy and caches, wired through
//! an event bus the way a host proxy would wire it. Tests run with paused
//! tokio time and move the clock with [`Harness::advance`].

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tabsync::cache::{MemoryNametagCache, MemoryPlaceholderCache};
use tabsync::proxy::{MemoryPlayer, MemoryProxy};
use tabsync::{
    Collaborators, ConfigGroupRegistry, Directory, EventBus, JoinEvent, KickEvent, KickResult,
    LifecycleCoordinator, LifecycleEvent, LoginStatus, PlainRenderer, ProxyPlayer, QuitEvent,
    Settings, TaskScheduler,
};

pub const CONFIG: &str = r#"
fallback_enabled = false

[[groups]]
name = "lobby"
servers = ["lobby-*"]
headers = ["Lobby | %username%"]
footers = ["%server%"]
format = "[L] %username%"
header_footer_update_rate_ms = 0

[[groups]]
name = "survival"
servers = ["survival"]
headers = ["Survival"]
footers = ["Have fun"]
header_footer_update_rate_ms = 0
"#;

pub struct Harness {
    pub proxy: Arc<MemoryProxy>,
    pub registry: Arc<ConfigGroupRegistry>,
    pub placeholders: Arc<MemoryPlaceholderCache>,
    pub nametags: Arc<MemoryNametagCache>,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub bus: EventBus,
}

impl Harness {
    pub fn new(config: &str) -> Self {
        let settings = Settings::parse(config).expect("test config parses");
        Self::with_registry(ConfigGroupRegistry::from_settings(settings))
    }

    pub fn with_registry(registry: ConfigGroupRegistry) -> Self {
        let proxy = Arc::new(MemoryProxy::new());
        let registry = Arc::new(registry);
        let placeholders = Arc::new(MemoryPlaceholderCache::new());
        let nametags = Arc::new(MemoryNametagCache::new());
        let coordinator = LifecycleCoordinator::new(
            Collaborators {
                registry: registry.clone(),
                proxy: proxy.clone(),
                placeholders: placeholders.clone(),
                nametags: nametags.clone(),
                renderer: Arc::new(PlainRenderer),
            },
            TaskScheduler::spawn(),
        );
        let bus = EventBus::new();
        coordinator.register(&bus);
        Self {
            proxy,
            registry,
            placeholders,
            nametags,
            coordinator,
            bus,
        }
    }

    pub fn directory(&self) -> &Arc<Directory> {
        self.coordinator.directory()
    }

    /// Run everything queued so far.
    pub async fn settle(&self) {
        self.coordinator
            .scheduler()
            .flush()
            .await
            .expect("scheduler running");
    }

    /// Move the clock forward and run whatever became due.
    pub async fn advance(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.settle().await;
    }

    pub async fn join(&self, player: &Arc<MemoryPlayer>, server: &str, previous: Option<&str>) {
        player.set_server(Some(server));
        self.bus
            .publish(LifecycleEvent::Join(JoinEvent {
                player: player.clone(),
                server: server.to_string(),
                previous_server: previous.map(str::to_string),
            }))
            .await;
        self.settle().await;
    }

    pub async fn kick(&self, player: &Arc<MemoryPlayer>, result: KickResult) {
        let server = player.current_server().unwrap_or_default();
        self.bus
            .publish(LifecycleEvent::Kick(KickEvent {
                player: player.clone(),
                server,
                result,
            }))
            .await;
        self.settle().await;
    }

    pub async fn quit(&self, player: &Arc<MemoryPlayer>, status: LoginStatus) {
        self.bus
            .publish(LifecycleEvent::Quit(QuitEvent {
                player: player.clone(),
                status,
            }))
            .await;
        self.settle().await;
    }

    pub async fn reload(&self) {
        self.bus.publish(LifecycleEvent::Reload).await;
        self.settle().await;
    }

    /// Connect a fresh player and wait until its tab list is loaded.
    pub async fn connect_loaded(&self, name: &str, server: &str) -> Arc<MemoryPlayer> {
        let player = self.proxy.connect(name, server);
        self.join(&player, server, None).await;
        self.advance(501).await;
        player
    }

    pub fn is_loaded(&self, player: &MemoryPlayer) -> bool {
        self.directory()
            .lookup(player.uuid())
            .is_some_and(|tp| tp.is_loaded())
    }
}
