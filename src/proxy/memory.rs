//! In-memory proxy used by tests, benches and dry runs.

use super::{Proxy, ProxyPlayer, TabEntry, Text};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct ClientView {
    server: Option<String>,
    active: bool,
    entries: BTreeMap<Uuid, TabEntry>,
    header: Text,
    footer: Text,
}

/// A simulated client connection with its own tab list copy.
#[derive(Debug)]
pub struct MemoryPlayer {
    uuid: Uuid,
    username: String,
    view: Mutex<ClientView>,
}

impl MemoryPlayer {
    pub fn new(uuid: Uuid, username: impl Into<String>) -> Self {
        Self {
            uuid,
            username: username.into(),
            view: Mutex::new(ClientView {
                active: true,
                ..ClientView::default()
            }),
        }
    }

    pub fn set_server(&self, server: Option<&str>) {
        self.view.lock().server = server.map(str::to_string);
    }

    pub fn entry(&self, uuid: Uuid) -> Option<TabEntry> {
        self.view.lock().entries.get(&uuid).cloned()
    }

    pub fn has_entry(&self, uuid: Uuid) -> bool {
        self.view.lock().entries.contains_key(&uuid)
    }

    fn close(&self) {
        let mut view = self.view.lock();
        view.active = false;
        view.server = None;
    }
}

impl ProxyPlayer for MemoryPlayer {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn username(&self) -> String {
        self.username.clone()
    }

    fn current_server(&self) -> Option<String> {
        self.view.lock().server.clone()
    }

    fn is_active(&self) -> bool {
        self.view.lock().active
    }

    fn tab_entries(&self) -> Vec<Uuid> {
        self.view.lock().entries.keys().copied().collect()
    }

    fn add_tab_entry(&self, entry: TabEntry) {
        self.view.lock().entries.insert(entry.uuid, entry);
    }

    fn remove_tab_entry(&self, uuid: Uuid) {
        self.view.lock().entries.remove(&uuid);
    }

    fn set_entry_display_name(&self, uuid: Uuid, display_name: Text) -> bool {
        match self.view.lock().entries.get_mut(&uuid) {
            Some(entry) => {
                entry.display_name = display_name;
                true
            }
            None => false,
        }
    }

    fn header_footer(&self) -> (Text, Text) {
        let view = self.view.lock();
        (view.header.clone(), view.footer.clone())
    }

    fn send_header_footer(&self, header: Text, footer: Text) {
        let mut view = self.view.lock();
        view.header = header;
        view.footer = footer;
    }
}

/// A proxy whose connections live entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryProxy {
    players: DashMap<Uuid, Arc<MemoryPlayer>>,
}

impl MemoryProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection for a fresh player already placed on `server`.
    pub fn connect(&self, username: &str, server: &str) -> Arc<MemoryPlayer> {
        self.connect_as(Uuid::new_v4(), username, server)
    }

    /// Open a connection for a known uuid, replacing any existing one.
    pub fn connect_as(&self, uuid: Uuid, username: &str, server: &str) -> Arc<MemoryPlayer> {
        let player = Arc::new(MemoryPlayer::new(uuid, username));
        player.set_server(Some(server));
        if let Some(previous) = self.players.insert(uuid, Arc::clone(&player)) {
            previous.close();
        }
        player
    }

    pub fn get(&self, uuid: Uuid) -> Option<Arc<MemoryPlayer>> {
        self.players.get(&uuid).map(|p| Arc::clone(p.value()))
    }

    /// Close the connection and forget the player.
    pub fn disconnect(&self, uuid: Uuid) {
        if let Some((_, player)) = self.players.remove(&uuid) {
            player.close();
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Proxy for MemoryProxy {
    fn player(&self, uuid: Uuid) -> Option<Arc<dyn ProxyPlayer>> {
        self.get(uuid).map(|p| p as Arc<dyn ProxyPlayer>)
    }

    fn players_on(&self, server: &str) -> Vec<Arc<dyn ProxyPlayer>> {
        self.players
            .iter()
            .filter(|p| p.current_server().as_deref() == Some(server))
            .map(|p| Arc::clone(p.value()) as Arc<dyn ProxyPlayer>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uuid: Uuid, name: &str) -> TabEntry {
        TabEntry {
            uuid,
            username: name.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn client_view_tracks_entries_and_header() {
        let proxy = MemoryProxy::new();
        let alice = proxy.connect("alice", "lobby");
        let bob = Uuid::new_v4();

        alice.add_tab_entry(entry(bob, "bob"));
        assert_eq!(alice.tab_entries(), vec![bob]);
        assert!(alice.set_entry_display_name(bob, "Bob!".into()));
        assert_eq!(alice.entry(bob).unwrap().display_name, "Bob!");
        assert!(!alice.set_entry_display_name(Uuid::new_v4(), "x".into()));

        alice.send_header_footer("head".into(), "foot".into());
        assert_eq!(alice.header_footer(), ("head".into(), "foot".into()));
        alice.clear_header_footer();
        assert_eq!(alice.header_footer(), (String::new(), String::new()));
    }

    #[test]
    fn players_on_filters_by_server() {
        let proxy = MemoryProxy::new();
        let alice = proxy.connect("alice", "lobby");
        proxy.connect("bob", "survival");

        let on_lobby = proxy.players_on("lobby");
        assert_eq!(on_lobby.len(), 1);
        assert_eq!(on_lobby[0].uuid(), alice.uuid());
    }

    #[test]
    fn reconnect_closes_previous_connection() {
        let proxy = MemoryProxy::new();
        let first = proxy.connect("alice", "lobby");
        let second = proxy.connect_as(first.uuid(), "alice", "survival");

        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(proxy.len(), 1);
    }

    #[test]
    fn disconnect_marks_inactive() {
        let proxy = MemoryProxy::new();
        let alice = proxy.connect("alice", "lobby");
        proxy.disconnect(alice.uuid());

        assert!(!alice.is_active());
        assert!(alice.current_server().is_none());
        assert!(proxy.player(alice.uuid()).is_none());
    }
}
