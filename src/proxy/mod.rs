//! Proxy session primitives.
//!
//! The engine never owns connections. It drives them through these traits:
//! editing a client's tab list, reading and writing its header and footer,
//! and asking which players sit on a backend server. Wire encoding of the
//! resulting packets belongs to the host proxy.

mod memory;

pub use memory::{MemoryPlayer, MemoryProxy};

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Rendered text as shown by the client. The empty string is the empty component.
pub type Text = String;

/// One row of a client's tab list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEntry {
    pub uuid: Uuid,
    pub username: String,
    pub display_name: Text,
}

/// A live player connection as seen through the proxy.
pub trait ProxyPlayer: fmt::Debug + Send + Sync {
    fn uuid(&self) -> Uuid;

    fn username(&self) -> String;

    /// Backend server the player is currently connected to.
    fn current_server(&self) -> Option<String>;

    /// Whether the connection is still open.
    fn is_active(&self) -> bool;

    /// Uuids currently listed on this player's own client.
    fn tab_entries(&self) -> Vec<Uuid>;

    fn add_tab_entry(&self, entry: TabEntry);

    fn remove_tab_entry(&self, uuid: Uuid);

    /// Rename an existing entry; returns false when the client has no such entry.
    fn set_entry_display_name(&self, uuid: Uuid, display_name: Text) -> bool;

    /// Header and footer the client currently displays.
    fn header_footer(&self) -> (Text, Text);

    fn send_header_footer(&self, header: Text, footer: Text);

    fn clear_header_footer(&self) {
        self.send_header_footer(Text::new(), Text::new());
    }
}

/// Proxy-wide queries.
pub trait Proxy: Send + Sync {
    fn player(&self, uuid: Uuid) -> Option<Arc<dyn ProxyPlayer>>;

    /// Players currently connected to `server`.
    fn players_on(&self, server: &str) -> Vec<Arc<dyn ProxyPlayer>>;
}
