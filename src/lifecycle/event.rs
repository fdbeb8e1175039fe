//! Lifecycle events delivered by the proxy.

use crate::proxy::ProxyPlayer;
use std::fmt;
use std::sync::Arc;

/// What the proxy decided to do with a kicked player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickResult {
    DisconnectPlayer,
    RedirectPlayer { server: String },
    /// Player stays connected and is only shown a message.
    Notify,
}

impl KickResult {
    /// Whether the player leaves its current server.
    pub fn removes_player(&self) -> bool {
        !matches!(self, Self::Notify)
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    SuccessfulLogin,
    /// A newer connection for the same identity is taking over.
    ConflictingLogin,
    CanceledByUser,
    CanceledByProxy,
    PreServerJoin,
}

#[derive(Debug, Clone)]
pub struct KickEvent {
    pub player: Arc<dyn ProxyPlayer>,
    pub server: String,
    pub result: KickResult,
}

/// The player finished connecting to `server`.
#[derive(Debug, Clone)]
pub struct JoinEvent {
    pub player: Arc<dyn ProxyPlayer>,
    pub server: String,
    /// `None` on the first server of a session.
    pub previous_server: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuitEvent {
    pub player: Arc<dyn ProxyPlayer>,
    pub status: LoginStatus,
}

#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Kick(KickEvent),
    Join(JoinEvent),
    Quit(QuitEvent),
    Reload,
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Kick(_) => EventKind::Kick,
            Self::Join(_) => EventKind::Join,
            Self::Quit(_) => EventKind::Quit,
            Self::Reload => EventKind::Reload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Kick,
    Join,
    Quit,
    Reload,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Join => "join",
            Self::Quit => "quit",
            Self::Reload => "reload",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
