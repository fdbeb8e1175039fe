//! tabsync - tab list lifecycle and state synchronization for game proxies.
//!
//! A proxy fronting several backend servers shows each connected player a
//! tab list. Servers are grouped; players see the roster, header and footer
//! of the group their current server belongs to. This crate keeps those
//! views consistent while players join, move between servers, get kicked
//! and quit, and while the group configuration is reloaded.
//!
//! The entry point is [`LifecycleCoordinator`]: feed it lifecycle events
//! (directly or through an [`EventBus`]) and it drives the [`Directory`]
//! and the proxy's client views through a serialized [`TaskScheduler`].

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod proxy;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod telemetry;

pub use config::{Group, Settings};
pub use error::{ConfigError, SchedulerError, ValidationError};
pub use lifecycle::{
    Collaborators, EventBus, EventKind, JoinEvent, KickEvent, KickResult, LifecycleCoordinator,
    LifecycleEvent, LoginStatus, QuitEvent,
};
pub use proxy::{Proxy, ProxyPlayer, TabEntry, Text};
pub use registry::{ConfigGroupRegistry, GroupRegistry};
pub use render::{PlainRenderer, TabRenderer};
pub use scheduler::TaskScheduler;
pub use state::{DebounceSet, Directory, TabPlayer};
