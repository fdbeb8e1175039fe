//! Synchronization state.
//!
//! [`Directory`] is the authoritative in-memory view of who is tracked and
//! which group roster holds them. [`TabPlayer`] is the per-player record and
//! [`DebounceSet`] remembers recently kicked players.

mod dashmap_ext;
mod debounce;
mod directory;
mod tab_player;

pub use dashmap_ext::DashMapExt;
pub use debounce::DebounceSet;
pub use directory::Directory;
pub use tab_player::TabPlayer;
