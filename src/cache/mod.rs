//! Per-player caches owned by external collaborators.
//!
//! The lifecycle engine only needs the invalidation half of these caches.
//! Resolution and packet construction stay inside the collaborators; the
//! in-memory implementations here are complete enough to embed or test with.

mod nametag;
mod placeholder;

pub use nametag::MemoryNametagCache;
pub use placeholder::MemoryPlaceholderCache;

use crate::config::Group;
use uuid::Uuid;

/// Cached placeholder values per player.
pub trait PlaceholderCache: Send + Sync {
    /// Drop every cached value for `uuid` and block new resolution until
    /// [`PlaceholderCache::unblock`] is called.
    fn clear_all(&self, uuid: Uuid);

    fn unblock(&self, uuid: Uuid);
}

/// Scoreboard team assignments per group.
pub trait NametagCache: Send + Sync {
    /// Forget the team assignment `uuid` holds for `group`.
    fn reset(&self, uuid: Uuid, group: &Group);
}
