//! Stale header/footer cleanup for players leaving every group.
//!
//! A player moving to an excluded server keeps whatever header, footer and
//! formatted names it was last sent. Nothing will overwrite them later, so
//! once the connection settles they are cleared here, but only if nobody
//! else has written new text in the meantime.

use crate::proxy::{ProxyPlayer, Text};
use crate::scheduler::TaskScheduler;
use crate::state::{Directory, TabPlayer};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const STALE_CLEANUP_DELAY: Duration = Duration::from_millis(500);

/// Capture `departed`'s last header/footer and schedule the cleanup. The
/// viewers reset are those sharing the player's server when it fires.
/// Dropped at fire time if the uuid has been tracked again.
pub fn schedule(directory: &Arc<Directory>, scheduler: &TaskScheduler, departed: &TabPlayer) {
    let snapshot = departed.last_header_footer();
    let player = departed.player();
    let uuid = departed.uuid();
    let check = Arc::clone(directory);
    let directory = Arc::clone(directory);

    scheduler.run_guarded(
        "stale-header-cleanup",
        STALE_CLEANUP_DELAY,
        move || check.lookup(uuid).is_none(),
        async move {
            clear_stale(&directory, player.as_ref(), &snapshot);
        },
    );
}

/// Returns whether anything was cleared.
pub(crate) fn clear_stale(
    directory: &Directory,
    player: &dyn ProxyPlayer,
    snapshot: &(Text, Text),
) -> bool {
    let live = player.header_footer();
    let untouched = live == *snapshot;
    let blank = live.0.is_empty() && live.1.is_empty();
    if !untouched && !blank {
        debug!(uuid = %player.uuid(), "Header changed since departure, leaving it");
        return false;
    }

    player.clear_header_footer();
    let server = player.current_server();
    if let Some(server) = &server {
        let uuid = player.uuid();
        let username = player.username();
        for viewer in directory.proxy().players_on(server) {
            if viewer.uuid() != uuid {
                viewer.set_entry_display_name(uuid, username.clone());
            }
        }
    }
    debug!(uuid = %player.uuid(), server = ?server, "Cleared stale header and names");
    true
}
