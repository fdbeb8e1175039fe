//! Player lifecycle handling: events, the bus that delivers them, and the
//! coordinator that turns them into directory transitions.

mod bus;
pub mod cleanup;
mod coordinator;
mod event;

pub use bus::{EventBus, EventHandler, EventPriority};
pub use coordinator::{
    Collaborators, JUST_QUIT_WINDOW, LOAD_DELAY, LifecycleCoordinator, OLD_ENTRY_DELAY,
    RECONCILE_DELAY, REJOIN_LOAD_DELAY, UNBLOCK_DELAY,
};
pub use event::{
    EventKind, JoinEvent, KickEvent, KickResult, LifecycleEvent, LoginStatus, QuitEvent,
};
