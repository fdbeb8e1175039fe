//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: top-level [`Settings`] and file loading
//! - [`group`]: [`Group`] definitions and server matching
//! - [`validation`]: cross-group consistency checks

mod defaults;
mod group;
mod types;
mod validation;

pub use group::{Group, NametagTemplate};
pub use types::Settings;
pub use validation::validate;
