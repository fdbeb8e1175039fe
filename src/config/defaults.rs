//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Settings Defaults
// =============================================================================

pub fn default_fallback_group() -> String {
    "default".to_string()
}

// =============================================================================
// Group Defaults
// =============================================================================

pub fn default_format() -> String {
    "%username%".to_string()
}

pub fn default_header_footer_update_rate_ms() -> u64 {
    1000
}

pub fn default_placeholder_update_rate_ms() -> u64 {
    1000
}
