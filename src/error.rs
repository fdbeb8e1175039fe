//! Unified error handling for tabsync.
//!
//! Lifecycle handling itself never fails outward: lookup misses and stale
//! deferred work are ordinary control flow. The errors here cover the edges
//! that can genuinely go wrong, which are loading configuration and talking to
//! a scheduler that has already shut down.

use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while loading or reloading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid server pattern '{pattern}' in group '{group}': {source}")]
    Pattern {
        group: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("config failed validation: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

/// Individual validation problems, all reported at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("group '{0}' is defined more than once")]
    DuplicateGroup(String),

    #[error("server pattern '{pattern}' is listed by both '{first}' and '{second}'")]
    SharedServer {
        pattern: String,
        first: String,
        second: String,
    },

    #[error("fallback is enabled but fallback group '{0}' is not defined")]
    MissingFallbackGroup(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Scheduler Errors
// ============================================================================

/// Errors returned by the task scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("task queue is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_problem() {
        let err = ConfigError::Invalid(vec![
            ValidationError::EmptyGroupName,
            ValidationError::DuplicateGroup("lobby".into()),
        ]);
        let text = err.to_string();
        assert!(text.contains("group name must not be empty"));
        assert!(text.contains("'lobby' is defined more than once"));
    }

    #[test]
    fn shared_server_names_both_groups() {
        let err = ValidationError::SharedServer {
            pattern: "hub-*".into(),
            first: "lobby".into(),
            second: "survival".into(),
        };
        assert_eq!(
            err.to_string(),
            "server pattern 'hub-*' is listed by both 'lobby' and 'survival'"
        );
    }
}
