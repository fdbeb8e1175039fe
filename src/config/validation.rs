//! Configuration validation.
//!
//! Validates settings on load and on reload so a broken file never replaces a
//! working group set.

use super::Settings;
use crate::error::ValidationError;
use std::collections::{HashMap, HashSet};

/// Validate settings, returning all errors found.
pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_groups = HashSet::new();
    let mut seen_servers: HashMap<String, &str> = HashMap::new();

    for group in &settings.groups {
        if group.name.is_empty() {
            errors.push(ValidationError::EmptyGroupName);
            continue;
        }
        if !seen_groups.insert(group.name.as_str()) {
            errors.push(ValidationError::DuplicateGroup(group.name.clone()));
            continue;
        }

        for pattern in &group.servers {
            let key = pattern.to_lowercase();
            match seen_servers.get(&key) {
                Some(first) => errors.push(ValidationError::SharedServer {
                    pattern: pattern.clone(),
                    first: first.to_string(),
                    second: group.name.clone(),
                }),
                None => {
                    seen_servers.insert(key, group.name.as_str());
                }
            }
        }
    }

    if settings.fallback_enabled && settings.group(&settings.fallback_group).is_none() {
        errors.push(ValidationError::MissingFallbackGroup(
            settings.fallback_group.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
