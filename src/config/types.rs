//! Core configuration types and loading.

use super::defaults::{default_fallback_group, default_true};
use super::group::Group;
use super::validation::validate;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Tab list settings and group definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Mirror every loaded player to every client regardless of group.
    #[serde(default)]
    pub show_all_players_from_all_groups: bool,
    /// Servers not listed by any group use the fallback group.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    #[serde(default = "default_fallback_group")]
    pub fallback_group: String,
    #[serde(default)]
    pub groups: Vec<Arc<Group>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_all_players_from_all_groups: false,
            fallback_enabled: true,
            fallback_group: default_fallback_group(),
            groups: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse, compile and validate settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = toml::from_str(content)?;
        for group in &mut settings.groups {
            Arc::make_mut(group).compile()?;
        }
        validate(&settings).map_err(ConfigError::Invalid)?;
        Ok(settings)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration without blocking the runtime.
    pub async fn load_async<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&Arc<Group>> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// The group owning `server`, else the fallback group when enabled.
    pub fn group_for_server(&self, server: &str) -> Option<Arc<Group>> {
        if let Some(group) = self.groups.iter().find(|g| g.contains_server(server)) {
            return Some(Arc::clone(group));
        }
        if !self.fallback_enabled {
            return None;
        }
        self.group(&self.fallback_group).cloned()
    }
}
