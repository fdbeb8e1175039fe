//! Group registry: server name to group resolution.
//!
//! Groups are published as one immutable [`Settings`] snapshot. A reload
//! parses and validates the new file first and swaps the snapshot only on
//! success, so readers never observe a half-applied configuration.

use crate::config::{Group, Settings};
use crate::error::ConfigError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves backend servers to groups; reloadable.
#[async_trait]
pub trait GroupRegistry: Send + Sync {
    /// Current settings snapshot.
    fn settings(&self) -> Arc<Settings>;

    /// Group owning `server`, or the fallback group when enabled.
    fn resolve(&self, server: &str) -> Option<Arc<Group>> {
        self.settings().group_for_server(server)
    }

    /// Reload group definitions from their source.
    async fn reload(&self) -> Result<(), ConfigError>;
}

/// Registry backed by a TOML file (or a fixed snapshot).
#[derive(Debug)]
pub struct ConfigGroupRegistry {
    path: Option<PathBuf>,
    current: RwLock<Arc<Settings>>,
}

impl ConfigGroupRegistry {
    /// Registry over fixed settings; `reload` keeps them.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Load the file now and reload from it on every `reload`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = Settings::load(&path)?;
        info!(
            path = %path.display(),
            groups = settings.groups.len(),
            "Loaded tab list groups"
        );
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(settings)),
        })
    }

    /// Publish a new snapshot directly.
    pub fn replace(&self, settings: Settings) {
        *self.current.write() = Arc::new(settings);
    }
}

#[async_trait]
impl GroupRegistry for ConfigGroupRegistry {
    fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read())
    }

    async fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            debug!("Registry has no backing file, keeping current groups");
            return Ok(());
        };
        let settings = Settings::load_async(path).await?;
        info!(
            path = %path.display(),
            groups = settings.groups.len(),
            "Reloaded tab list groups"
        );
        self.replace(settings);
        Ok(())
    }
}
