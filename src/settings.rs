//! "Open settings" action.
//!
//! There is no settings window; settings live in the config file, which is
//! created with defaults if needed and handed to the system default editor.
//! Changes are picked up by the config watcher.

use std::path::PathBuf;

use tracing::info;

use crate::config;
use crate::error::{KiwaError, Result};

pub trait SettingsOpener {
    fn open_settings(&self) -> Result<()>;
}

pub struct ConfigFileSettings {
    path: PathBuf,
}

impl ConfigFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SettingsOpener for ConfigFileSettings {
    fn open_settings(&self) -> Result<()> {
        config::ensure_config_file(&self.path)?;
        open::that(&self.path)
            .map_err(|e| KiwaError::Platform(format!("open {}: {}", self.path.display(), e)))?;
        info!(path = %self.path.display(), "Opened settings file");
        Ok(())
    }
}
