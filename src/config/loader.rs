//! Configuration loading from the file system

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;
use crate::error::{KiwaError, Result};

/// Resolved path of the default config file (~/.kiwa/config.json)
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Read and parse a config file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|source| KiwaError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str::<Config>(&contents)?;
    Ok(config)
}

/// Load configuration from `path`, or ~/.kiwa/config.json when `None`.
///
/// Returns Config::default() if the file is missing, unreadable or invalid.
#[instrument(name = "load_config", skip_all)]
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    match load_config_from(&config_path) {
        Ok(config) => {
            info!(
                path = %config_path.display(),
                hotkey = %config.hotkey,
                symbols = config.symbols.len(),
                "Successfully loaded config"
            );
            config
        }
        Err(e) => {
            warn!(
                path = %config_path.display(),
                error = %e,
                hint = %parse_hint(&e),
                "Failed to load config, using defaults"
            );
            Config::default()
        }
    }
}

/// Re-read the config file after a change notification.
///
/// Unlike [`load_config`] this never falls back to defaults: a missing,
/// unreadable or invalid file yields `None` so the running configuration
/// stays in effect.
#[instrument(name = "reload_config", skip_all)]
pub fn reload_config(path: &Path) -> Option<Config> {
    if !path.exists() {
        info!(path = %path.display(), "Config file removed, keeping current config");
        return None;
    }

    match load_config_from(path) {
        Ok(config) => {
            info!(
                path = %path.display(),
                hotkey = %config.hotkey,
                symbols = config.symbols.len(),
                "Reloaded config"
            );
            Some(config)
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                hint = %parse_hint(&e),
                "Config reload failed, keeping current config"
            );
            None
        }
    }
}

fn parse_hint(error: &KiwaError) -> &'static str {
    let message = error.to_string();
    if message.contains("slotNumber") {
        "Every symbol needs 'opening', 'label' and 'slotNumber' (1-9)"
    } else if message.contains("hotkey") {
        "Hotkey must be { \"keyCode\": 2, \"modifiers\": 2560 } or a string like \"opt+shift+d\""
    } else {
        ""
    }
}

/// Write the default configuration when no file exists at `path`.
/// Returns `true` when a new file was created.
pub fn ensure_config_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let write_err = |source| KiwaError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, Config::default().to_pretty_json()).map_err(write_err)?;
    info!(path = %path.display(), "Created default config file");
    Ok(true)
}
