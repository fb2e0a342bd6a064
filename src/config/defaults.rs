//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

use crate::shortcuts::keycodes::key;
use crate::shortcuts::Modifiers;

/// Config file location, tilde-expanded at load time
pub const DEFAULT_CONFIG_PATH: &str = "~/.kiwa/config.json";

/// Default panel hotkey: ⌥ ⇧ D
pub const DEFAULT_HOTKEY_KEY_CODE: u16 = key::D;
pub const DEFAULT_HOTKEY_MODIFIERS: Modifiers = Modifiers::SHIFT.union(Modifiers::OPTION);

/// Default panel size in points
pub const DEFAULT_PANEL_WIDTH: f64 = 260.0;
pub const DEFAULT_PANEL_HEIGHT: f64 = 320.0;

/// Smallest panel size accepted from the config file
pub const MIN_PANEL_WIDTH: f64 = 160.0;
pub const MIN_PANEL_HEIGHT: f64 = 120.0;
