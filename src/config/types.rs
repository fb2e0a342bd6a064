//! Configuration type definitions

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::shortcuts::HotkeyCombo;
use crate::symbols::{default_symbols, Symbol};

/// Top-level configuration, persisted as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Shortcut that toggles the panel (default: ⌥ ⇧ D).
    /// Accepts `{ "keyCode": 2, "modifiers": 2560 }` or a string like `"opt+shift+d"`.
    #[serde(default = "default_hotkey")]
    pub hotkey: HotkeyCombo,
    /// Panel width in points (default: 260)
    #[serde(default = "default_panel_width")]
    pub panel_width: f64,
    /// Maximum panel height in points (default: 320)
    #[serde(default = "default_panel_height")]
    pub panel_height: f64,
    /// Symbols shown in the panel, one per slot 1-9
    #[serde(default = "default_symbols")]
    pub symbols: Vec<Symbol>,
}

fn default_hotkey() -> HotkeyCombo {
    HotkeyCombo::new(DEFAULT_HOTKEY_KEY_CODE, DEFAULT_HOTKEY_MODIFIERS)
}
fn default_panel_width() -> f64 {
    DEFAULT_PANEL_WIDTH
}
fn default_panel_height() -> f64 {
    DEFAULT_PANEL_HEIGHT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hotkey: default_hotkey(),
            panel_width: DEFAULT_PANEL_WIDTH,
            panel_height: DEFAULT_PANEL_HEIGHT,
            symbols: default_symbols(),
        }
    }
}

impl Config {
    /// Panel width clamped to a usable minimum
    pub fn get_panel_width(&self) -> f64 {
        if self.panel_width.is_finite() {
            self.panel_width.max(MIN_PANEL_WIDTH)
        } else {
            DEFAULT_PANEL_WIDTH
        }
    }

    /// Maximum panel height clamped to a usable minimum
    pub fn get_panel_height(&self) -> f64 {
        if self.panel_height.is_finite() {
            self.panel_height.max(MIN_PANEL_HEIGHT)
        } else {
            DEFAULT_PANEL_HEIGHT
        }
    }

    /// Pretty JSON used for `--print-default-config` and new config files
    pub fn to_pretty_json(&self) -> String {
        // Serializing plain data cannot fail
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{}"))
    }
}
