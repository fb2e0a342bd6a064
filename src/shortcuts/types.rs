//! Hotkey combination types with parsing and macOS-style display.
//!
//! - `Modifiers` - Carbon-compatible modifier bitmask (cmd, option, control, shift)
//! - `HotkeyCombo` - a physical key code plus a modifier bitmask
//! - `ShortcutParseError` - detailed parse errors for shortcut strings

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::keycodes;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("unknown token '{0}' in shortcut")]
    UnknownToken(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

bitflags! {
    /// Modifier keys, stored with the Carbon bit values so persisted combos
    /// stay compatible with `RegisterEventHotKey`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const CMD = 0x0100;
        const SHIFT = 0x0200;
        const OPTION = 0x0800;
        const CONTROL = 0x1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers::empty()
    }
}

impl Modifiers {
    /// Symbols in menu order: ⌘ ⌥ ⌃ ⇧
    pub fn symbols(&self) -> Vec<&'static str> {
        let mut parts = Vec::with_capacity(4);
        if self.contains(Modifiers::CMD) {
            parts.push("\u{2318}");
        }
        if self.contains(Modifiers::OPTION) {
            parts.push("\u{2325}");
        }
        if self.contains(Modifiers::CONTROL) {
            parts.push("\u{2303}");
        }
        if self.contains(Modifiers::SHIFT) {
            parts.push("\u{21E7}");
        }
        parts
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Modifiers::from_bits_truncate(bits))
    }
}

/// A system-wide shortcut: physical key code and modifier bitmask.
///
/// Value type; equality is structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyCombo {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

impl HotkeyCombo {
    pub const fn new(key_code: u16, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            modifiers,
        }
    }

    /// Default panel hotkey: ⌥ ⇧ D
    pub const fn default_hotkey() -> Self {
        Self::new(
            keycodes::key::D,
            Modifiers::SHIFT.union(Modifiers::OPTION),
        )
    }

    /// Parse a shortcut string such as `"opt+shift+d"` or `"⌘ ⇧ K"`.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let normalized = s.replace('+', " ");
        let mut modifiers = Modifiers::empty();
        let mut key_part: Option<&str> = None;

        for part in normalized.split_whitespace() {
            match part.to_lowercase().as_str() {
                "cmd" | "command" | "meta" | "super" | "\u{2318}" => modifiers |= Modifiers::CMD,
                "ctrl" | "control" | "ctl" | "^" | "\u{2303}" => modifiers |= Modifiers::CONTROL,
                "alt" | "opt" | "option" | "\u{2325}" => modifiers |= Modifiers::OPTION,
                "shift" | "shft" | "\u{21E7}" => modifiers |= Modifiers::SHIFT,
                _ => {
                    if key_part.is_some() {
                        return Err(ShortcutParseError::UnknownToken(part.to_string()));
                    }
                    key_part = Some(part);
                }
            }
        }

        let key = key_part.ok_or(ShortcutParseError::MissingKey)?;
        let key_code = keycodes::key_code_for_name(key)
            .ok_or_else(|| ShortcutParseError::UnknownKey(key.to_string()))?;

        Ok(Self::new(key_code, modifiers))
    }

    /// Menu-style display, e.g. `⌥ ⇧ D`. Unknown keys render as `?`.
    pub fn display_string(&self) -> String {
        let mut parts = self.modifiers.symbols();
        parts.push(keycodes::key_character(self.key_code));
        parts.join(" ")
    }
}

impl Default for HotkeyCombo {
    fn default() -> Self {
        Self::default_hotkey()
    }
}

impl fmt::Display for HotkeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

/// Persisted form: either the structural `{ keyCode, modifiers }` object or a
/// shortcut string that goes through [`HotkeyCombo::parse`].
#[derive(Deserialize)]
#[serde(untagged)]
enum HotkeyComboRepr {
    #[serde(rename_all = "camelCase")]
    Structured { key_code: u16, modifiers: Modifiers },
    Text(String),
}

impl<'de> Deserialize<'de> for HotkeyCombo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match HotkeyComboRepr::deserialize(deserializer)? {
            HotkeyComboRepr::Structured {
                key_code,
                modifiers,
            } => Ok(HotkeyCombo::new(key_code, modifiers)),
            HotkeyComboRepr::Text(text) => {
                HotkeyCombo::parse(&text).map_err(serde::de::Error::custom)
            }
        }
    }
}
