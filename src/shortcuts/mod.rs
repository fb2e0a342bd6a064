//! Hotkey combos and the key code table.
//!
//! # Example
//!
//! ```ignore
//! use kiwa::shortcuts::HotkeyCombo;
//!
//! let combo = HotkeyCombo::parse("opt+shift+d")?;
//! println!("Display: {}", combo); // ⌥ ⇧ D
//! ```

pub mod keycodes;
mod types;

pub use types::{HotkeyCombo, Modifiers, ShortcutParseError};
