//! Configuration module - hotkey, panel size and the symbol list
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - The `Config` struct
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH};

pub use types::Config;

pub use loader::{config_path, ensure_config_file, load_config, load_config_from, reload_config};

#[cfg(test)]
pub use defaults::{DEFAULT_HOTKEY_KEY_CODE, DEFAULT_HOTKEY_MODIFIERS, MIN_PANEL_WIDTH};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
