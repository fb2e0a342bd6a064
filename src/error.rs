use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Domain-specific errors for Kiwa
#[derive(Error, Debug)]
pub enum KiwaError {
    #[error("Hotkey '{combo}' could not be registered: {message}")]
    HotkeyRegistration { combo: String, message: String },

    #[error("Hotkey manager unavailable: {0}")]
    HotkeyManager(String),

    #[error("Key code 0x{0:02X} cannot be used for a global hotkey")]
    UnsupportedKey(u16),

    #[error("Input monitor installation failed: {0}")]
    InputHook(String),

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Focus restore failed: {0}")]
    Focus(String),

    #[error("Could not read config from '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write config to '{path}': {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Platform operation failed: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, KiwaError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use kiwa::error::ResultExt;
///
/// // Clipboard writes are best effort
/// clipboard.write_text(&text).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
