//! Focused-application registry.
//!
//! The panel never activates its own process, so whatever was frontmost when
//! it opened is still the application to hand focus back to on commit.

use crate::error::Result;

/// Application that owned focus when the panel opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedApp {
    /// Process ID
    pub pid: i32,
    /// Bundle identifier (e.g., "com.apple.TextEdit")
    pub bundle_id: String,
    /// Localized display name (e.g., "TextEdit")
    pub name: String,
}

/// OS focus queries and activation.
pub trait FocusRegistry {
    /// Frontmost application other than this process, if any
    fn current_focused_application(&self) -> Option<FocusedApp>;
    /// Bring `app` to the front. Fails if it has quit in the meantime.
    fn activate(&self, app: &FocusedApp) -> Result<()>;
}
