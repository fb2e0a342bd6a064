#![allow(unexpected_cfgs)]

//! Kiwa - paired punctuation and symbols from the menu bar
//!
//! A global hotkey (or the status item) opens a small floating panel near the
//! pointer. Picking a symbol puts it on the clipboard and hands focus back to
//! the application that was in front.
//!
//! The engine (hotkey registration, input routing, selection, panel
//! lifecycle) is platform independent and driven through collaborator traits;
//! the AppKit implementations live in [`platform`] and [`tray`].

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod focus;
pub mod hotkeys;
pub mod input_router;
pub mod insertion;
pub mod logging;
pub mod panel;
pub mod selection;
pub mod settings;
pub mod shortcuts;
pub mod symbols;
pub mod watcher;

// AppKit surfaces, status item, GCD dispatch
#[cfg(target_os = "macos")]
pub mod platform;
#[cfg(target_os = "macos")]
pub mod tray;

#[cfg(test)]
pub(crate) mod testing;
