//! System-wide panel hotkey.
//!
//! [`HotkeyRegistrationService`] owns the single OS registration. The OS
//! reports presses on its own thread; [`start_hotkey_listener`] only forwards
//! the hotkey id onto the UI queue, and the UI context calls
//! [`HotkeyRegistrationService::handle_fired`] on dequeue.

use global_hotkey::{
    hotkey::HotKey, Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{KiwaError, Result};
use crate::logging;
use crate::shortcuts::{keycodes, HotkeyCombo};

/// Callback invoked on the UI context when the hotkey fires
pub type HotkeyHandler = Arc<dyn Fn() + Send + Sync>;

/// OS hotkey slot. Each successful `register` returns an id that later
/// fired events carry.
pub trait HotkeyBackend {
    fn register(&mut self, combo: HotkeyCombo) -> Result<u32>;
    fn unregister(&mut self, id: u32) -> Result<()>;
}

/// Format a hotkey registration error with helpful context
fn format_hotkey_error(e: &HotkeyError, shortcut_display: &str) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => {
            format!(
                "Hotkey '{}' is already registered by another application (ID: {}). \
                 Try a different shortcut or close the conflicting app.",
                shortcut_display,
                hk.id()
            )
        }
        HotkeyError::FailedToRegister(msg) => {
            format!(
                "System rejected hotkey '{}': {}. This shortcut may be reserved by macOS.",
                shortcut_display, msg
            )
        }
        HotkeyError::OsError(os_err) => {
            format!(
                "OS error registering '{}': {}. Check system hotkey settings.",
                shortcut_display, os_err
            )
        }
        other => format!(
            "Failed to register hotkey '{}': {}",
            shortcut_display, other
        ),
    }
}

/// `global-hotkey` backed registration.
///
/// NOTE: Must be created on the main thread.
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
    /// Maps hotkey ID -> HotKey object (needed for proper unregistration)
    registered: HashMap<u32, HotKey>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| KiwaError::HotkeyManager(e.to_string()))?;
        Ok(Self {
            manager,
            registered: HashMap::new(),
        })
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&mut self, combo: HotkeyCombo) -> Result<u32> {
        let code =
            keycodes::hotkey_code(combo.key_code).ok_or(KiwaError::UnsupportedKey(combo.key_code))?;
        let mods = keycodes::hotkey_modifiers(combo.modifiers);
        let hotkey = HotKey::new(Some(mods), code);
        let id = hotkey.id();

        self.manager
            .register(hotkey)
            .map_err(|e| KiwaError::HotkeyRegistration {
                combo: combo.display_string(),
                message: format_hotkey_error(&e, &combo.display_string()),
            })?;

        self.registered.insert(id, hotkey);
        Ok(id)
    }

    fn unregister(&mut self, id: u32) -> Result<()> {
        let Some(hotkey) = self.registered.remove(&id) else {
            return Ok(());
        };
        self.manager
            .unregister(hotkey)
            .map_err(|e| KiwaError::HotkeyManager(format!("unregister {}: {}", id, e)))
    }
}

struct ActiveRegistration {
    id: u32,
    combo: HotkeyCombo,
}

/// Owns at most one registered combo and its callback.
pub struct HotkeyRegistrationService {
    backend: Box<dyn HotkeyBackend>,
    active: Option<ActiveRegistration>,
    /// Combo requested most recently, even if the OS declined it
    requested: Option<HotkeyCombo>,
    handler: Option<HotkeyHandler>,
    trigger_count: AtomicU64,
}

impl HotkeyRegistrationService {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            active: None,
            requested: None,
            handler: None,
            trigger_count: AtomicU64::new(0),
        }
    }

    /// Install `combo` and keep `handler`.
    ///
    /// Replaces any existing registration. On failure the handler is still
    /// retained so a later [`update_combo`](Self::update_combo) can recover,
    /// and the previous registration (if any) stays active.
    pub fn register(&mut self, combo: HotkeyCombo, handler: HotkeyHandler) -> Result<()> {
        self.handler = Some(handler);
        self.swap_registration(combo)
    }

    /// Remove the registration and drop the handler. Idempotent.
    pub fn unregister(&mut self) {
        if let Some(active) = self.active.take() {
            match self.backend.unregister(active.id) {
                Ok(()) => logging::log(
                    "HOTKEY",
                    &format!("Unregistered {} (id: {})", active.combo, active.id),
                ),
                Err(e) => logging::log_error("HOTKEY", &e.to_string(), Some("unregister")),
            }
        }
        self.requested = None;
        self.handler = None;
    }

    /// Replace the combo, keeping the existing handler.
    ///
    /// The new combo is installed before the old one is removed, so there is
    /// never a moment with no active shortcut. If the OS declines the new
    /// combo the old one stays registered and the error is returned.
    pub fn update_combo(&mut self, combo: HotkeyCombo) -> Result<()> {
        if self.handler.is_none() {
            tracing::debug!(combo = %combo, "No handler set, ignoring combo update");
            self.requested = Some(combo);
            return Ok(());
        }
        self.swap_registration(combo)
    }

    fn swap_registration(&mut self, combo: HotkeyCombo) -> Result<()> {
        self.requested = Some(combo);

        if self.active.as_ref().is_some_and(|a| a.combo == combo) {
            return Ok(());
        }

        let new_id = match self.backend.register(combo) {
            Ok(id) => id,
            Err(e) => {
                let kept = self
                    .active
                    .as_ref()
                    .map(|a| a.combo.display_string())
                    .unwrap_or_else(|| "none".to_string());
                tracing::warn!(
                    combo = %combo,
                    kept = %kept,
                    error = %e,
                    "Hotkey registration failed, keeping previous state"
                );
                return Err(e);
            }
        };

        if let Some(old) = self.active.replace(ActiveRegistration { id: new_id, combo }) {
            if let Err(e) = self.backend.unregister(old.id) {
                logging::log_error("HOTKEY", &e.to_string(), Some("replace"));
            }
        }

        logging::log(
            "HOTKEY",
            &format!("Registered global hotkey {} (id: {})", combo, new_id),
        );
        Ok(())
    }

    /// Invoke the handler if `id` belongs to the current registration.
    /// Returns whether the handler ran.
    pub fn handle_fired(&self, id: u32) -> bool {
        let Some(active) = self.active.as_ref() else {
            tracing::debug!(id, "Hotkey event with no active registration");
            return false;
        };
        if active.id != id {
            tracing::debug!(id, current = active.id, "Ignoring event for stale hotkey id");
            return false;
        }
        let Some(handler) = self.handler.as_ref() else {
            return false;
        };

        let count = self.trigger_count.fetch_add(1, Ordering::SeqCst);
        logging::log(
            "HOTKEY",
            &format!("{} pressed (trigger #{})", active.combo, count + 1),
        );
        handler();
        true
    }

    /// Currently registered combo
    pub fn current_combo(&self) -> Option<HotkeyCombo> {
        self.active.as_ref().map(|a| a.combo)
    }

    /// Combo most recently asked for, registered or not
    pub fn requested_combo(&self) -> Option<HotkeyCombo> {
        self.requested
    }

    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for HotkeyRegistrationService {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Forward OS hotkey presses to `forward` from a background thread.
///
/// `forward` must only enqueue; it runs off the UI context.
pub fn start_hotkey_listener<F>(forward: F) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: Fn(u32) + Send + 'static,
{
    std::thread::Builder::new()
        .name("kiwa-hotkey-listener".to_string())
        .spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            loop {
                match receiver.recv() {
                    Ok(event) => {
                        // Only respond to key PRESS, not release
                        if event.state != HotKeyState::Pressed {
                            continue;
                        }
                        tracing::debug!(id = event.id, "Received hotkey event");
                        forward(event.id);
                    }
                    Err(_) => {
                        logging::log("HOTKEY", "Hotkey event channel closed, listener exiting");
                        break;
                    }
                }
            }
        })
}
