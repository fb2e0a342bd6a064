//! In-memory stand-ins for every OS seam.
//!
//! Each fake is a cheap clone over shared state: hand one clone to the code
//! under test, keep another to drive and inspect it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{KiwaError, Result};
use crate::focus::{FocusRegistry, FocusedApp};
use crate::hotkeys::HotkeyBackend;
use crate::input_router::{Disposition, EventSink, HookHandle, InputHook, InterceptScope, RawInputEvent};
use crate::insertion::ClipboardWriter;
use crate::panel::{
    PanelSurface, PanelViewModel, Point, Rect, ScreenProbe, SessionId, StatusIndicator,
};
use crate::settings::SettingsOpener;
use crate::shortcuts::HotkeyCombo;

// ============================================================================
// Clipboard
// ============================================================================

#[derive(Default)]
struct ClipboardState {
    contents: Option<String>,
    writes: usize,
    fail: bool,
}

#[derive(Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<ClipboardState>>,
}

impl MemoryClipboard {
    pub fn with_contents(text: &str) -> Self {
        let clipboard = Self::default();
        clipboard.state.lock().contents = Some(text.to_string());
        clipboard
    }

    pub fn contents(&self) -> Option<String> {
        self.state.lock().contents.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail = fail;
    }
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(KiwaError::Clipboard("pasteboard unavailable".to_string()));
        }
        state.contents = Some(text.to_string());
        state.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Hotkeys
// ============================================================================

#[derive(Default)]
struct HotkeyState {
    registered: HashMap<u32, HotkeyCombo>,
    rejected: HashSet<HotkeyCombo>,
    next_id: u32,
    register_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeHotkeyBackend {
    state: Arc<Mutex<HotkeyState>>,
}

impl FakeHotkeyBackend {
    /// Make the OS decline `combo` from now on
    pub fn reject(&self, combo: HotkeyCombo) {
        self.state.lock().rejected.insert(combo);
    }

    /// Registration id the OS would report when `combo` is pressed
    pub fn id_for(&self, combo: HotkeyCombo) -> Option<u32> {
        self.state
            .lock()
            .registered
            .iter()
            .find(|(_, c)| **c == combo)
            .map(|(id, _)| *id)
    }

    pub fn registered_count(&self) -> usize {
        self.state.lock().registered.len()
    }

    pub fn register_calls(&self) -> usize {
        self.state.lock().register_calls
    }
}

impl HotkeyBackend for FakeHotkeyBackend {
    fn register(&mut self, combo: HotkeyCombo) -> Result<u32> {
        let mut state = self.state.lock();
        state.register_calls += 1;
        if state.rejected.contains(&combo) || state.registered.values().any(|c| *c == combo) {
            return Err(KiwaError::HotkeyRegistration {
                combo: combo.display_string(),
                message: "already registered".to_string(),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.registered.insert(id, combo);
        Ok(id)
    }

    fn unregister(&mut self, id: u32) -> Result<()> {
        self.state.lock().registered.remove(&id);
        Ok(())
    }
}

// ============================================================================
// Input hooks
// ============================================================================

#[derive(Default)]
struct InputState {
    installed: HashMap<HookHandle, (InterceptScope, EventSink)>,
    failing: HashSet<InterceptScope>,
    next: u64,
    removes: usize,
}

#[derive(Clone, Default)]
pub struct FakeInputHook {
    state: Arc<Mutex<InputState>>,
}

impl FakeInputHook {
    pub fn fail_scope(&self, scope: InterceptScope) {
        self.state.lock().failing.insert(scope);
    }

    pub fn installed_count(&self) -> usize {
        self.state.lock().installed.len()
    }

    pub fn remove_calls(&self) -> usize {
        self.state.lock().removes
    }

    pub fn sink_for(&self, scope: InterceptScope) -> Option<EventSink> {
        self.state
            .lock()
            .installed
            .values()
            .find(|(s, _)| *s == scope)
            .map(|(_, sink)| sink.clone())
    }

    /// Deliver `event` through the interceptor installed for `scope`.
    /// `None` when no interceptor is installed.
    pub fn inject(&self, scope: InterceptScope, event: RawInputEvent) -> Option<Disposition> {
        // Call outside the lock, like the OS does
        let sink = self.sink_for(scope)?;
        Some(sink(scope, event))
    }
}

impl InputHook for FakeInputHook {
    fn install(&mut self, scope: InterceptScope, sink: EventSink) -> Result<HookHandle> {
        let mut state = self.state.lock();
        if state.failing.contains(&scope) {
            return Err(KiwaError::InputHook(format!("{:?} monitor refused", scope)));
        }
        state.next += 1;
        let handle = HookHandle(state.next);
        state.installed.insert(handle, (scope, sink));
        Ok(handle)
    }

    fn remove(&mut self, handle: HookHandle) {
        let mut state = self.state.lock();
        state.removes += 1;
        assert!(
            state.installed.remove(&handle).is_some(),
            "interceptor {:?} removed twice",
            handle
        );
    }
}

// ============================================================================
// Panel surface, screen, indicator
// ============================================================================

#[derive(Default)]
struct SurfaceState {
    frame: Rect,
    visible: bool,
    show_calls: usize,
    hide_calls: usize,
    shown_session: Option<SessionId>,
    animations: Vec<(Rect, Duration)>,
    last_model: Option<PanelViewModel>,
    render_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakePanelSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl FakePanelSurface {
    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    pub fn frame_now(&self) -> Rect {
        self.state.lock().frame
    }

    pub fn hide_calls(&self) -> usize {
        self.state.lock().hide_calls
    }

    pub fn show_calls(&self) -> usize {
        self.state.lock().show_calls
    }

    /// Session the visible panel was shown for
    pub fn shown_session(&self) -> Option<SessionId> {
        self.state.lock().shown_session
    }

    pub fn animations(&self) -> Vec<(Rect, Duration)> {
        self.state.lock().animations.clone()
    }

    pub fn last_model(&self) -> Option<PanelViewModel> {
        self.state.lock().last_model.clone()
    }

    pub fn render_calls(&self) -> usize {
        self.state.lock().render_calls
    }
}

impl PanelSurface for FakePanelSurface {
    fn frame(&self) -> Rect {
        self.state.lock().frame
    }

    fn set_frame(&mut self, frame: Rect) {
        self.state.lock().frame = frame;
    }

    fn animate_frame(&mut self, frame: Rect, duration: Duration) {
        let mut state = self.state.lock();
        state.frame = frame;
        state.animations.push((frame, duration));
    }

    fn show(&mut self, session: SessionId) {
        let mut state = self.state.lock();
        state.visible = true;
        state.show_calls += 1;
        state.shown_session = Some(session);
    }

    fn hide(&mut self) {
        let mut state = self.state.lock();
        state.visible = false;
        state.shown_session = None;
        state.hide_calls += 1;
    }

    fn render(&mut self, model: &PanelViewModel) {
        let mut state = self.state.lock();
        state.last_model = Some(model.clone());
        state.render_calls += 1;
    }
}

#[derive(Clone)]
pub struct FakeScreen {
    pointer: Arc<Mutex<Point>>,
    visible: Rect,
}

impl FakeScreen {
    pub fn new(pointer: Point, visible: Rect) -> Self {
        Self {
            pointer: Arc::new(Mutex::new(pointer)),
            visible,
        }
    }

    pub fn move_pointer(&self, to: Point) {
        *self.pointer.lock() = to;
    }
}

impl ScreenProbe for FakeScreen {
    fn pointer_location(&self) -> Point {
        *self.pointer.lock()
    }

    fn visible_frame_at(&self, _point: Point) -> Rect {
        self.visible
    }
}

#[derive(Clone, Default)]
pub struct FakeIndicator {
    active: Arc<Mutex<bool>>,
}

impl FakeIndicator {
    pub fn is_active(&self) -> bool {
        *self.active.lock()
    }
}

impl StatusIndicator for FakeIndicator {
    fn set_active(&mut self, active: bool) {
        *self.active.lock() = active;
    }
}

// ============================================================================
// Focus
// ============================================================================

#[derive(Default)]
struct FocusState {
    frontmost: Option<FocusedApp>,
    current_calls: usize,
    activations: Vec<FocusedApp>,
    fail_activation: bool,
}

#[derive(Clone, Default)]
pub struct FakeFocusRegistry {
    state: Arc<Mutex<FocusState>>,
}

impl FakeFocusRegistry {
    pub fn with_app(bundle_id: &str, name: &str) -> Self {
        let registry = Self::default();
        registry.state.lock().frontmost = Some(FocusedApp {
            pid: 4242,
            bundle_id: bundle_id.to_string(),
            name: name.to_string(),
        });
        registry
    }

    pub fn current_calls(&self) -> usize {
        self.state.lock().current_calls
    }

    pub fn activations(&self) -> Vec<FocusedApp> {
        self.state.lock().activations.clone()
    }

    /// Simulate the previous application having quit
    pub fn fail_activation(&self, fail: bool) {
        self.state.lock().fail_activation = fail;
    }
}

impl FocusRegistry for FakeFocusRegistry {
    fn current_focused_application(&self) -> Option<FocusedApp> {
        let mut state = self.state.lock();
        state.current_calls += 1;
        state.frontmost.clone()
    }

    fn activate(&self, app: &FocusedApp) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_activation {
            return Err(KiwaError::Focus(format!("{} is no longer running", app.name)));
        }
        state.activations.push(app.clone());
        Ok(())
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Clone, Default)]
pub struct FakeSettings {
    opens: Arc<Mutex<usize>>,
}

impl FakeSettings {
    pub fn open_count(&self) -> usize {
        *self.opens.lock()
    }
}

impl SettingsOpener for FakeSettings {
    fn open_settings(&self) -> Result<()> {
        *self.opens.lock() += 1;
        Ok(())
    }
}
