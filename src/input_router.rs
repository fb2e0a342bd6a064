//! Input arbitration while the panel is open.
//!
//! Two interceptors are installed per session: a local one that sees events
//! addressed to the panel (and can swallow them) and a global one that only
//! observes events addressed to other applications. Both feed the same
//! routing table; [`EventDeduper`] makes sure an event seen by both scopes
//! is acted on once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::logging;
use crate::panel::{Point, Rect, SessionId};
use crate::shortcuts::keycodes::{self, key};
use crate::shortcuts::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Other,
}

/// OS input event, already decoded at the platform boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    KeyDown {
        key_code: u16,
        modifiers: Modifiers,
        /// Seconds since boot, as reported by the OS
        timestamp: f64,
    },
    MouseDown {
        button: MouseButton,
        /// Screen coordinates
        location: Point,
        timestamp: f64,
    },
}

impl RawInputEvent {
    fn timestamp(&self) -> f64 {
        match self {
            RawInputEvent::KeyDown { timestamp, .. } | RawInputEvent::MouseDown { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Semantic panel command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Close,
    OpenSettings,
    Quit,
    MoveUp,
    MoveDown,
    CommitSelected,
    CommitSlot(u8),
    DismissIfOutside,
}

impl PanelCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelCommand::Close => "close",
            PanelCommand::OpenSettings => "open_settings",
            PanelCommand::Quit => "quit",
            PanelCommand::MoveUp => "move_up",
            PanelCommand::MoveDown => "move_down",
            PanelCommand::CommitSelected => "commit_selected",
            PanelCommand::CommitSlot(_) => "commit_slot",
            PanelCommand::DismissIfOutside => "dismiss_if_outside",
        }
    }
}

/// Which interceptor delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptScope {
    /// Events addressed to this process; may be swallowed
    Local,
    /// Events addressed to other processes; observe only
    Global,
}

/// What the interceptor should do with the event after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Swallow,
    PassThrough,
}

/// Map an event to a command. First match wins, in this order:
/// Escape, ⌘, , ⌘Q, arrows, Return, ⌘1-9, mouse outside `content_bounds`.
/// Everything else (including mouse downs inside the panel) returns `None`.
pub fn route(event: &RawInputEvent, content_bounds: Rect) -> Option<PanelCommand> {
    match *event {
        RawInputEvent::KeyDown {
            key_code,
            modifiers,
            ..
        } => route_key(key_code, modifiers),
        RawInputEvent::MouseDown {
            button, location, ..
        } => match button {
            MouseButton::Primary | MouseButton::Secondary if !content_bounds.contains(location) => {
                Some(PanelCommand::DismissIfOutside)
            }
            _ => None,
        },
    }
}

fn route_key(key_code: u16, modifiers: Modifiers) -> Option<PanelCommand> {
    let command_held = modifiers.contains(Modifiers::CMD);
    match key_code {
        key::ESCAPE => Some(PanelCommand::Close),
        key::COMMA if command_held => Some(PanelCommand::OpenSettings),
        key::Q if command_held => Some(PanelCommand::Quit),
        key::UP_ARROW => Some(PanelCommand::MoveUp),
        key::DOWN_ARROW => Some(PanelCommand::MoveDown),
        key::RETURN | key::KEYPAD_ENTER => Some(PanelCommand::CommitSelected),
        code if command_held => keycodes::slot_number(code).map(PanelCommand::CommitSlot),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fingerprint {
    scope: InterceptScope,
    timestamp: f64,
    event: RawInputEvent,
}

/// Drops an event that was already acted on through the other scope.
#[derive(Debug, Default)]
pub struct EventDeduper {
    last: Option<Fingerprint>,
}

impl EventDeduper {
    /// Returns `true` if the event should be acted on, and records it.
    pub fn admit(&mut self, scope: InterceptScope, event: &RawInputEvent) -> bool {
        if let Some(last) = self.last {
            let same_event = last.timestamp == event.timestamp() && same_input(&last.event, event);
            if same_event && last.scope != scope {
                return false;
            }
        }
        self.last = Some(Fingerprint {
            scope,
            timestamp: event.timestamp(),
            event: *event,
        });
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

fn same_input(a: &RawInputEvent, b: &RawInputEvent) -> bool {
    match (a, b) {
        (
            RawInputEvent::KeyDown {
                key_code: ka,
                modifiers: ma,
                ..
            },
            RawInputEvent::KeyDown {
                key_code: kb,
                modifiers: mb,
                ..
            },
        ) => ka == kb && ma == mb,
        (
            RawInputEvent::MouseDown { button: ba, .. },
            RawInputEvent::MouseDown { button: bb, .. },
        ) => ba == bb,
        _ => false,
    }
}

/// Called from the OS callback context for every intercepted event.
pub type EventSink = Arc<dyn Fn(InterceptScope, RawInputEvent) -> Disposition + Send + Sync>;

/// Receives routed commands. Must only enqueue.
pub type CommandSink = Arc<dyn Fn(SessionId, PanelCommand) + Send + Sync>;

/// Opaque interceptor handle returned by [`InputHook::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// OS event interception.
pub trait InputHook {
    fn install(&mut self, scope: InterceptScope, sink: EventSink) -> Result<HookHandle>;
    fn remove(&mut self, handle: HookHandle);
}

struct RouterShared {
    open: AtomicBool,
    session: Mutex<Option<SessionId>>,
    bounds: Mutex<Rect>,
    deduper: Mutex<EventDeduper>,
    commands: Mutex<Option<CommandSink>>,
}

impl RouterShared {
    fn dispatch(&self, scope: InterceptScope, event: RawInputEvent) -> Disposition {
        if !self.open.load(Ordering::SeqCst) {
            return Disposition::PassThrough;
        }

        let bounds = *self.bounds.lock();
        let Some(command) = route(&event, bounds) else {
            return Disposition::PassThrough;
        };

        if !self.deduper.lock().admit(scope, &event) {
            tracing::debug!(scope = ?scope, command = command.as_str(), "Duplicate event dropped");
            return swallow_for(scope);
        }

        let Some(session) = *self.session.lock() else {
            return Disposition::PassThrough;
        };

        if let RawInputEvent::KeyDown {
            key_code,
            modifiers,
            ..
        } = event
        {
            logging::log_key_event(key_code, &format!("{:?}", modifiers), command.as_str());
        }

        let sink = self.commands.lock().clone();
        if let Some(sink) = sink {
            sink(session, command);
        }
        swallow_for(scope)
    }
}

fn swallow_for(scope: InterceptScope) -> Disposition {
    match scope {
        InterceptScope::Local => Disposition::Swallow,
        InterceptScope::Global => Disposition::PassThrough,
    }
}

/// Owns the local/global interceptor pair for one session at a time.
pub struct InputEventRouter {
    hook: Box<dyn InputHook>,
    shared: Arc<RouterShared>,
    local: Option<HookHandle>,
    global: Option<HookHandle>,
}

impl InputEventRouter {
    pub fn new(hook: Box<dyn InputHook>) -> Self {
        Self {
            hook,
            shared: Arc::new(RouterShared {
                open: AtomicBool::new(false),
                session: Mutex::new(None),
                bounds: Mutex::new(Rect::default()),
                deduper: Mutex::new(EventDeduper::default()),
                commands: Mutex::new(None),
            }),
            local: None,
            global: None,
        }
    }

    /// Install both interceptors for `session`.
    ///
    /// If either installation fails nothing stays installed.
    pub fn start(&mut self, session: SessionId, bounds: Rect, commands: CommandSink) -> Result<()> {
        if self.is_active() {
            self.stop();
        }

        *self.shared.session.lock() = Some(session);
        *self.shared.bounds.lock() = bounds;
        *self.shared.commands.lock() = Some(commands);
        self.shared.deduper.lock().reset();
        self.shared.open.store(true, Ordering::SeqCst);

        let local = match self.hook.install(InterceptScope::Local, self.sink()) {
            Ok(handle) => handle,
            Err(e) => {
                self.clear_shared();
                return Err(e);
            }
        };
        self.local = Some(local);

        match self.hook.install(InterceptScope::Global, self.sink()) {
            Ok(handle) => self.global = Some(handle),
            Err(e) => {
                self.stop();
                return Err(e);
            }
        }

        tracing::debug!(session = %session, "Input interceptors installed");
        Ok(())
    }

    fn sink(&self) -> EventSink {
        let shared = self.shared.clone();
        Arc::new(move |scope, event| shared.dispatch(scope, event))
    }

    /// Remove both interceptors. Safe to call when never started.
    pub fn stop(&mut self) {
        // Drop in-flight events before touching the hooks
        self.shared.open.store(false, Ordering::SeqCst);

        let removed = self.local.is_some() || self.global.is_some();
        if let Some(handle) = self.local.take() {
            self.hook.remove(handle);
        }
        if let Some(handle) = self.global.take() {
            self.hook.remove(handle);
        }
        self.clear_shared();

        if removed {
            tracing::debug!("Input interceptors removed");
        }
    }

    fn clear_shared(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
        *self.shared.session.lock() = None;
        *self.shared.commands.lock() = None;
    }

    /// Update the content bounds used for outside-click detection.
    pub fn update_bounds(&self, bounds: Rect) {
        *self.shared.bounds.lock() = bounds;
    }

    pub fn is_active(&self) -> bool {
        self.local.is_some() || self.global.is_some()
    }
}

impl Drop for InputEventRouter {
    fn drop(&mut self) {
        self.stop();
    }
}
