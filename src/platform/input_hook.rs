//! NSEvent monitors feeding the input router.

use std::collections::HashMap;

use block::ConcreteBlock;
use cocoa::appkit::NSEvent;
use cocoa::base::{id, nil};
use cocoa::foundation::NSPoint;
use objc::{class, msg_send, sel, sel_impl};

use crate::error::{KiwaError, Result};
use crate::input_router::{
    Disposition, EventSink, HookHandle, InputHook, InterceptScope, MouseButton, RawInputEvent,
};
use crate::panel::Point;
use crate::shortcuts::keycodes;

// NSEventType values
const EVENT_LEFT_MOUSE_DOWN: u64 = 1;
const EVENT_RIGHT_MOUSE_DOWN: u64 = 3;
const EVENT_KEY_DOWN: u64 = 10;

// NSEventMask bits
const LEFT_DOWN_MASK: u64 = 1 << EVENT_LEFT_MOUSE_DOWN;
const RIGHT_DOWN_MASK: u64 = 1 << EVENT_RIGHT_MOUSE_DOWN;
const KEY_DOWN_MASK: u64 = 1 << EVENT_KEY_DOWN;
const MONITOR_MASK: u64 = KEY_DOWN_MASK | LEFT_DOWN_MASK | RIGHT_DOWN_MASK;

/// Installs `addLocalMonitor...` / `addGlobalMonitor...` handlers.
#[derive(Default)]
pub struct MacInputHook {
    monitors: HashMap<HookHandle, id>,
    next: u64,
}

impl MacInputHook {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decode the fields the router cares about. `None` for event types the
/// monitors are not interested in.
unsafe fn decode(event: id) -> Option<RawInputEvent> {
    if event == nil {
        return None;
    }
    // `type` is a Rust keyword, so go through the cocoa wrapper
    let event_type = NSEvent::eventType(event) as u64;
    let timestamp: f64 = msg_send![event, timestamp];

    match event_type {
        EVENT_KEY_DOWN => {
            let key_code: u16 = msg_send![event, keyCode];
            let flags: u64 = msg_send![event, modifierFlags];
            Some(RawInputEvent::KeyDown {
                key_code,
                modifiers: keycodes::modifiers_from_event_flags(flags),
                timestamp,
            })
        }
        EVENT_LEFT_MOUSE_DOWN | EVENT_RIGHT_MOUSE_DOWN => {
            // Global monitor events carry no window, so read the screen position directly
            let location: NSPoint = msg_send![class!(NSEvent), mouseLocation];
            let button = if event_type == EVENT_LEFT_MOUSE_DOWN {
                MouseButton::Primary
            } else {
                MouseButton::Secondary
            };
            Some(RawInputEvent::MouseDown {
                button,
                location: Point::new(location.x, location.y),
                timestamp,
            })
        }
        _ => None,
    }
}

impl InputHook for MacInputHook {
    fn install(&mut self, scope: InterceptScope, sink: EventSink) -> Result<HookHandle> {
        let monitor: id = match scope {
            InterceptScope::Local => {
                let handler = ConcreteBlock::new(move |event: id| -> id {
                    let Some(raw) = (unsafe { decode(event) }) else {
                        return event;
                    };
                    match sink(InterceptScope::Local, raw) {
                        Disposition::Swallow => nil,
                        Disposition::PassThrough => event,
                    }
                })
                .copy();
                unsafe {
                    msg_send![
                        class!(NSEvent),
                        addLocalMonitorForEventsMatchingMask: MONITOR_MASK
                        handler: &*handler
                    ]
                }
            }
            InterceptScope::Global => {
                let handler = ConcreteBlock::new(move |event: id| {
                    if let Some(raw) = unsafe { decode(event) } {
                        sink(InterceptScope::Global, raw);
                    }
                })
                .copy();
                unsafe {
                    msg_send![
                        class!(NSEvent),
                        addGlobalMonitorForEventsMatchingMask: MONITOR_MASK
                        handler: &*handler
                    ]
                }
            }
        };

        if monitor == nil {
            return Err(KiwaError::InputHook(format!(
                "NSEvent returned no {:?} monitor",
                scope
            )));
        }

        self.next += 1;
        let handle = HookHandle(self.next);
        // The monitor token is autoreleased
        let monitor: id = unsafe { msg_send![monitor, retain] };
        self.monitors.insert(handle, monitor);
        tracing::debug!(scope = ?scope, handle = handle.0, "Installed NSEvent monitor");
        Ok(handle)
    }

    fn remove(&mut self, handle: HookHandle) {
        let Some(monitor) = self.monitors.remove(&handle) else {
            tracing::warn!(handle = handle.0, "Remove for unknown monitor");
            return;
        };
        unsafe {
            let _: () = msg_send![class!(NSEvent), removeMonitor: monitor];
            let _: () = msg_send![monitor, release];
        }
        tracing::debug!(handle = handle.0, "Removed NSEvent monitor");
    }
}

impl Drop for MacInputHook {
    fn drop(&mut self) {
        let handles: Vec<HookHandle> = self.monitors.keys().copied().collect();
        for handle in handles {
            self.remove(handle);
        }
    }
}
