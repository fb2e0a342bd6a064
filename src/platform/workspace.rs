//! NSWorkspace focus tracking and NSScreen geometry.

use cocoa::base::{id, nil};
use cocoa::foundation::{NSPoint, NSRect};
use objc::{class, msg_send, sel, sel_impl};

use super::{debug_assert_main_thread, rect_from_ns, string_from_nsstring};
use crate::error::{KiwaError, Result};
use crate::focus::{FocusRegistry, FocusedApp};
use crate::panel::{Point, Rect, ScreenProbe};

/// NSApplicationActivateIgnoringOtherApps
const ACTIVATE_IGNORING_OTHER_APPS: u64 = 1 << 1;

/// Frontmost application lookup and reactivation via NSRunningApplication.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacFocusRegistry;

impl FocusRegistry for MacFocusRegistry {
    fn current_focused_application(&self) -> Option<FocusedApp> {
        debug_assert_main_thread();
        unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let app: id = msg_send![workspace, frontmostApplication];
            if app == nil {
                return None;
            }

            let pid: i32 = msg_send![app, processIdentifier];
            // Never restore focus to ourselves
            if pid as u32 == std::process::id() {
                return None;
            }

            let bundle_id = string_from_nsstring(msg_send![app, bundleIdentifier]).unwrap_or_default();
            let name = string_from_nsstring(msg_send![app, localizedName])
                .unwrap_or_else(|| bundle_id.clone());
            Some(FocusedApp {
                pid,
                bundle_id,
                name,
            })
        }
    }

    fn activate(&self, app: &FocusedApp) -> Result<()> {
        debug_assert_main_thread();
        unsafe {
            let running: id = msg_send![
                class!(NSRunningApplication),
                runningApplicationWithProcessIdentifier: app.pid
            ];
            if running == nil {
                return Err(KiwaError::Focus(format!(
                    "{} (pid {}) is no longer running",
                    app.name, app.pid
                )));
            }
            let activated: bool = msg_send![running, activateWithOptions: ACTIVATE_IGNORING_OTHER_APPS];
            if !activated {
                return Err(KiwaError::Focus(format!("{} refused activation", app.name)));
            }
        }
        Ok(())
    }
}

/// Pointer position and per-display visible frames, AppKit global coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacScreen;

impl ScreenProbe for MacScreen {
    fn pointer_location(&self) -> Point {
        unsafe {
            let location: NSPoint = msg_send![class!(NSEvent), mouseLocation];
            Point::new(location.x, location.y)
        }
    }

    fn visible_frame_at(&self, point: Point) -> Rect {
        debug_assert_main_thread();
        unsafe {
            let screens: id = msg_send![class!(NSScreen), screens];
            let count: usize = msg_send![screens, count];
            for i in 0..count {
                let screen: id = msg_send![screens, objectAtIndex: i];
                let frame = rect_from_ns(msg_send![screen, frame]);
                // Inclusive max edges: the pointer can sit on the last row/column
                if point.x >= frame.min_x()
                    && point.x <= frame.max_x()
                    && point.y >= frame.min_y()
                    && point.y <= frame.max_y()
                {
                    let visible: NSRect = msg_send![screen, visibleFrame];
                    return rect_from_ns(visible);
                }
            }

            let main: id = msg_send![class!(NSScreen), mainScreen];
            if main == nil {
                tracing::warn!("No screens attached");
                return Rect::default();
            }
            let visible: NSRect = msg_send![main, visibleFrame];
            rect_from_ns(visible)
        }
    }
}
