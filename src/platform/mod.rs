//! macOS integration: AppKit surfaces behind the engine's collaborator traits.
//!
//! Everything here runs on the main thread. OS callbacks that arrive
//! elsewhere go through [`dispatch_to_main`].

mod input_hook;
mod panel_window;
mod workspace;

pub use input_hook::MacInputHook;
pub use panel_window::MacPanel;
pub use workspace::{MacFocusRegistry, MacScreen};

use cocoa::appkit::NSApp;
use cocoa::base::{id, nil, YES};
use cocoa::foundation::{NSAutoreleasePool, NSPoint, NSRect, NSSize};
use macos_accessibility_client::accessibility;
use objc::{class, msg_send, sel, sel_impl};
use tracing::{debug, info, warn};

use crate::logging;
use crate::panel::{Point, Rect, Size};

// ============================================================================
// Thread Safety
// ============================================================================

/// AppKit is main-thread only. Panics in debug builds when called elsewhere.
fn debug_assert_main_thread() {
    unsafe {
        let is_main: bool = msg_send![class!(NSThread), isMainThread];
        debug_assert!(is_main, "AppKit calls must run on the main thread");
    }
}

mod gcd {
    use std::ffi::c_void;

    // dispatch_get_main_queue() is a macro over &_dispatch_main_q
    #[link(name = "System", kind = "framework")]
    extern "C" {
        fn dispatch_async_f(
            queue: *const c_void,
            context: *mut c_void,
            work: extern "C" fn(*mut c_void),
        );
        #[link_name = "_dispatch_main_q"]
        static DISPATCH_MAIN_QUEUE: c_void;
    }

    /// Run `f` on the main thread at the next run loop turn.
    pub fn dispatch_to_main<F: FnOnce() + Send + 'static>(f: F) {
        let boxed: Box<dyn FnOnce() + Send> = Box::new(f);
        let raw = Box::into_raw(Box::new(boxed));

        extern "C" fn trampoline(context: *mut c_void) {
            unsafe {
                let boxed: Box<Box<dyn FnOnce() + Send>> = Box::from_raw(context as *mut _);
                boxed();
            }
        }

        unsafe {
            let main_queue = &DISPATCH_MAIN_QUEUE as *const c_void;
            dispatch_async_f(main_queue, raw as *mut c_void, trampoline);
        }
    }
}

pub use gcd::dispatch_to_main;

// ============================================================================
// Application lifecycle
// ============================================================================

/// No Dock icon, no menu bar ownership.
pub fn configure_as_accessory_app() {
    debug_assert_main_thread();
    unsafe {
        let app: id = NSApp();
        // NSApplicationActivationPolicyAccessory = 1
        let _: () = msg_send![app, setActivationPolicy: 1i64];
    }
    logging::log("APP", "Configured app as accessory (no Dock icon)");
}

/// Whether global input monitors will see key events.
pub fn accessibility_trusted() -> bool {
    let trusted = accessibility::application_is_trusted();
    debug!(trusted, "Checked accessibility permission");
    trusted
}

/// Run the AppKit event loop until [`stop_application`] is called.
pub fn run_application() {
    debug_assert_main_thread();
    unsafe {
        let _pool = NSAutoreleasePool::new(nil);
        let app: id = NSApp();
        info!(event_type = "app_lifecycle", action = "run_loop_start", "Entering run loop");
        let _: () = msg_send![app, run];
    }
}

/// Make [`run_application`] return after the current event.
pub fn stop_application() {
    debug_assert_main_thread();
    unsafe {
        let app: id = NSApp();
        let _: () = msg_send![app, stop: nil];

        // stop: only takes effect once another event is processed
        // NSEventTypeApplicationDefined = 15
        let event: id = msg_send![
            class!(NSEvent),
            otherEventWithType: 15u64
            location: NSPoint::new(0.0, 0.0)
            modifierFlags: 0u64
            timestamp: 0.0f64
            windowNumber: 0i64
            context: nil
            subtype: 0i16
            data1: 0i64
            data2: 0i64
        ];
        if event == nil {
            warn!("Could not post wake event, run loop stops on next input");
            return;
        }
        let _: () = msg_send![app, postEvent: event atStart: YES];
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn rect_from_ns(rect: NSRect) -> Rect {
    Rect::new(
        Point::new(rect.origin.x, rect.origin.y),
        Size::new(rect.size.width, rect.size.height),
    )
}

fn rect_to_ns(rect: Rect) -> NSRect {
    NSRect::new(
        NSPoint::new(rect.origin.x, rect.origin.y),
        NSSize::new(rect.size.width, rect.size.height),
    )
}

/// NSString from a Rust string. Interior NULs are stripped.
unsafe fn nsstring(s: &str) -> id {
    let cleaned: String = s.chars().filter(|c| *c != '\0').collect();
    let cstr = match std::ffi::CString::new(cleaned) {
        Ok(c) => c,
        Err(_) => return msg_send![class!(NSString), string],
    };
    msg_send![class!(NSString), stringWithUTF8String: cstr.as_ptr()]
}

unsafe fn string_from_nsstring(nsstring: id) -> Option<String> {
    if nsstring == nil {
        return None;
    }
    let utf8: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if utf8.is_null() {
        return None;
    }
    std::ffi::CStr::from_ptr(utf8)
        .to_str()
        .ok()
        .map(|s| s.to_string())
}
