//! Borderless, non-activating NSPanel that draws the symbol list.

use std::sync::Arc;
use std::time::Duration;

use cocoa::base::{id, nil, NO, YES};
use cocoa::foundation::{NSPoint, NSRect, NSSize};
use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel, BOOL};
use objc::{class, msg_send, sel, sel_impl};
use parking_lot::Mutex;

use super::{debug_assert_main_thread, nsstring, rect_from_ns, rect_to_ns};
use crate::error::{KiwaError, Result};
use crate::panel::{layout, PanelSurface, PanelViewModel, Point, Rect, SessionId, Size};

const PANEL_CLASS: &str = "KiwaPanel";
const VIEW_CLASS: &str = "KiwaPanelView";

// NSWindowStyleMask
const STYLE_BORDERLESS: u64 = 0;
const STYLE_NONACTIVATING_PANEL: u64 = 1 << 7;
const BACKING_BUFFERED: u64 = 2;
/// NSFloatingWindowLevel
const FLOATING_WINDOW_LEVEL: i64 = 3;
// NSWindowCollectionBehavior
const BEHAVIOR_MOVE_TO_ACTIVE_SPACE: u64 = 1 << 1;
const BEHAVIOR_FULL_SCREEN_AUXILIARY: u64 = 1 << 8;
// NSTextAlignment: Apple silicon uses the iOS numbering
#[cfg(target_arch = "x86_64")]
const ALIGN_RIGHT: i64 = 1;
#[cfg(target_arch = "x86_64")]
const ALIGN_CENTER: i64 = 2;
#[cfg(not(target_arch = "x86_64"))]
const ALIGN_RIGHT: i64 = 2;
#[cfg(not(target_arch = "x86_64"))]
const ALIGN_CENTER: i64 = 1;

const SYMBOL_FONT_SIZE: f64 = 16.0;
const LABEL_FONT_SIZE: f64 = 13.0;
const FOOTER_FONT_SIZE: f64 = 11.0;
const TEXT_INSET: f64 = 10.0;

type ClickHandler = Arc<dyn Fn(SessionId, Point) + Send + Sync>;

/// Receives primary clicks inside the content view, flipped view coordinates.
/// There is one panel per process.
static CLICK_HANDLER: Mutex<Option<ClickHandler>> = Mutex::new(None);

/// Session the panel is showing; `None` while hidden
static CLICK_SESSION: Mutex<Option<SessionId>> = Mutex::new(None);

extern "C" fn yes(_this: &Object, _cmd: Sel) -> BOOL {
    YES
}

extern "C" fn no(_this: &Object, _cmd: Sel) -> BOOL {
    NO
}

extern "C" fn accepts_first_mouse(_this: &Object, _cmd: Sel, _event: id) -> BOOL {
    YES
}

extern "C" fn mouse_down(this: &Object, _cmd: Sel, event: id) {
    let point = unsafe {
        let in_window: NSPoint = msg_send![event, locationInWindow];
        let local: NSPoint = msg_send![this, convertPoint: in_window fromView: nil];
        Point::new(local.x, local.y)
    };
    let Some(session) = *CLICK_SESSION.lock() else {
        return;
    };
    let handler = CLICK_HANDLER.lock().clone();
    if let Some(handler) = handler {
        handler(session, point);
    }
}

/// Labels are decoration; the content view takes every click inside it.
extern "C" fn hit_test(this: &Object, _cmd: Sel, point: NSPoint) -> id {
    // `point` is in the superview's coordinates, same as our frame
    let frame = unsafe { rect_from_ns(msg_send![this, frame]) };
    if frame.contains(Point::new(point.x, point.y)) {
        this as *const Object as id
    } else {
        nil
    }
}

/// Unrouted keys land here; swallow them instead of beeping.
extern "C" fn key_down(_this: &Object, _cmd: Sel, _event: id) {}

fn panel_class() -> Result<&'static Class> {
    if let Some(cls) = Class::get(PANEL_CLASS) {
        return Ok(cls);
    }
    let superclass = Class::get("NSPanel")
        .ok_or_else(|| KiwaError::Platform("NSPanel class missing".to_string()))?;
    let mut decl = ClassDecl::new(PANEL_CLASS, superclass)
        .ok_or_else(|| KiwaError::Platform(format!("could not declare {}", PANEL_CLASS)))?;
    unsafe {
        // Borderless windows refuse key status by default
        decl.add_method(
            sel!(canBecomeKeyWindow),
            yes as extern "C" fn(&Object, Sel) -> BOOL,
        );
        decl.add_method(
            sel!(canBecomeMainWindow),
            no as extern "C" fn(&Object, Sel) -> BOOL,
        );
    }
    Ok(decl.register())
}

fn view_class() -> Result<&'static Class> {
    if let Some(cls) = Class::get(VIEW_CLASS) {
        return Ok(cls);
    }
    let superclass = Class::get("NSView")
        .ok_or_else(|| KiwaError::Platform("NSView class missing".to_string()))?;
    let mut decl = ClassDecl::new(VIEW_CLASS, superclass)
        .ok_or_else(|| KiwaError::Platform(format!("could not declare {}", VIEW_CLASS)))?;
    unsafe {
        decl.add_method(sel!(isFlipped), yes as extern "C" fn(&Object, Sel) -> BOOL);
        decl.add_method(
            sel!(acceptsFirstMouse:),
            accepts_first_mouse as extern "C" fn(&Object, Sel, id) -> BOOL,
        );
        decl.add_method(
            sel!(acceptsFirstResponder),
            yes as extern "C" fn(&Object, Sel) -> BOOL,
        );
        decl.add_method(
            sel!(hitTest:),
            hit_test as extern "C" fn(&Object, Sel, NSPoint) -> id,
        );
        decl.add_method(sel!(mouseDown:), mouse_down as extern "C" fn(&Object, Sel, id));
        decl.add_method(sel!(keyDown:), key_down as extern "C" fn(&Object, Sel, id));
    }
    Ok(decl.register())
}

pub struct MacPanel {
    panel: id,
    content: id,
}

impl MacPanel {
    /// Create the (hidden) panel. `on_click` receives clicks inside it.
    pub fn new(on_click: impl Fn(SessionId, Point) + Send + Sync + 'static) -> Result<Self> {
        debug_assert_main_thread();
        let panel_cls = panel_class()?;
        let view_cls = view_class()?;
        *CLICK_HANDLER.lock() = Some(Arc::new(on_click));

        unsafe {
            let initial = NSRect::new(
                NSPoint::new(0.0, 0.0),
                NSSize::new(layout::ITEM_HEIGHT * 8.0, layout::ITEM_HEIGHT * 10.0),
            );
            let panel: id = msg_send![panel_cls, alloc];
            let panel: id = msg_send![
                panel,
                initWithContentRect: initial
                styleMask: STYLE_BORDERLESS | STYLE_NONACTIVATING_PANEL
                backing: BACKING_BUFFERED
                defer: NO
            ];
            if panel == nil {
                return Err(KiwaError::Platform("NSPanel init failed".to_string()));
            }

            let _: () = msg_send![panel, setLevel: FLOATING_WINDOW_LEVEL];
            let _: () = msg_send![panel, setFloatingPanel: YES];
            let _: () = msg_send![panel, setBecomesKeyOnlyIfNeeded: NO];
            let _: () = msg_send![panel, setHidesOnDeactivate: NO];
            let _: () = msg_send![panel, setReleasedWhenClosed: NO];
            let _: () = msg_send![panel, setRestorable: NO];
            let _: () = msg_send![
                panel,
                setCollectionBehavior: BEHAVIOR_MOVE_TO_ACTIVE_SPACE | BEHAVIOR_FULL_SCREEN_AUXILIARY
            ];
            let _: () = msg_send![panel, setOpaque: NO];
            let clear: id = msg_send![class!(NSColor), clearColor];
            let _: () = msg_send![panel, setBackgroundColor: clear];
            let _: () = msg_send![panel, setHasShadow: YES];

            let content: id = msg_send![view_cls, alloc];
            let content: id = msg_send![content, initWithFrame: initial];
            let _: () = msg_send![content, setWantsLayer: YES];
            let layer: id = msg_send![content, layer];
            let _: () = msg_send![layer, setCornerRadius: layout::CORNER_RADIUS];
            let _: () = msg_send![layer, setMasksToBounds: YES];
            set_layer_color(content, msg_send![class!(NSColor), windowBackgroundColor]);
            let _: () = msg_send![panel, setContentView: content];
            let _: () = msg_send![content, release];

            tracing::debug!("Created floating panel");
            Ok(Self { panel, content })
        }
    }

    unsafe fn clear_rows(&self) {
        let empty: id = msg_send![class!(NSArray), array];
        let _: () = msg_send![self.content, setSubviews: empty];
    }

    unsafe fn add_label(&self, text: &str, frame: Rect, font_size: f64, secondary: bool, align: Option<i64>) {
        let field: id = msg_send![class!(NSTextField), alloc];
        let field: id = msg_send![field, initWithFrame: rect_to_ns(frame)];
        let _: () = msg_send![field, setBezeled: NO];
        let _: () = msg_send![field, setDrawsBackground: NO];
        let _: () = msg_send![field, setEditable: NO];
        let _: () = msg_send![field, setSelectable: NO];
        let font: id = msg_send![class!(NSFont), systemFontOfSize: font_size];
        let _: () = msg_send![field, setFont: font];
        if secondary {
            let color: id = msg_send![class!(NSColor), secondaryLabelColor];
            let _: () = msg_send![field, setTextColor: color];
        }
        if let Some(align) = align {
            let _: () = msg_send![field, setAlignment: align];
        }
        let _: () = msg_send![field, setStringValue: nsstring(text)];
        let _: () = msg_send![self.content, addSubview: field];
        let _: () = msg_send![field, release];
    }

    unsafe fn add_fill(&self, frame: Rect, color: id, radius: f64) {
        let view: id = msg_send![class!(NSView), alloc];
        let view: id = msg_send![view, initWithFrame: rect_to_ns(frame)];
        let _: () = msg_send![view, setWantsLayer: YES];
        let layer: id = msg_send![view, layer];
        let _: () = msg_send![layer, setCornerRadius: radius];
        set_layer_color(view, color);
        let _: () = msg_send![self.content, addSubview: view];
        let _: () = msg_send![view, release];
    }
}

unsafe fn set_layer_color(view: id, color: id) {
    let layer: id = msg_send![view, layer];
    let cg: *const std::ffi::c_void = msg_send![color, CGColor];
    let _: () = msg_send![layer, setBackgroundColor: cg];
}

impl PanelSurface for MacPanel {
    fn frame(&self) -> Rect {
        unsafe { rect_from_ns(msg_send![self.panel, frame]) }
    }

    fn set_frame(&mut self, frame: Rect) {
        unsafe {
            let _: () = msg_send![self.panel, setFrame: rect_to_ns(frame) display: YES];
        }
    }

    fn animate_frame(&mut self, frame: Rect, duration: Duration) {
        unsafe {
            let _: () = msg_send![class!(NSAnimationContext), beginGrouping];
            let context: id = msg_send![class!(NSAnimationContext), currentContext];
            let _: () = msg_send![context, setDuration: duration.as_secs_f64()];
            let animator: id = msg_send![self.panel, animator];
            let _: () = msg_send![animator, setFrame: rect_to_ns(frame) display: YES];
            let _: () = msg_send![class!(NSAnimationContext), endGrouping];
        }
    }

    fn show(&mut self, session: SessionId) {
        debug_assert_main_thread();
        *CLICK_SESSION.lock() = Some(session);
        unsafe {
            let _: () = msg_send![self.panel, orderFrontRegardless];
            let _: () = msg_send![self.panel, makeKeyWindow];
            let _: () = msg_send![self.panel, makeFirstResponder: self.content];
        }
    }

    fn hide(&mut self) {
        *CLICK_SESSION.lock() = None;
        unsafe {
            let _: () = msg_send![self.panel, orderOut: nil];
        }
    }

    fn render(&mut self, model: &PanelViewModel) {
        let Some(panel_layout) = model.layout else {
            return;
        };
        let width = panel_layout.width;
        let row_width = width - layout::PADDING * 2.0;

        unsafe {
            self.clear_rows();

            for (index, row) in model.rows.iter().enumerate() {
                let top = panel_layout.row_top(index);
                let row_frame = Rect::new(
                    Point::new(layout::PADDING, top),
                    Size::new(row_width, layout::ITEM_HEIGHT),
                );
                if row.selected {
                    self.add_fill(
                        row_frame,
                        msg_send![class!(NSColor), selectedContentBackgroundColor],
                        layout::CORNER_RADIUS - 2.0,
                    );
                }

                let text_top = top + (layout::ITEM_HEIGHT - 20.0) / 2.0;
                let x = layout::PADDING + TEXT_INSET;
                self.add_label(
                    &row.text,
                    Rect::new(Point::new(x, text_top), Size::new(56.0, 20.0)),
                    SYMBOL_FONT_SIZE,
                    false,
                    None,
                );
                let label = match row.usage.as_deref() {
                    Some(usage) if !usage.is_empty() => format!("{}  {}", row.label, usage),
                    _ => row.label.clone(),
                };
                self.add_label(
                    &label,
                    Rect::new(
                        Point::new(x + 60.0, text_top + 1.0),
                        Size::new((row_width - 60.0 - 44.0 - TEXT_INSET).max(0.0), 18.0),
                    ),
                    LABEL_FONT_SIZE,
                    false,
                    None,
                );
                self.add_label(
                    &format!("⌘{}", row.slot_number),
                    Rect::new(
                        Point::new(layout::PADDING + row_width - 44.0 - TEXT_INSET, text_top + 1.0),
                        Size::new(44.0, 18.0),
                    ),
                    LABEL_FONT_SIZE,
                    true,
                    Some(ALIGN_RIGHT),
                );
            }

            let footer_top = panel_layout.height - layout::FOOTER_HEIGHT;
            self.add_fill(
                Rect::new(
                    Point::new(0.0, footer_top - layout::DIVIDER_HEIGHT),
                    Size::new(width, layout::DIVIDER_HEIGHT),
                ),
                msg_send![class!(NSColor), separatorColor],
                0.0,
            );

            let text_top = footer_top + (layout::FOOTER_HEIGHT - 16.0) / 2.0;
            let half = width / 2.0 - TEXT_INSET;
            for (index, item) in model.footer.iter().enumerate() {
                let (x, align) = if index == 0 {
                    (TEXT_INSET, None)
                } else {
                    (width / 2.0, Some(ALIGN_RIGHT))
                };
                self.add_label(
                    &format!("{}  {}", item.title, item.shortcut),
                    Rect::new(Point::new(x, text_top), Size::new(half, 16.0)),
                    FOOTER_FONT_SIZE,
                    true,
                    align,
                );
            }
            if !model.hotkey_hint.is_empty() {
                self.add_label(
                    &model.hotkey_hint,
                    Rect::new(
                        Point::new(width / 2.0 - 40.0, text_top),
                        Size::new(80.0, 16.0),
                    ),
                    FOOTER_FONT_SIZE,
                    true,
                    Some(ALIGN_CENTER),
                );
            }
        }
    }
}

impl Drop for MacPanel {
    fn drop(&mut self) {
        *CLICK_HANDLER.lock() = None;
        *CLICK_SESSION.lock() = None;
        unsafe {
            let _: () = msg_send![self.panel, orderOut: nil];
            let _: () = msg_send![self.panel, release];
        }
    }
}
