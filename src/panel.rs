//! Floating panel: geometry, layout and the open/close lifecycle.
//!
//! All rectangles are in Cocoa screen coordinates (origin bottom-left, y up),
//! except hit-testing inside the panel, which uses flipped view coordinates
//! (origin top-left).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::focus::{FocusRegistry, FocusedApp};
use crate::input_router::{CommandSink, InputEventRouter, InputHook};
use crate::logging;
use crate::selection::SelectionState;
use crate::symbols::{Symbol, SymbolId};

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Half-open containment: min edges inside, max edges outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    #[cfg(test)]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }
}

/// Center a panel of `size` on `pointer`, then clamp into `visible`.
///
/// A panel larger than the visible frame is pinned to its left/bottom edge.
pub fn place_near_pointer(pointer: Point, size: Size, visible: Rect) -> Rect {
    let clamp_axis = |centered: f64, extent: f64, min: f64, max: f64| -> f64 {
        let upper = max - extent;
        if upper < min {
            min
        } else {
            centered.clamp(min, upper)
        }
    };

    let x = clamp_axis(
        pointer.x - size.width / 2.0,
        size.width,
        visible.min_x(),
        visible.max_x(),
    );
    let y = clamp_axis(
        pointer.y - size.height / 2.0,
        size.height,
        visible.min_y(),
        visible.max_y(),
    );
    Rect::new(Point::new(x, y), size)
}

/// Vertical-only resize that keeps the bottom edge in place; the top edge moves.
pub fn resize_anchor_bottom(frame: Rect, new_height: f64) -> Rect {
    Rect::new(frame.origin, Size::new(frame.size.width, new_height.max(0.0)))
}

// ============================================================================
// Layout
// ============================================================================

/// Layout constants shared by the renderer and hit-testing
pub mod layout {
    /// Height of one symbol row
    pub const ITEM_HEIGHT: f64 = 32.0;
    /// Inset above the first row and around row content
    pub const PADDING: f64 = 5.0;
    /// Rounded corner radius of the panel background
    pub const CORNER_RADIUS: f64 = 8.0;
    /// Divider between rows and footer
    pub const DIVIDER_HEIGHT: f64 = 1.0;
    /// Footer row holding Settings and Quit side by side
    pub const FOOTER_HEIGHT: f64 = 24.0;
}

/// Footer actions, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterAction {
    Settings,
    Quit,
}

impl FooterAction {
    pub const ALL: [FooterAction; 2] = [FooterAction::Settings, FooterAction::Quit];

    pub fn title(&self) -> &'static str {
        match self {
            FooterAction::Settings => "Settings",
            FooterAction::Quit => "Quit",
        }
    }

    pub fn shortcut(&self) -> &'static str {
        match self {
            FooterAction::Settings => "\u{2318},",
            FooterAction::Quit => "\u{2318}Q",
        }
    }
}

/// What a click inside the panel landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelHit {
    /// Index into the slot-ordered symbol list
    Symbol(usize),
    Footer(FooterAction),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub width: f64,
    pub height: f64,
    pub row_count: usize,
}

impl PanelLayout {
    /// Height needed to show `row_count` rows plus the footer
    pub fn content_height(row_count: usize) -> f64 {
        layout::PADDING
            + row_count as f64 * layout::ITEM_HEIGHT
            + layout::DIVIDER_HEIGHT
            + layout::FOOTER_HEIGHT
    }

    /// Fit the height to the content, capped at `max_height`
    pub fn fitted(width: f64, max_height: f64, row_count: usize) -> Self {
        Self {
            width,
            height: Self::content_height(row_count).min(max_height),
            row_count,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Rows that fit above the footer at the current height
    pub fn visible_rows(&self) -> usize {
        let available =
            self.height - layout::PADDING - layout::DIVIDER_HEIGHT - layout::FOOTER_HEIGHT;
        if available <= 0.0 {
            return 0;
        }
        ((available / layout::ITEM_HEIGHT).floor() as usize).min(self.row_count)
    }

    /// Top of row `index` in flipped view coordinates
    pub fn row_top(&self, index: usize) -> f64 {
        layout::PADDING + index as f64 * layout::ITEM_HEIGHT
    }

    /// Hit-test a point in flipped view coordinates.
    pub fn hit_test(&self, point: Point) -> Option<PanelHit> {
        if point.x < 0.0 || point.x >= self.width || point.y < 0.0 || point.y >= self.height {
            return None;
        }

        let footer_top = self.height - layout::FOOTER_HEIGHT;
        if point.y >= footer_top {
            let action = if point.x < self.width / 2.0 {
                FooterAction::Settings
            } else {
                FooterAction::Quit
            };
            return Some(PanelHit::Footer(action));
        }

        let rows_top = layout::PADDING;
        if point.y < rows_top {
            return None;
        }
        let index = ((point.y - rows_top) / layout::ITEM_HEIGHT).floor() as usize;
        (index < self.visible_rows()).then_some(PanelHit::Symbol(index))
    }
}

// ============================================================================
// View model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub symbol_id: SymbolId,
    pub slot_number: u8,
    pub text: String,
    pub label: String,
    pub usage: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterItem {
    pub action: FooterAction,
    pub title: &'static str,
    pub shortcut: &'static str,
}

/// Everything the surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelViewModel {
    pub rows: Vec<PanelRow>,
    pub footer: Vec<FooterItem>,
    pub hotkey_hint: String,
    pub layout: Option<PanelLayout>,
}

impl PanelViewModel {
    pub fn build(
        symbols: &[Symbol],
        selection: &SelectionState,
        hotkey_hint: String,
        layout: PanelLayout,
    ) -> Self {
        let selected = selection.selected();
        let rows = symbols
            .iter()
            .take(layout.visible_rows())
            .map(|s| PanelRow {
                symbol_id: s.id,
                slot_number: s.slot_number,
                text: s.display_text(),
                label: s.label.clone(),
                usage: s.usage.clone(),
                selected: selected == Some(s.id),
            })
            .collect();
        let footer = FooterAction::ALL
            .iter()
            .map(|&action| FooterItem {
                action,
                title: action.title(),
                shortcut: action.shortcut(),
            })
            .collect();
        Self {
            rows,
            footer,
            hotkey_hint,
            layout: Some(layout),
        }
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.selected)
    }
}

// ============================================================================
// Collaborator seams
// ============================================================================

/// Borderless, non-activating floating window.
pub trait PanelSurface {
    fn frame(&self) -> Rect;
    fn set_frame(&mut self, frame: Rect);
    /// Animate to `frame` over `duration`
    fn animate_frame(&mut self, frame: Rect, duration: Duration);
    /// Order front and make key without activating this process. Clicks
    /// reported until the next `hide` carry `session`.
    fn show(&mut self, session: SessionId);
    fn hide(&mut self);
    fn render(&mut self, model: &PanelViewModel);
    /// Area that counts as "inside" for outside-click detection, screen coordinates
    fn content_bounds(&self) -> Rect {
        self.frame()
    }
}

/// Pointer location and screen geometry.
pub trait ScreenProbe {
    fn pointer_location(&self) -> Point;
    /// Visible frame (minus menu bar and Dock) of the screen containing `point`
    fn visible_frame_at(&self, point: Point) -> Rect;
}

/// Status-bar active highlight.
pub trait StatusIndicator {
    fn set_active(&mut self, active: bool);
}

// ============================================================================
// Session
// ============================================================================

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one panel visibility period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State that lives exactly as long as the panel is visible.
#[derive(Debug)]
pub struct PanelSession {
    pub id: SessionId,
    pub previous_app: Option<FocusedApp>,
    pub selection: SelectionState,
    pub opened_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

/// Result of [`PanelLifecycleController::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Opened(SessionId),
    Closed(SessionId),
}

// ============================================================================
// Lifecycle controller
// ============================================================================

/// Duration of the cosmetic height animation
pub const RESIZE_DURATION: Duration = Duration::from_millis(150);

pub struct PanelDeps {
    pub surface: Box<dyn PanelSurface>,
    pub screen: Box<dyn ScreenProbe>,
    pub indicator: Box<dyn StatusIndicator>,
    pub input: Box<dyn InputHook>,
    pub focus: Arc<dyn FocusRegistry + Send + Sync>,
}

pub struct PanelLifecycleController {
    surface: Box<dyn PanelSurface>,
    screen: Box<dyn ScreenProbe>,
    indicator: Box<dyn StatusIndicator>,
    router: InputEventRouter,
    focus: Arc<dyn FocusRegistry + Send + Sync>,
    session: Option<PanelSession>,
    width: f64,
    max_height: f64,
    layout: PanelLayout,
    on_close: Option<Box<dyn FnMut(SessionId)>>,
}

impl PanelLifecycleController {
    pub fn new(deps: PanelDeps, width: f64, max_height: f64) -> Self {
        Self {
            surface: deps.surface,
            screen: deps.screen,
            indicator: deps.indicator,
            router: InputEventRouter::new(deps.input),
            focus: deps.focus,
            session: None,
            width,
            max_height,
            layout: PanelLayout::fitted(width, max_height, 0),
            on_close: None,
        }
    }

    /// Called after every close, with the id of the session that ended.
    pub fn set_on_close(&mut self, callback: impl FnMut(SessionId) + 'static) {
        self.on_close = Some(Box::new(callback));
    }

    /// New dimensions take effect on the next open.
    pub fn set_size(&mut self, width: f64, max_height: f64) {
        self.width = width;
        self.max_height = max_height;
    }

    pub fn state(&self) -> PanelState {
        if self.session.is_some() {
            PanelState::Open
        } else {
            PanelState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&PanelSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut PanelSession> {
        self.session.as_mut()
    }

    /// True when `id` names the session that is open right now.
    pub fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    /// Show the panel for `symbols` and start intercepting input.
    ///
    /// Already open: returns the current session unchanged. If the input
    /// interceptors cannot be installed the panel is hidden again and the
    /// error is returned.
    pub fn open(&mut self, symbols: &[Symbol], commands: CommandSink) -> Result<SessionId> {
        if let Some(session) = self.session.as_ref() {
            return Ok(session.id);
        }

        let id = SessionId::next();
        let previous_app = self.focus.current_focused_application();

        self.layout = PanelLayout::fitted(self.width, self.max_height, symbols.len());
        let pointer = self.screen.pointer_location();
        let visible = self.screen.visible_frame_at(pointer);
        let frame = place_near_pointer(pointer, self.layout.size(), visible);

        self.surface.set_frame(frame);
        self.surface.show(id);

        if let Err(e) = self
            .router
            .start(id, self.surface.content_bounds(), commands)
        {
            self.surface.hide();
            logging::log_error("PANEL", &e.to_string(), Some("open"));
            return Err(e);
        }

        let mut selection = SelectionState::new();
        selection.highlight_first(symbols);

        self.indicator.set_active(true);
        self.session = Some(PanelSession {
            id,
            previous_app,
            selection,
            opened_at: Instant::now(),
        });

        tracing::info!(
            session = %id,
            x = frame.origin.x,
            y = frame.origin.y,
            height = frame.size.height,
            previous_app = ?self.session.as_ref().and_then(|s| s.previous_app.as_ref()).map(|a| a.name.as_str()),
            "Panel opened"
        );
        Ok(id)
    }

    /// Hide the panel and tear down input interception.
    ///
    /// Returns the session that ended, or `None` if the panel was already
    /// closed. Does not restore focus.
    pub fn close(&mut self) -> Option<PanelSession> {
        // Safe even if never started
        self.router.stop();

        let session = self.session.take()?;
        self.surface.hide();
        self.indicator.set_active(false);

        tracing::info!(
            session = %session.id,
            open_ms = session.opened_at.elapsed().as_millis() as u64,
            "Panel closed"
        );

        if let Some(callback) = self.on_close.as_mut() {
            callback(session.id);
        }
        Some(session)
    }

    pub fn toggle(&mut self, symbols: &[Symbol], commands: CommandSink) -> Result<ToggleOutcome> {
        match self.close() {
            Some(session) => Ok(ToggleOutcome::Closed(session.id)),
            None => self.open(symbols, commands).map(ToggleOutcome::Opened),
        }
    }

    /// Refit the height for `row_count` rows, animated.
    pub fn refit(&mut self, row_count: usize) {
        let layout = PanelLayout::fitted(self.layout.width, self.max_height, row_count);
        let height_changed = layout.height != self.layout.height;
        self.layout = layout;
        if height_changed {
            self.resize_height(layout.height);
        }
    }

    /// Animated vertical resize, bottom edge anchored.
    pub fn resize_height(&mut self, new_height: f64) {
        let frame = resize_anchor_bottom(self.surface.frame(), new_height);
        self.layout.height = frame.size.height;
        if self.session.is_some() {
            self.surface.animate_frame(frame, RESIZE_DURATION);
            self.router.update_bounds(self.surface.content_bounds());
        } else {
            self.surface.set_frame(frame);
        }
    }

    pub fn render(&mut self, model: &PanelViewModel) {
        self.surface.render(model);
    }

    pub fn focus_registry(&self) -> &Arc<dyn FocusRegistry + Send + Sync> {
        &self.focus
    }
}
