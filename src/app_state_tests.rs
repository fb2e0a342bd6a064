use super::*;
use crate::dispatch::{ui_channel, UiQueue};
use crate::input_router::{Disposition, InterceptScope, MouseButton, RawInputEvent};
use crate::panel::{layout, Rect, Size};
use crate::shortcuts::keycodes::key;
use crate::shortcuts::{HotkeyCombo, Modifiers};
use crate::symbols::SymbolId;
use crate::testing::{
    FakeFocusRegistry, FakeHotkeyBackend, FakeIndicator, FakeInputHook, FakePanelSurface,
    FakeScreen, FakeSettings, MemoryClipboard,
};
use std::cell::Cell;
use std::rc::Rc;

struct Harness {
    app: AppState,
    queue: UiQueue<AppEvent>,
    hotkeys: FakeHotkeyBackend,
    surface: FakePanelSurface,
    indicator: FakeIndicator,
    input: FakeInputHook,
    focus: FakeFocusRegistry,
    clipboard: MemoryClipboard,
    settings: FakeSettings,
    quits: Rc<Cell<usize>>,
    clock: f64,
}

fn corner_brackets() -> Symbol {
    Symbol::new(SymbolId::preset(1), "「", Some("」"), "Corner brackets", 1)
}

fn em_dash() -> Symbol {
    Symbol::new(SymbolId::preset(2), "—", None, "Em dash", 2)
}

fn middle_dot() -> Symbol {
    Symbol::new(SymbolId::preset(3), "·", None, "Middle dot", 3)
}

fn three_symbol_config() -> Config {
    Config {
        symbols: vec![corner_brackets(), em_dash(), middle_dot()],
        ..Config::default()
    }
}

fn harness(config: Config) -> Harness {
    let hotkeys = FakeHotkeyBackend::default();
    let surface = FakePanelSurface::default();
    let indicator = FakeIndicator::default();
    let input = FakeInputHook::default();
    let focus = FakeFocusRegistry::with_app("com.apple.TextEdit", "TextEdit");
    let clipboard = MemoryClipboard::with_contents("before");
    let settings = FakeSettings::default();
    let quits = Rc::new(Cell::new(0));

    let screen = FakeScreen::new(
        Point::new(500.0, 400.0),
        Rect::new(Point::new(0.0, 0.0), Size::new(1440.0, 875.0)),
    );
    let quit_counter = quits.clone();
    let services = AppServices {
        hotkeys: Box::new(hotkeys.clone()),
        panel: PanelDeps {
            surface: Box::new(surface.clone()),
            screen: Box::new(screen),
            indicator: Box::new(indicator.clone()),
            input: Box::new(input.clone()),
            focus: Arc::new(focus.clone()),
        },
        clipboard: Box::new(clipboard.clone()),
        settings: Box::new(settings.clone()),
        on_quit: Box::new(move || quit_counter.set(quit_counter.get() + 1)),
    };

    let (events, queue) = ui_channel(Arc::new(|| {}));
    Harness {
        app: AppState::new(config, services, events),
        queue,
        hotkeys,
        surface,
        indicator,
        input,
        focus,
        clipboard,
        settings,
        quits,
        clock: 100.0,
    }
}

fn started(config: Config) -> Harness {
    let mut h = harness(config);
    h.app.start().unwrap();
    h
}

impl Harness {
    fn pump(&mut self) -> usize {
        let Harness { app, queue, .. } = self;
        queue.drain(|event| app.handle(event))
    }

    fn press_hotkey(&mut self) {
        let id = self
            .hotkeys
            .id_for(self.app.hotkeys().current_combo().unwrap())
            .unwrap();
        self.app.handle(AppEvent::HotkeyFired(id));
        self.pump();
    }

    fn open(&mut self) -> SessionId {
        self.app.handle(AppEvent::TogglePanel);
        self.pump();
        self.app.panel().session().unwrap().id
    }

    fn tick(&mut self) -> f64 {
        self.clock += 0.01;
        self.clock
    }

    fn key(&mut self, key_code: u16, modifiers: Modifiers) -> Option<Disposition> {
        let event = RawInputEvent::KeyDown {
            key_code,
            modifiers,
            timestamp: self.tick(),
        };
        let disposition = self.input.inject(InterceptScope::Local, event);
        self.pump();
        disposition
    }

    fn global_click(&mut self, location: Point) -> Option<Disposition> {
        let event = RawInputEvent::MouseDown {
            button: MouseButton::Primary,
            location,
            timestamp: self.tick(),
        };
        let disposition = self.input.inject(InterceptScope::Global, event);
        self.pump();
        disposition
    }

    fn click_at(&mut self, point: Point) {
        let session = self.surface.shown_session().expect("panel is showing");
        self.app.handle(AppEvent::PanelClicked { session, point });
        self.pump();
    }

    fn row_point(&self, index: usize) -> Point {
        let y = self.app.panel().layout().row_top(index) + layout::ITEM_HEIGHT / 2.0;
        Point::new(40.0, y)
    }

    fn click_row(&mut self, index: usize) {
        let point = self.row_point(index);
        self.click_at(point);
    }

    fn click_footer(&mut self, action: FooterAction) {
        let panel = self.app.panel().layout();
        let x = match action {
            FooterAction::Settings => 10.0,
            FooterAction::Quit => panel.width - 10.0,
        };
        let y = panel.height - layout::FOOTER_HEIGHT / 2.0;
        self.click_at(Point::new(x, y));
    }

    fn reload(&mut self, config: Config) {
        self.app.handle(AppEvent::ConfigReloaded(Box::new(config)));
        self.pump();
    }

    fn selected_row(&self) -> Option<usize> {
        self.surface.last_model().and_then(|m| m.selected_row())
    }
}

// ============================================================================
// Toggle
// ============================================================================

#[test]
fn test_hotkey_press_toggles_panel() {
    let mut h = started(Config::default());
    assert_eq!(h.hotkeys.registered_count(), 1);

    h.press_hotkey();
    assert!(h.app.panel().is_open());
    assert!(h.surface.is_visible());
    assert!(h.indicator.is_active());
    assert_eq!(h.input.installed_count(), 2);

    let model = h.surface.last_model().unwrap();
    assert_eq!(model.rows.len(), 9);
    assert_eq!(model.selected_row(), Some(0));
    assert_eq!(
        model.hotkey_hint,
        HotkeyCombo::default_hotkey().display_string()
    );

    h.press_hotkey();
    assert!(!h.app.panel().is_open());
    assert!(!h.surface.is_visible());
    assert!(!h.indicator.is_active());
    assert_eq!(h.input.installed_count(), 0);
}

#[test]
fn test_status_item_toggle_works_when_hotkey_rejected() {
    let mut h = harness(Config::default());
    h.hotkeys.reject(HotkeyCombo::default_hotkey());

    assert!(h.app.start().is_err());
    assert!(!h.app.hotkeys().is_registered());

    h.open();
    assert!(h.surface.is_visible());
}

// ============================================================================
// Keyboard
// ============================================================================

#[test]
fn test_escape_closes_without_touching_clipboard_or_focus() {
    let mut h = started(three_symbol_config());
    h.open();

    assert_eq!(h.key(key::ESCAPE, Modifiers::empty()), Some(Disposition::Swallow));
    assert!(!h.app.panel().is_open());
    assert_eq!(h.clipboard.contents().as_deref(), Some("before"));
    assert!(h.focus.activations().is_empty());
}

#[test]
fn test_return_commits_highlighted_symbol_and_restores_focus() {
    let mut h = started(three_symbol_config());
    h.open();

    h.key(key::RETURN, Modifiers::empty());
    assert_eq!(h.clipboard.contents().as_deref(), Some("「」"));
    assert!(!h.app.panel().is_open());

    let activations = h.focus.activations();
    assert_eq!(activations.len(), 1);
    assert_eq!(activations[0].bundle_id, "com.apple.TextEdit");
}

#[test]
fn test_arrows_move_highlight_and_commit_follows_it() {
    let mut h = started(three_symbol_config());
    h.open();
    assert_eq!(h.selected_row(), Some(0));

    h.key(key::DOWN_ARROW, Modifiers::empty());
    h.key(key::DOWN_ARROW, Modifiers::empty());
    assert_eq!(h.selected_row(), Some(2));

    // Clamped at the end
    h.key(key::DOWN_ARROW, Modifiers::empty());
    assert_eq!(h.selected_row(), Some(2));

    h.key(key::UP_ARROW, Modifiers::empty());
    assert_eq!(h.selected_row(), Some(1));

    h.key(key::KEYPAD_ENTER, Modifiers::empty());
    assert_eq!(h.clipboard.contents().as_deref(), Some("—"));
}

#[test]
fn test_command_digit_commits_slot() {
    let mut h = started(three_symbol_config());
    h.open();

    h.key(key::DIGIT_3, Modifiers::CMD);
    assert_eq!(h.clipboard.contents().as_deref(), Some("·"));
    assert!(!h.app.panel().is_open());
}

#[test]
fn test_command_digit_for_empty_slot_is_ignored() {
    let mut h = started(three_symbol_config());
    h.open();

    h.key(key::DIGIT_7, Modifiers::CMD);
    assert!(h.app.panel().is_open());
    assert_eq!(h.clipboard.contents().as_deref(), Some("before"));
}

#[test]
fn test_plain_digit_does_nothing() {
    let mut h = started(three_symbol_config());
    h.open();

    assert_eq!(h.key(key::DIGIT_1, Modifiers::empty()), Some(Disposition::PassThrough));
    assert!(h.app.panel().is_open());
    assert_eq!(h.clipboard.write_count(), 0);
}

#[test]
fn test_command_comma_opens_settings_and_closes() {
    let mut h = started(Config::default());
    h.open();

    h.key(key::COMMA, Modifiers::CMD);
    assert_eq!(h.settings.open_count(), 1);
    assert!(!h.app.panel().is_open());
}

#[test]
fn test_command_q_quits() {
    let mut h = started(Config::default());
    h.open();

    h.key(key::Q, Modifiers::CMD);
    assert_eq!(h.quits.get(), 1);
    assert!(!h.app.panel().is_open());
    assert_eq!(h.hotkeys.registered_count(), 0);
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_command_for_previous_session_is_discarded() {
    let mut h = started(three_symbol_config());
    let first = h.open();
    h.app.handle(AppEvent::TogglePanel);
    let second = h.open();
    assert_ne!(first, second);

    h.app.handle(AppEvent::Panel {
        session: first,
        command: PanelCommand::CommitSelected,
    });
    assert!(h.app.panel().is_open());
    assert_eq!(h.clipboard.write_count(), 0);

    h.app.handle(AppEvent::Panel {
        session: second,
        command: PanelCommand::CommitSelected,
    });
    assert_eq!(h.clipboard.contents().as_deref(), Some("「」"));
}

#[test]
fn test_command_after_close_is_discarded() {
    let mut h = started(three_symbol_config());
    let session = h.open();
    h.key(key::ESCAPE, Modifiers::empty());

    h.app.handle(AppEvent::Panel {
        session,
        command: PanelCommand::CommitSlot(1),
    });
    assert_eq!(h.clipboard.write_count(), 0);
    assert!(!h.surface.is_visible());
}

#[test]
fn test_focus_restore_failure_still_commits() {
    let mut h = started(three_symbol_config());
    h.focus.fail_activation(true);
    h.open();

    h.key(key::RETURN, Modifiers::empty());
    assert_eq!(h.clipboard.contents().as_deref(), Some("「」"));
    assert!(!h.app.panel().is_open());
}

#[test]
fn test_clipboard_failure_still_closes() {
    let mut h = started(three_symbol_config());
    h.clipboard.fail_writes(true);
    h.open();

    h.key(key::RETURN, Modifiers::empty());
    assert!(!h.app.panel().is_open());
    assert_eq!(h.clipboard.contents().as_deref(), Some("before"));
}

// ============================================================================
// Mouse
// ============================================================================

#[test]
fn test_row_click_commits_that_row() {
    let mut h = started(three_symbol_config());
    h.open();

    h.click_row(1);
    assert_eq!(h.clipboard.contents().as_deref(), Some("—"));
    assert!(!h.app.panel().is_open());
    assert_eq!(h.focus.activations().len(), 1);
}

#[test]
fn test_footer_clicks() {
    let mut h = started(three_symbol_config());
    h.open();
    h.click_footer(FooterAction::Settings);
    assert_eq!(h.settings.open_count(), 1);
    assert!(!h.app.panel().is_open());

    h.open();
    h.click_footer(FooterAction::Quit);
    assert_eq!(h.quits.get(), 1);
}

#[test]
fn test_click_while_closed_is_ignored() {
    let mut h = started(three_symbol_config());
    let session = h.open();
    let point = h.row_point(0);
    h.key(key::ESCAPE, Modifiers::empty());
    assert_eq!(h.surface.shown_session(), None);

    h.app.handle(AppEvent::PanelClicked { session, point });
    assert_eq!(h.clipboard.write_count(), 0);
    assert_eq!(h.settings.open_count(), 0);
    assert_eq!(h.quits.get(), 0);
}

#[test]
fn test_click_from_previous_session_does_not_commit_into_new_one() {
    let mut h = started(three_symbol_config());
    let first = h.open();
    let point = h.row_point(2);

    h.app.handle(AppEvent::TogglePanel);
    h.app.handle(AppEvent::TogglePanel);
    let second = h.surface.shown_session().unwrap();
    assert_ne!(first, second);

    h.app.handle(AppEvent::PanelClicked {
        session: first,
        point,
    });
    assert!(h.app.panel().is_open());
    assert_eq!(h.clipboard.write_count(), 0);

    h.app.handle(AppEvent::PanelClicked {
        session: second,
        point,
    });
    assert_eq!(h.clipboard.contents().as_deref(), Some("·"));
    assert!(!h.app.panel().is_open());
}

#[test]
fn test_outside_click_dismisses_and_passes_through() {
    let mut h = started(three_symbol_config());
    h.open();

    assert_eq!(
        h.global_click(Point::new(5.0, 5.0)),
        Some(Disposition::PassThrough)
    );
    assert!(!h.app.panel().is_open());
    assert_eq!(h.clipboard.write_count(), 0);
    assert!(h.focus.activations().is_empty());
}

// ============================================================================
// Quit
// ============================================================================

#[test]
fn test_quit_runs_once() {
    let mut h = started(Config::default());
    h.app.handle(AppEvent::Quit);
    h.app.handle(AppEvent::Quit);
    assert_eq!(h.quits.get(), 1);
    assert!(!h.app.hotkeys().is_registered());
}

// ============================================================================
// Config reload
// ============================================================================

#[test]
fn test_reload_replaces_hotkey() {
    let mut h = started(Config::default());
    let old_id = h.hotkeys.id_for(HotkeyCombo::default_hotkey()).unwrap();
    let new_combo = HotkeyCombo::new(key::K, Modifiers::CMD | Modifiers::SHIFT);

    h.reload(Config {
        hotkey: new_combo,
        ..Config::default()
    });
    assert_eq!(h.app.hotkeys().current_combo(), Some(new_combo));
    assert_eq!(h.hotkeys.registered_count(), 1);

    h.app.handle(AppEvent::HotkeyFired(old_id));
    h.pump();
    assert!(!h.app.panel().is_open());

    h.press_hotkey();
    assert!(h.app.panel().is_open());
}

#[test]
fn test_rejected_hotkey_keeps_previous_and_is_retried() {
    let mut h = started(Config::default());
    let new_combo = HotkeyCombo::new(key::K, Modifiers::CMD);
    h.hotkeys.reject(new_combo);
    let calls = h.hotkeys.register_calls();

    let config = Config {
        hotkey: new_combo,
        ..Config::default()
    };
    h.reload(config.clone());
    assert_eq!(
        h.app.hotkeys().current_combo(),
        Some(HotkeyCombo::default_hotkey())
    );

    h.reload(config);
    assert_eq!(h.hotkeys.register_calls(), calls + 2);

    h.press_hotkey();
    assert!(h.app.panel().is_open());
}

#[test]
fn test_reload_revalidates_selection_and_refits_open_panel() {
    let mut h = started(three_symbol_config());
    h.open();
    h.key(key::DOWN_ARROW, Modifiers::empty());
    assert_eq!(h.selected_row(), Some(1));

    h.reload(Config {
        symbols: vec![corner_brackets(), middle_dot()],
        ..Config::default()
    });

    let model = h.surface.last_model().unwrap();
    assert_eq!(model.rows.len(), 2);
    assert_eq!(model.selected_row(), Some(0));
    assert_eq!(h.surface.animations().len(), 1);
    assert_eq!(
        h.app.panel().layout().height,
        crate::panel::PanelLayout::content_height(2)
    );
}

#[test]
fn test_reload_keeps_surviving_selection() {
    let mut h = started(three_symbol_config());
    h.open();
    h.key(key::DOWN_ARROW, Modifiers::empty());
    h.key(key::DOWN_ARROW, Modifiers::empty());

    h.reload(Config {
        symbols: vec![em_dash(), middle_dot()],
        ..Config::default()
    });
    assert_eq!(h.selected_row(), Some(1));
}

#[test]
fn test_new_size_applies_at_next_open() {
    let mut h = started(three_symbol_config());
    h.open();
    assert_eq!(h.surface.frame_now().size.width, 260.0);

    h.reload(Config {
        panel_width: 300.0,
        ..three_symbol_config()
    });
    assert_eq!(h.surface.frame_now().size.width, 260.0);

    h.app.handle(AppEvent::TogglePanel);
    h.open();
    assert_eq!(h.surface.frame_now().size.width, 300.0);
    assert_eq!(h.app.config().panel_width, 300.0);
}

#[test]
fn test_unchanged_reload_does_not_touch_registration() {
    let mut h = started(Config::default());
    let calls = h.hotkeys.register_calls();
    h.reload(Config::default());
    assert_eq!(h.hotkeys.register_calls(), calls);
    assert!(h.surface.animations().is_empty());
}

const SYMBOLS_WITHOUT_IDS: &str = r#"{
    "symbols": [
        {"opening": "「", "closing": "」", "label": "Corner brackets", "slotNumber": 1},
        {"opening": "—", "label": "Em dash", "slotNumber": 2},
        {"opening": "·", "label": "Middle dot", "slotNumber": 3}
    ]
}"#;

#[test]
fn test_reparsed_file_without_ids_keeps_open_session() {
    let parse = || serde_json::from_str::<Config>(SYMBOLS_WITHOUT_IDS).unwrap();
    let mut h = started(parse());
    h.open();
    h.key(key::DOWN_ARROW, Modifiers::empty());
    h.key(key::DOWN_ARROW, Modifiers::empty());
    assert_eq!(h.selected_row(), Some(2));

    h.reload(parse());
    assert_eq!(h.selected_row(), Some(2));
    assert!(h.surface.animations().is_empty());

    // A hotkey-only edit leaves the rows alone too
    h.reload(Config {
        hotkey: HotkeyCombo::parse("cmd+shift+k").unwrap(),
        ..parse()
    });
    assert_eq!(h.selected_row(), Some(2));
    assert!(h.surface.animations().is_empty());
}
