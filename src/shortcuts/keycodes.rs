//! Static key code table.
//!
//! The only place macOS virtual key codes (`kVK_*`) and `NSEvent` modifier
//! flag bits appear. Everything above this layer works with [`HotkeyCombo`],
//! slot numbers and semantic commands.
//!
//! [`HotkeyCombo`]: super::HotkeyCombo

use global_hotkey::hotkey::{Code, Modifiers as HotkeyModifiers};

use super::Modifiers;

/// macOS virtual key codes used by the panel and the hotkey table
pub mod key {
    pub const A: u16 = 0x00;
    pub const S: u16 = 0x01;
    pub const D: u16 = 0x02;
    pub const F: u16 = 0x03;
    pub const H: u16 = 0x04;
    pub const G: u16 = 0x05;
    pub const Z: u16 = 0x06;
    pub const X: u16 = 0x07;
    pub const C: u16 = 0x08;
    pub const V: u16 = 0x09;
    pub const B: u16 = 0x0B;
    pub const Q: u16 = 0x0C;
    pub const W: u16 = 0x0D;
    pub const E: u16 = 0x0E;
    pub const R: u16 = 0x0F;
    pub const Y: u16 = 0x10;
    pub const T: u16 = 0x11;
    pub const DIGIT_1: u16 = 0x12;
    pub const DIGIT_2: u16 = 0x13;
    pub const DIGIT_3: u16 = 0x14;
    pub const DIGIT_4: u16 = 0x15;
    pub const DIGIT_6: u16 = 0x16;
    pub const DIGIT_5: u16 = 0x17;
    pub const EQUAL: u16 = 0x18;
    pub const DIGIT_9: u16 = 0x19;
    pub const DIGIT_7: u16 = 0x1A;
    pub const MINUS: u16 = 0x1B;
    pub const DIGIT_8: u16 = 0x1C;
    pub const DIGIT_0: u16 = 0x1D;
    pub const RIGHT_BRACKET: u16 = 0x1E;
    pub const O: u16 = 0x1F;
    pub const U: u16 = 0x20;
    pub const LEFT_BRACKET: u16 = 0x21;
    pub const I: u16 = 0x22;
    pub const P: u16 = 0x23;
    pub const RETURN: u16 = 0x24;
    pub const L: u16 = 0x25;
    pub const J: u16 = 0x26;
    pub const QUOTE: u16 = 0x27;
    pub const K: u16 = 0x28;
    pub const SEMICOLON: u16 = 0x29;
    pub const BACKSLASH: u16 = 0x2A;
    pub const COMMA: u16 = 0x2B;
    pub const SLASH: u16 = 0x2C;
    pub const N: u16 = 0x2D;
    pub const M: u16 = 0x2E;
    pub const PERIOD: u16 = 0x2F;
    pub const TAB: u16 = 0x30;
    pub const SPACE: u16 = 0x31;
    pub const GRAVE: u16 = 0x32;
    pub const DELETE: u16 = 0x33;
    pub const ESCAPE: u16 = 0x35;
    pub const KEYPAD_ENTER: u16 = 0x4C;
    pub const F5: u16 = 0x60;
    pub const F6: u16 = 0x61;
    pub const F7: u16 = 0x62;
    pub const F3: u16 = 0x63;
    pub const F8: u16 = 0x64;
    pub const F9: u16 = 0x65;
    pub const F11: u16 = 0x67;
    pub const F10: u16 = 0x6D;
    pub const F12: u16 = 0x6F;
    pub const F4: u16 = 0x76;
    pub const F2: u16 = 0x78;
    pub const F1: u16 = 0x7A;
    pub const LEFT_ARROW: u16 = 0x7B;
    pub const RIGHT_ARROW: u16 = 0x7C;
    pub const DOWN_ARROW: u16 = 0x7D;
    pub const UP_ARROW: u16 = 0x7E;
}

/// `NSEventModifierFlags` bits
pub mod event_flags {
    pub const SHIFT: u64 = 1 << 17;
    pub const CONTROL: u64 = 1 << 18;
    pub const OPTION: u64 = 1 << 19;
    pub const COMMAND: u64 = 1 << 20;
}

/// Digit keys for slots 1 through 9. The ANSI row is not laid out in order.
const SLOT_KEYS: [u16; 9] = [
    key::DIGIT_1,
    key::DIGIT_2,
    key::DIGIT_3,
    key::DIGIT_4,
    key::DIGIT_5,
    key::DIGIT_6,
    key::DIGIT_7,
    key::DIGIT_8,
    key::DIGIT_9,
];

/// One row of the key table.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub key_code: u16,
    /// Shown in menus and combo displays
    pub character: &'static str,
    /// Extra names accepted by the shortcut parser
    pub aliases: &'static [&'static str],
    /// Equivalent `global-hotkey` code
    pub code: Code,
}

const fn spec(
    key_code: u16,
    character: &'static str,
    aliases: &'static [&'static str],
    code: Code,
) -> KeySpec {
    KeySpec {
        key_code,
        character,
        aliases,
        code,
    }
}

pub const KEY_TABLE: &[KeySpec] = &[
    spec(key::A, "A", &[], Code::KeyA),
    spec(key::B, "B", &[], Code::KeyB),
    spec(key::C, "C", &[], Code::KeyC),
    spec(key::D, "D", &[], Code::KeyD),
    spec(key::E, "E", &[], Code::KeyE),
    spec(key::F, "F", &[], Code::KeyF),
    spec(key::G, "G", &[], Code::KeyG),
    spec(key::H, "H", &[], Code::KeyH),
    spec(key::I, "I", &[], Code::KeyI),
    spec(key::J, "J", &[], Code::KeyJ),
    spec(key::K, "K", &[], Code::KeyK),
    spec(key::L, "L", &[], Code::KeyL),
    spec(key::M, "M", &[], Code::KeyM),
    spec(key::N, "N", &[], Code::KeyN),
    spec(key::O, "O", &[], Code::KeyO),
    spec(key::P, "P", &[], Code::KeyP),
    spec(key::Q, "Q", &[], Code::KeyQ),
    spec(key::R, "R", &[], Code::KeyR),
    spec(key::S, "S", &[], Code::KeyS),
    spec(key::T, "T", &[], Code::KeyT),
    spec(key::U, "U", &[], Code::KeyU),
    spec(key::V, "V", &[], Code::KeyV),
    spec(key::W, "W", &[], Code::KeyW),
    spec(key::X, "X", &[], Code::KeyX),
    spec(key::Y, "Y", &[], Code::KeyY),
    spec(key::Z, "Z", &[], Code::KeyZ),
    spec(key::DIGIT_0, "0", &[], Code::Digit0),
    spec(key::DIGIT_1, "1", &[], Code::Digit1),
    spec(key::DIGIT_2, "2", &[], Code::Digit2),
    spec(key::DIGIT_3, "3", &[], Code::Digit3),
    spec(key::DIGIT_4, "4", &[], Code::Digit4),
    spec(key::DIGIT_5, "5", &[], Code::Digit5),
    spec(key::DIGIT_6, "6", &[], Code::Digit6),
    spec(key::DIGIT_7, "7", &[], Code::Digit7),
    spec(key::DIGIT_8, "8", &[], Code::Digit8),
    spec(key::DIGIT_9, "9", &[], Code::Digit9),
    spec(key::EQUAL, "=", &["equal"], Code::Equal),
    spec(key::MINUS, "-", &["minus"], Code::Minus),
    spec(key::LEFT_BRACKET, "[", &["bracketleft"], Code::BracketLeft),
    spec(key::RIGHT_BRACKET, "]", &["bracketright"], Code::BracketRight),
    spec(key::QUOTE, "'", &["quote"], Code::Quote),
    spec(key::SEMICOLON, ";", &["semicolon"], Code::Semicolon),
    spec(key::BACKSLASH, "\\", &["backslash"], Code::Backslash),
    spec(key::COMMA, ",", &["comma"], Code::Comma),
    spec(key::SLASH, "/", &["slash"], Code::Slash),
    spec(key::PERIOD, ".", &["period"], Code::Period),
    spec(key::GRAVE, "`", &["backquote", "grave"], Code::Backquote),
    spec(key::SPACE, "Space", &["space"], Code::Space),
    spec(key::TAB, "\u{21E5}", &["tab"], Code::Tab),
    spec(key::RETURN, "\u{21A9}", &["return", "enter"], Code::Enter),
    spec(key::DELETE, "\u{232B}", &["delete", "backspace"], Code::Backspace),
    spec(key::ESCAPE, "\u{238B}", &["escape", "esc"], Code::Escape),
    spec(key::UP_ARROW, "\u{2191}", &["up", "arrowup"], Code::ArrowUp),
    spec(key::DOWN_ARROW, "\u{2193}", &["down", "arrowdown"], Code::ArrowDown),
    spec(key::LEFT_ARROW, "\u{2190}", &["left", "arrowleft"], Code::ArrowLeft),
    spec(key::RIGHT_ARROW, "\u{2192}", &["right", "arrowright"], Code::ArrowRight),
    spec(key::F1, "F1", &[], Code::F1),
    spec(key::F2, "F2", &[], Code::F2),
    spec(key::F3, "F3", &[], Code::F3),
    spec(key::F4, "F4", &[], Code::F4),
    spec(key::F5, "F5", &[], Code::F5),
    spec(key::F6, "F6", &[], Code::F6),
    spec(key::F7, "F7", &[], Code::F7),
    spec(key::F8, "F8", &[], Code::F8),
    spec(key::F9, "F9", &[], Code::F9),
    spec(key::F10, "F10", &[], Code::F10),
    spec(key::F11, "F11", &[], Code::F11),
    spec(key::F12, "F12", &[], Code::F12),
];

fn lookup(key_code: u16) -> Option<&'static KeySpec> {
    KEY_TABLE.iter().find(|spec| spec.key_code == key_code)
}

/// Slot number (1-9) addressed by a digit key, if any.
pub fn slot_number(key_code: u16) -> Option<u8> {
    SLOT_KEYS
        .iter()
        .position(|&k| k == key_code)
        .map(|idx| idx as u8 + 1)
}

/// Digit key for a slot number (1-9).
pub fn slot_key(slot: u8) -> Option<u16> {
    match slot {
        1..=9 => Some(SLOT_KEYS[usize::from(slot - 1)]),
        _ => None,
    }
}

/// Printable character for a key code, `"?"` when the key is not in the table.
pub fn key_character(key_code: u16) -> &'static str {
    lookup(key_code).map(|spec| spec.character).unwrap_or("?")
}

/// Resolve a key name from a shortcut string ("d", "F5", "space", "↩").
pub fn key_code_for_name(name: &str) -> Option<u16> {
    let lower = name.to_lowercase();
    KEY_TABLE
        .iter()
        .find(|spec| {
            spec.character.to_lowercase() == lower || spec.aliases.iter().any(|a| *a == lower)
        })
        .map(|spec| spec.key_code)
}

/// `global-hotkey` code for a key code, `None` when it cannot be registered.
pub fn hotkey_code(key_code: u16) -> Option<Code> {
    lookup(key_code).map(|spec| spec.code)
}

/// Convert the persisted modifier bitmask into `global-hotkey` modifiers.
pub fn hotkey_modifiers(modifiers: Modifiers) -> HotkeyModifiers {
    let mut out = HotkeyModifiers::empty();
    if modifiers.contains(Modifiers::CMD) {
        out |= HotkeyModifiers::META;
    }
    if modifiers.contains(Modifiers::OPTION) {
        out |= HotkeyModifiers::ALT;
    }
    if modifiers.contains(Modifiers::CONTROL) {
        out |= HotkeyModifiers::CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        out |= HotkeyModifiers::SHIFT;
    }
    out
}

/// Decode `NSEvent.modifierFlags` into the persisted modifier bitmask.
/// Device-dependent bits (caps lock, fn, numeric pad) are ignored.
pub fn modifiers_from_event_flags(flags: u64) -> Modifiers {
    let mut out = Modifiers::empty();
    if flags & event_flags::COMMAND != 0 {
        out |= Modifiers::CMD;
    }
    if flags & event_flags::OPTION != 0 {
        out |= Modifiers::OPTION;
    }
    if flags & event_flags::CONTROL != 0 {
        out |= Modifiers::CONTROL;
    }
    if flags & event_flags::SHIFT != 0 {
        out |= Modifiers::SHIFT;
    }
    out
}
