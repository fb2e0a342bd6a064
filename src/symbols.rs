//! Symbol records and the active symbol catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a symbol across reloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(Uuid);

impl SymbolId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for built-in presets, so their identity survives restarts.
    pub const fn preset(slot: u8) -> Self {
        Self(Uuid::from_u128(0x6b69_7761_0000_4000_8000_0000_0000_0000 | slot as u128))
    }

    /// Id for a record stored without one. The same slot and text always map
    /// to the same id, so reloading an unchanged file keeps every identity.
    pub fn derived(slot: u8, opening: &str, closing: Option<&str>) -> Self {
        let name = format!("{}\u{1f}{}\u{1f}{}", slot, opening, closing.unwrap_or(""));
        Self(Uuid::new_v5(&SYMBOL_NAMESPACE, name.as_bytes()))
    }
}

/// UUIDv5 namespace for [`SymbolId::derived`]
const SYMBOL_NAMESPACE: Uuid = Uuid::from_u128(0x6b69_7761_7379_4d62_8000_0000_0000_0000);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A punctuation mark or pair that can be put on the clipboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SymbolRecord")]
pub struct Symbol {
    pub id: SymbolId,
    pub opening: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub slot_number: u8,
}

impl Symbol {
    pub fn new(
        id: SymbolId,
        opening: impl Into<String>,
        closing: Option<&str>,
        label: impl Into<String>,
        slot_number: u8,
    ) -> Self {
        Self {
            id,
            opening: opening.into(),
            closing: closing.map(str::to_string),
            label: label.into(),
            usage: None,
            slot_number,
        }
    }

    /// True when a non-empty closing half exists.
    pub fn is_paired(&self) -> bool {
        self.closing.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// The literal text written to the clipboard.
    pub fn display_text(&self) -> String {
        match self.closing.as_deref() {
            Some(closing) if !closing.is_empty() => format!("{}{}", self.opening, closing),
            _ => self.opening.clone(),
        }
    }
}

/// On-disk shape of a symbol; `id` is optional.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolRecord {
    #[serde(default)]
    id: Option<SymbolId>,
    opening: String,
    #[serde(default)]
    closing: Option<String>,
    label: String,
    #[serde(default)]
    usage: Option<String>,
    slot_number: u8,
}

impl From<SymbolRecord> for Symbol {
    fn from(record: SymbolRecord) -> Self {
        let id = record.id.unwrap_or_else(|| {
            SymbolId::derived(record.slot_number, &record.opening, record.closing.as_deref())
        });
        Self {
            id,
            opening: record.opening,
            closing: record.closing,
            label: record.label,
            usage: record.usage,
            slot_number: record.slot_number,
        }
    }
}

/// The active, slot-ordered symbol list.
///
/// Read-only for the duration of a panel session; [`SymbolCatalog::replace`]
/// swaps in a new snapshot when the configuration changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
}

impl SymbolCatalog {
    pub fn new(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|s| s.slot_number);
        Self { symbols }
    }

    /// Symbols in ascending slot order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbol_for_slot(&self, slot: u8) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.slot_number == slot)
    }

    /// Replace the snapshot. Returns `true` when the ordered contents changed.
    pub fn replace(&mut self, symbols: Vec<Symbol>) -> bool {
        let next = Self::new(symbols);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }
}

/// Built-in presets in slot order.
pub fn default_symbols() -> Vec<Symbol> {
    vec![
        Symbol::new(SymbolId::preset(1), "「", Some("」"), "Paper", 1),
        Symbol::new(SymbolId::preset(2), "『", Some("』"), "Book", 2),
        Symbol::new(SymbolId::preset(3), "〈", Some("〉"), "Work", 3),
        Symbol::new(SymbolId::preset(4), "《", Some("》"), "Film", 4),
        Symbol::new(SymbolId::preset(5), "\u{201C}", Some("\u{201D}"), "Quote", 5),
        Symbol::new(SymbolId::preset(6), "'", Some("'"), "Emphasis", 6),
        Symbol::new(SymbolId::preset(7), "\u{2014}", None, "Em dash", 7),
        Symbol::new(SymbolId::preset(8), "\u{00B7}", None, "Middle dot", 8),
        Symbol::new(SymbolId::preset(9), "\u{2026}\u{2026}", None, "Ellipsis", 9),
    ]
}
