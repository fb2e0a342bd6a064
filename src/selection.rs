//! Single-selection cursor over the slot-ordered symbol list.
//!
//! The list is passed into every call instead of being stored, so a
//! reloaded catalog can never leave the cursor pointing into a stale copy.
//! Movement never wraps.

use crate::symbols::{Symbol, SymbolId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selection: Option<SymbolId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<SymbolId> {
        self.selection
    }

    /// Select the lowest slot, or nothing when the list is empty.
    pub fn highlight_first(&mut self, symbols: &[Symbol]) {
        self.selection = symbols.iter().min_by_key(|s| s.slot_number).map(|s| s.id);
    }

    pub fn move_up(&mut self, symbols: &[Symbol]) {
        self.step(symbols, Direction::Up);
    }

    pub fn move_down(&mut self, symbols: &[Symbol]) {
        self.step(symbols, Direction::Down);
    }

    fn step(&mut self, symbols: &[Symbol], direction: Direction) {
        let ordered = ordered(symbols);
        let Some(current) = self.position_in(&ordered) else {
            // Lost or empty cursor: fall back to the first element
            self.highlight_first(symbols);
            return;
        };
        let next = match direction {
            Direction::Up => current.checked_sub(1),
            Direction::Down => Some(current + 1).filter(|&i| i < ordered.len()),
        };
        if let Some(idx) = next {
            self.selection = Some(ordered[idx].id);
        }
    }

    /// Select the symbol in `slot`; no-op if no symbol has that slot.
    pub fn select_slot(&mut self, symbols: &[Symbol], slot: u8) {
        if let Some(symbol) = symbols.iter().find(|s| s.slot_number == slot) {
            self.selection = Some(symbol.id);
        }
    }

    /// The selected symbol, resolved against the current list.
    pub fn commit(&self, symbols: &[Symbol]) -> Option<Symbol> {
        let id = self.selection?;
        symbols.iter().find(|s| s.id == id).cloned()
    }

    /// Re-apply the highlight-first policy if the selection no longer exists.
    /// Returns `true` when the selection changed.
    pub fn revalidate(&mut self, symbols: &[Symbol]) -> bool {
        let still_present = match self.selection {
            Some(id) => symbols.iter().any(|s| s.id == id),
            None => false,
        };
        if still_present {
            return false;
        }
        let before = self.selection;
        self.highlight_first(symbols);
        before != self.selection
    }

    fn position_in(&self, ordered: &[&Symbol]) -> Option<usize> {
        let id = self.selection?;
        ordered.iter().position(|s| s.id == id)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

fn ordered(symbols: &[Symbol]) -> Vec<&Symbol> {
    let mut ordered: Vec<&Symbol> = symbols.iter().collect();
    ordered.sort_by_key(|s| s.slot_number);
    ordered
}
