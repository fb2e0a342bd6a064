//! Symbol insertion: puts a symbol's text on the system clipboard.
//!
//! Insertion is total. Clipboard failures are logged and swallowed; focus
//! restoration is left to the caller.

use arboard::Clipboard;
use tracing::{debug, info, warn};

use crate::error::{KiwaError, Result};
use crate::symbols::Symbol;

/// Single-slot clipboard; every write replaces the whole contents.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard via `arboard`.
///
/// The handle is opened lazily and re-opened after a failed write.
#[derive(Default)]
pub struct ArboardClipboard {
    clipboard: Option<Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardWriter for ArboardClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().map_err(|e| KiwaError::Clipboard(e.to_string()))?,
        };
        clipboard
            .set_text(text)
            .map_err(|e| KiwaError::Clipboard(e.to_string()))?;
        self.clipboard = Some(clipboard);
        Ok(())
    }
}

pub struct SymbolInsertionService {
    clipboard: Box<dyn ClipboardWriter>,
}

impl SymbolInsertionService {
    pub fn new(clipboard: Box<dyn ClipboardWriter>) -> Self {
        Self { clipboard }
    }

    /// Replace the clipboard with `symbol.display_text()`.
    ///
    /// Paired symbols are written as opening + closing; the cursor ends up
    /// after the closing half once pasted. Returns whether the write succeeded.
    pub fn insert(&mut self, symbol: &Symbol) -> bool {
        let text = symbol.display_text();
        match self.clipboard.write_text(&text) {
            Ok(()) => {
                info!(
                    slot = symbol.slot_number,
                    label = %symbol.label,
                    paired = symbol.is_paired(),
                    "Symbol copied to clipboard"
                );
                debug!(text = %text, "Clipboard contents replaced");
                true
            }
            Err(e) => {
                warn!(slot = symbol.slot_number, error = %e, "Clipboard write failed");
                false
            }
        }
    }
}
