//! Key-display adapter for C3..C5.

use melodyviz_core::{is_black_key, note_name, KeyHighlighter, KEYBOARD_RANGE};
use std::collections::BTreeSet;
use tracing::debug;

/// Lit state of the displayed keys
#[derive(Debug, Default)]
pub struct KeyboardDisplay {
    lit: BTreeSet<u8>,
    changed: bool,
}

impl KeyboardDisplay {
    /// All keys dark
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key is lit
    pub fn is_lit(&self, note: u8) -> bool {
        self.lit.contains(&note)
    }

    /// Number of lit keys
    pub fn lit_count(&self) -> usize {
        self.lit.len()
    }

    /// True once after any highlight changed
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// One character per key: `-` white, `^` black, `#` lit
    pub fn render_line(&self) -> String {
        KEYBOARD_RANGE
            .map(|note| match (self.is_lit(note), is_black_key(note)) {
                (true, _) => '#',
                (false, true) => '^',
                (false, false) => '-',
            })
            .collect()
    }
}

impl KeyHighlighter for KeyboardDisplay {
    fn set_key_highlight(&mut self, note: u8, active: bool) {
        if !KEYBOARD_RANGE.contains(&note) {
            return;
        }
        let changed = if active {
            self.lit.insert(note)
        } else {
            self.lit.remove(&note)
        };
        if changed {
            debug!("Key {} {}", note_name(note), if active { "on" } else { "off" });
            self.changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_keys_are_ignored() {
        let mut keys = KeyboardDisplay::new();
        keys.set_key_highlight(30, true);
        keys.set_key_highlight(100, true);
        assert_eq!(keys.lit_count(), 0);
        assert!(!keys.take_changed());
    }

    #[test]
    fn test_highlight_and_release() {
        let mut keys = KeyboardDisplay::new();
        keys.set_key_highlight(60, true);
        assert!(keys.is_lit(60));
        assert!(keys.take_changed());
        assert!(!keys.take_changed());

        keys.set_key_highlight(60, false);
        assert!(!keys.is_lit(60));
        assert!(keys.take_changed());
    }

    #[test]
    fn test_render_line() {
        let mut keys = KeyboardDisplay::new();
        let line = keys.render_line();
        assert_eq!(line.chars().count(), 25);
        assert!(line.starts_with("-^-^--^-^-^-"));

        keys.set_key_highlight(48, true);
        assert!(keys.render_line().starts_with('#'));
    }
}
