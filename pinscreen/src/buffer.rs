//! Bounded PIN accumulation buffer.
//!
//! The buffer stores one entry per accepted key press, so a multi-character
//! key value still counts as a single symbol. Removed or cleared symbols are
//! wiped from memory with [`zeroize`], and the `Debug` representation only
//! reveals the length.

use std::fmt;

use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

/// Default maximum number of PIN symbols.
pub const DEFAULT_PIN_LENGTH: usize = 5;

/// Ordered, bounded sequence of entered symbols.
pub struct PinBuffer {
    symbols: Zeroizing<Vec<String>>,
    max_length: usize,
}

impl PinBuffer {
    /// Creates an empty buffer holding at most `max_length` symbols.
    ///
    /// A `max_length` of zero is raised to one; configuration validates
    /// this earlier, so the clamp only guards direct construction.
    pub fn new(max_length: usize) -> Self {
        let max_length = max_length.max(1);
        Self {
            symbols: Zeroizing::new(Vec::with_capacity(max_length)),
            max_length,
        }
    }

    /// Maximum number of symbols this buffer accepts.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of symbols currently entered.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` when nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns `true` when the buffer holds `max_length` symbols.
    pub fn is_full(&self) -> bool {
        self.symbols.len() >= self.max_length
    }

    /// Appends a symbol. Returns `false` (and leaves the buffer unchanged)
    /// when the buffer is already full.
    pub fn push(&mut self, symbol: &str) -> bool {
        if self.is_full() {
            return false;
        }
        self.symbols.push(symbol.to_owned());
        true
    }

    /// Removes the last symbol. Returns `false` when the buffer was empty.
    pub fn pop(&mut self) -> bool {
        match self.symbols.pop() {
            Some(mut symbol) => {
                symbol.zeroize();
                true
            }
            None => false,
        }
    }

    /// Wipes every symbol.
    pub fn clear(&mut self) {
        self.symbols.zeroize();
    }

    /// Returns the concatenated value. The returned string is wiped on drop.
    pub fn value(&self) -> Zeroizing<String> {
        let mut out = String::with_capacity(self.symbols.iter().map(String::len).sum());
        for symbol in self.symbols.iter() {
            out.push_str(symbol);
        }
        Zeroizing::new(out)
    }

    /// Replaces the contents with the characters of `value`, one symbol per
    /// character. `None` empties the buffer. Extra characters beyond
    /// `max_length` are dropped.
    ///
    /// Returns the number of characters that were discarded.
    pub fn reset_from(&mut self, value: Option<&str>) -> usize {
        self.clear();
        let Some(value) = value else {
            return 0;
        };

        let mut dropped = 0;
        for ch in value.chars() {
            if self.is_full() {
                dropped += 1;
                continue;
            }
            self.symbols.push(ch.to_string());
        }

        if dropped > 0 {
            warn!(
                max_length = self.max_length,
                dropped, "External PIN value exceeded maximum length; truncated"
            );
        }
        dropped
    }
}

impl fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinBuffer")
            .field("len", &self.symbols.len())
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl Default for PinBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PIN_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_stops_at_max_length() {
        let mut buffer = PinBuffer::new(3);
        assert!(buffer.push("1"));
        assert!(buffer.push("2"));
        assert!(buffer.push("3"));
        assert!(!buffer.push("4"));
        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());
        assert_eq!(buffer.value().as_str(), "123");
    }

    #[test]
    fn pop_on_empty_is_noop() {
        let mut buffer = PinBuffer::new(4);
        assert!(!buffer.pop());
        assert!(buffer.is_empty());
    }

    #[test]
    fn pop_removes_last_symbol() {
        let mut buffer = PinBuffer::new(4);
        buffer.push("1");
        buffer.push("2");
        assert!(buffer.pop());
        buffer.push("3");
        assert_eq!(buffer.value().as_str(), "13");
    }

    #[test]
    fn multi_character_symbol_counts_once() {
        let mut buffer = PinBuffer::new(2);
        assert!(buffer.push("ab"));
        assert!(buffer.push("c"));
        assert!(!buffer.push("d"));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.value().as_str(), "abc");
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buffer = PinBuffer::new(4);
        buffer.push("9");
        buffer.push("9");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.value().as_str(), "");
    }

    #[test]
    fn reset_from_none_empties() {
        let mut buffer = PinBuffer::new(4);
        buffer.push("1");
        assert_eq!(buffer.reset_from(None), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn reset_from_truncates_long_values() {
        let mut buffer = PinBuffer::new(4);
        assert_eq!(buffer.reset_from(Some("123456")), 2);
        assert_eq!(buffer.value().as_str(), "1234");
    }

    #[test]
    fn reset_from_splits_characters() {
        let mut buffer = PinBuffer::new(5);
        buffer.reset_from(Some("42"));
        assert_eq!(buffer.len(), 2);
        assert!(buffer.pop());
        assert_eq!(buffer.value().as_str(), "4");
    }

    #[test]
    fn zero_max_length_is_raised_to_one() {
        let buffer = PinBuffer::new(0);
        assert_eq!(buffer.max_length(), 1);
    }

    #[test]
    fn debug_does_not_leak_contents() {
        let mut buffer = PinBuffer::new(5);
        buffer.push("8");
        buffer.push("6");
        let debug = format!("{buffer:?}");
        assert!(debug.contains("len: 2"));
        assert!(!debug.contains('8'));
        assert!(!debug.contains('6'));
    }

    #[test]
    fn default_uses_five_symbols() {
        assert_eq!(PinBuffer::default().max_length(), DEFAULT_PIN_LENGTH);
    }
}
