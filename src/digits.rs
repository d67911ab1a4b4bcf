//! Digit sequence provider.
//!
//! A fixed, immutable view over the characters of π. Indices are expected in
//! `[0, len - 1]`; out-of-bounds access is a programming error, so callers
//! clamp rather than probe for failures.

/// Ordered sequence of single characters drawn from `{0-9, '.'}`, fixed for
/// the lifetime of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigitSequence {
    text: String,
}

impl DigitSequence {
    /// Build a sequence from raw text. Only `[0-9.]` characters are valid.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        debug_assert!(
            text.chars().all(|c| c.is_ascii_digit() || c == '.'),
            "digit sequence may only contain [0-9.]"
        );
        Self { text }
    }

    /// The canonical sequence: "3." plus 1000 decimal places.
    pub fn pi() -> Self {
        Self::new(crate::PI_DIGITS)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Largest valid index; navigation and advancement clamp against this.
    pub fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Character at `index`. The sequence is ASCII by construction, so byte
    /// indexing is character indexing.
    pub fn digit_at(&self, index: usize) -> char {
        self.text.as_bytes()[index] as char
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
