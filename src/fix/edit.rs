//! Byte-offset text edits against a source file.

use std::fmt;

use serde::Serialize;

/// Replace `start..end` of a file's text with `replacement`.
///
/// An insertion has `start == end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.into(),
        }
    }

    /// Apply to `text`. `None` if the range is out of bounds or splits a character.
    pub fn apply(&self, text: &str) -> Option<String> {
        if self.start > self.end
            || self.end > text.len()
            || !text.is_char_boundary(self.start)
            || !text.is_char_boundary(self.end)
        {
            return None;
        }
        let mut out = String::with_capacity(text.len() + self.replacement.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.replacement);
        out.push_str(&text[self.end..]);
        Some(out)
    }
}

impl fmt::Display for TextEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "insert {:?} at byte {}", self.replacement, self.start)
        } else {
            write!(
                f,
                "replace bytes {}..{} with {:?}",
                self.start, self.end, self.replacement
            )
        }
    }
}
