//! Source positions attached to syntax nodes and diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed). Zero in a dump means "same as start".
    #[serde(default)]
    pub end_line: usize,
    /// End column (1-indexed).
    #[serde(default)]
    pub end_col: usize,
}

impl Span {
    /// Whether `other` covers exactly the same bytes.
    pub fn same_range(&self, other: &Span) -> bool {
        self.start_byte == other.start_byte && self.end_byte == other.end_byte
    }

    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A span inside a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.span.start_line
    }

    pub fn column(&self) -> usize {
        self.span.start_col
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.span)
    }
}
