//! Source locations attached to tokens, AST nodes and diagnostics.

use std::fmt;

/// A span of source code, anchored at its first character.
///
/// Lines and columns are 1-indexed; columns count bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// A zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Extend `self` so it also covers `other`.
    ///
    /// Spans on different lines keep the start of `self` and add the lengths,
    /// which is enough for caret rendering of the first line.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                line: self.line,
                col: self.col,
                len: self.len + other.len,
            }
        }
    }

    /// The `(line L, column C)` suffix used by every user-facing message.
    pub fn location(&self) -> String {
        format!("(line {}, column {})", self.line, self.col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
