// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Source Locations and Ranges
//!
//! Byte-offset based positions over the main file, a line index for
//! offset-to-line/column resolution, and the snippet record attached to every
//! reported mutation.
//!
//! All ranges are half-open `[begin, end)` byte ranges. The frontend is
//! responsible for mapping parser token ranges (which typically end at the
//! *start* of the last token) into this form before handing the AST over.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[begin, end)` byte range over the main-file source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: u32,
    pub end: u32,
}

impl SourceRange {
    #[must_use]
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.begin)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// A parser quirk (seen around structured bindings) can produce ranges
    /// that end before they start. Such ranges must not be mutated.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.begin <= self.end
    }

    #[must_use]
    pub fn contains(&self, other: Self) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.begin as usize..self.end as usize]
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to 1-based line/column positions.
///
/// Columns are byte columns, matching the spelling columns a C compiler
/// reports for ASCII-dominated source.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insertion) => insertion - 1,
        };
        Position {
            line: line as u32 + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

const SNIP_TEXT: &str = " ... [snip] ... ";
const SNIPPET_LENGTH_EACH_SIDE: usize = 10;

/// Line/column bounds and a short snippet for a mutated source range.
///
/// The snippet is the verbatim text when it is at most
/// `2 * SNIPPET_LENGTH_EACH_SIDE + SNIP_TEXT.len()` characters, otherwise the
/// first and last ten characters around a `[snip]` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRangeInfo {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub snippet: String,
}

impl SourceRangeInfo {
    #[must_use]
    pub fn new(range: SourceRange, source: &str, line_index: &LineIndex) -> Self {
        let start = line_index.position(range.begin);
        let end = line_index.position(range.end);
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            snippet: snip(range.text(source)),
        }
    }
}

fn snip(text: &str) -> String {
    let min_snipped_length = SNIP_TEXT.len() + 2 * SNIPPET_LENGTH_EACH_SIDE;
    let char_count = text.chars().count();
    if char_count <= min_snipped_length {
        return text.to_string();
    }
    let head: String = text.chars().take(SNIPPET_LENGTH_EACH_SIDE).collect();
    let tail_start = char_count - SNIPPET_LENGTH_EACH_SIDE;
    let tail: String = text.chars().skip(tail_start).collect();
    format!("{head}{SNIP_TEXT}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_positions() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.position(0), Position { line: 1, column: 1 });
        assert_eq!(index.position(1), Position { line: 1, column: 2 });
        assert_eq!(index.position(3), Position { line: 2, column: 1 });
        assert_eq!(index.position(6), Position { line: 3, column: 1 });
        assert_eq!(index.position(8), Position { line: 4, column: 2 });
    }

    #[test]
    fn short_snippet_is_verbatim() {
        let source = "void foo() { 1 + 2; }";
        let index = LineIndex::new(source);
        let info = SourceRangeInfo::new(SourceRange::new(13, 19), source, &index);
        assert_eq!(info.snippet, "1 + 2;");
        assert_eq!(info.start_line, 1);
        assert_eq!(info.start_column, 14);
        assert_eq!(info.end_column, 20);
    }

    #[test]
    fn long_snippet_is_snipped() {
        let text: String = "abcdefghijKLMNOPQRSTUVWXYZ0123456789uvwxyz".to_string();
        assert_eq!(text.len(), 42);
        let snipped = snip(&text);
        assert_eq!(snipped, "abcdefghij ... [snip] ... 6789uvwxyz");
    }

    #[test]
    fn boundary_snippet_lengths() {
        // Exactly 36 characters: kept verbatim.
        let text: String = "a".repeat(36);
        assert_eq!(snip(&text), text);
        let text: String = "a".repeat(37);
        assert_eq!(snip(&text).len(), 36);
    }
}
