// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Nested-Insertion Text Rewriter
//!
//! A rewrite buffer over one main-file source, built for the engine's
//! pre-order application pass: an outer construct is wrapped first, and
//! rewrites that wrap its children are issued later, targeting the original
//! byte offsets throughout.
//!
//! ## Edit model
//!
//! - [`Rewriter::insert_before`] attaches text to the *right* of an offset:
//!   it precedes the source byte at that offset. Same-offset before-insertions
//!   replay in issue order, so the first (outermost) wrapper stays leftmost.
//! - [`Rewriter::insert_after`] attaches text to the *left* of an offset: it
//!   follows the source text ending there ("after the last token" of a
//!   half-open range). Same-offset after-insertions replay newest-first, so
//!   the first (outermost) wrapper stays rightmost.
//! - [`Rewriter::replace`] is single-shot: replacing two overlapping ranges
//!   is a programming error and reported as a conflict. Insertions may sit on
//!   a replaced range's boundaries but not strictly inside it.
//!
//! At one offset the output order is: after-insertions, before-insertions,
//! then (if a replacement starts here) the replacement text.

use graft_ast::SourceRange;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Two `replace` calls covered overlapping ranges.
    #[error("overlapping replacement: {existing} already replaced, {requested} requested")]
    OverlappingReplacement {
        existing: SourceRange,
        requested: SourceRange,
    },

    /// An insertion landed strictly inside a replaced range, so there is no
    /// position for it in the output.
    #[error("insertion at offset {offset} falls inside replaced range {range}")]
    InsertionInsideReplacement { offset: u32, range: SourceRange },

    /// An edit referred to offsets beyond the underlying buffer.
    #[error("edit at {range} is out of bounds for a buffer of {buffer_len} bytes")]
    OutOfBounds {
        range: SourceRange,
        buffer_len: u32,
    },
}

pub type Result<T> = std::result::Result<T, RewriteError>;

#[derive(Debug, Default)]
struct InsertionsAt {
    before: SmallVec<[String; 2]>,
    after: SmallVec<[String; 2]>,
}

/// A rewrite buffer: the original source plus an edit log, materialized once
/// by [`Rewriter::rewritten_text`].
#[derive(Debug)]
pub struct Rewriter<'s> {
    source: &'s str,
    insertions: BTreeMap<u32, InsertionsAt>,
    /// Keyed by begin offset; non-overlap is enforced on insertion.
    replacements: BTreeMap<u32, (SourceRange, String)>,
    edit_count: usize,
}

impl<'s> Rewriter<'s> {
    #[must_use]
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            insertions: BTreeMap::new(),
            replacements: BTreeMap::new(),
            edit_count: 0,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &'s str {
        self.source
    }

    #[must_use]
    pub const fn has_edits(&self) -> bool {
        self.edit_count > 0
    }

    fn check_offset(&self, range: SourceRange) -> Result<()> {
        let buffer_len = self.source.len() as u32;
        if range.end > buffer_len || range.begin > buffer_len {
            return Err(RewriteError::OutOfBounds { range, buffer_len });
        }
        Ok(())
    }

    /// Inserts `text` immediately before the source byte at `offset`.
    pub fn insert_before(&mut self, offset: u32, text: impl Into<String>) -> Result<()> {
        self.check_offset(SourceRange::new(offset, offset))?;
        self.insertions
            .entry(offset)
            .or_default()
            .before
            .push(text.into());
        self.edit_count += 1;
        Ok(())
    }

    /// Inserts `text` immediately after the source text ending at `offset`
    /// (the "after the last token" position of a half-open range).
    pub fn insert_after(&mut self, offset: u32, text: impl Into<String>) -> Result<()> {
        self.check_offset(SourceRange::new(offset, offset))?;
        self.insertions
            .entry(offset)
            .or_default()
            .after
            .push(text.into());
        self.edit_count += 1;
        Ok(())
    }

    /// Replaces `range` with `text`. Overlapping replacements conflict.
    pub fn replace(&mut self, range: SourceRange, text: impl Into<String>) -> Result<()> {
        self.check_offset(range)?;
        // The nearest replacement starting at or before this one, and the
        // first starting after it, are the only overlap candidates.
        if let Some((_, (existing, _))) = self.replacements.range(..=range.begin).next_back() {
            if existing.end > range.begin && !range.is_empty() && !existing.is_empty() {
                return Err(RewriteError::OverlappingReplacement {
                    existing: *existing,
                    requested: range,
                });
            }
        }
        if let Some((_, (existing, _))) = self.replacements.range(range.begin..).next() {
            if existing.begin < range.end {
                return Err(RewriteError::OverlappingReplacement {
                    existing: *existing,
                    requested: range,
                });
            }
        }
        self.replacements.insert(range.begin, (range, text.into()));
        self.edit_count += 1;
        Ok(())
    }

    /// Materializes the rewritten buffer.
    pub fn rewritten_text(&self) -> Result<String> {
        // Insertions strictly inside a replaced range have nowhere to go.
        for (&offset, _) in &self.insertions {
            if let Some((_, (range, _))) = self.replacements.range(..offset).next_back() {
                if offset < range.end && offset > range.begin {
                    return Err(RewriteError::InsertionInsideReplacement {
                        offset,
                        range: *range,
                    });
                }
            }
        }

        let mut output = String::with_capacity(self.source.len());
        let mut cursor = 0u32;
        let mut boundaries: Vec<u32> = self.insertions.keys().copied().collect();
        boundaries.extend(self.replacements.keys().copied());
        boundaries.sort_unstable();
        boundaries.dedup();

        for boundary in boundaries {
            if boundary > cursor {
                output.push_str(&self.source[cursor as usize..boundary as usize]);
                cursor = boundary;
            }
            if let Some(at) = self.insertions.get(&boundary) {
                for text in at.after.iter().rev() {
                    output.push_str(text);
                }
                for text in &at.before {
                    output.push_str(text);
                }
            }
            if let Some((range, text)) = self.replacements.get(&boundary) {
                output.push_str(text);
                cursor = range.end;
            }
        }
        output.push_str(&self.source[cursor as usize..]);
        Ok(output)
    }
}
