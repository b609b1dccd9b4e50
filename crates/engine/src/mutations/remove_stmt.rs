// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Statement removal.
//!
//! A statement `S` becomes `if (!__dredd_enabled_mutation(ID)) { S }`, so the
//! statement runs unless the mutant is enabled. The wrapped range is extended
//! past trailing comments and, when the next token is a semicolon, past that
//! semicolon, so the conditional encloses a complete statement.

use super::ApplyContext;
use graft_ast::{scan, LineIndex, SourceRange, SourceRangeInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveStmt {
    /// The statement's own range; reported range info comes from this.
    pub range: SourceRange,
    /// Range after comment and semicolon extension; this is what gets
    /// wrapped.
    pub extended_range: SourceRange,
    pub extended_with_comment: bool,
    pub extended_with_semi: bool,
    /// The token after the extended range is `#` and no semicolon was
    /// swallowed: the statement is separated from its semicolon by a
    /// preprocessor directive.
    pub next_token_is_hash: bool,
    pub info: SourceRangeInfo,
}

impl RemoveStmt {
    #[must_use]
    pub fn new(range: SourceRange, source: &str, line_index: &LineIndex) -> Self {
        let (after_comments, extended_with_comment) = scan::extend_over_comments(source, range.end);
        let (extended_end, extended_with_semi) = scan::extend_over_semicolon(source, after_comments);
        let next_token_is_hash =
            !extended_with_semi && scan::next_token_is_hash(source, extended_end);
        Self {
            range,
            extended_range: SourceRange::new(range.begin, extended_end),
            extended_with_comment,
            extended_with_semi,
            next_token_is_hash,
            info: SourceRangeInfo::new(range, source, line_index),
        }
    }

    pub(super) fn apply(&self, cx: &mut ApplyContext) -> graft_rewrite::Result<()> {
        let local_id = cx.local_id();
        if cx.options.only_track_mutant_coverage {
            cx.rewriter.insert_before(
                self.extended_range.begin,
                format!("__dredd_record_covered_mutants({local_id}, 1); "),
            )?;
        } else {
            cx.rewriter.insert_before(
                self.extended_range.begin,
                format!("if (!__dredd_enabled_mutation({local_id})) {{ "),
            )?;
            let mut to_insert = " }".to_string();
            if !self.extended_with_semi && self.next_token_is_hash {
                // The statement is separated from its semicolon by a
                // preprocessor directive; a conservative semicolon keeps the
                // conditional well-formed.
                to_insert = format!("; {to_insert}");
            }
            if self.extended_with_comment && !self.extended_with_semi {
                // The range may end on the same line as a single-line
                // comment; without a newline the closing brace would become
                // part of the comment.
                to_insert = format!("\n{to_insert}");
            }
            cx.rewriter.insert_after(self.extended_range.end, to_insert)?;
        }
        *cx.next_id += 1;
        Ok(())
    }
}
