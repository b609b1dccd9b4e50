// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Raw Token Peeking
//!
//! A minimal preprocessor view over the main-file buffer: just enough raw
//! lexing to extend statement ranges over trailing comments and semicolons,
//! and to spot an upcoming preprocessor directive. This intentionally does
//! not tokenize C/C++; it only distinguishes whitespace, the two comment
//! forms, `;` and `#`.

/// Byte offset of the first non-whitespace byte at or after `offset`.
#[must_use]
pub fn skip_whitespace(source: &str, offset: u32) -> u32 {
    let bytes = source.as_bytes();
    let mut pos = offset as usize;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos as u32
}

/// If a comment starts at `offset`, the offset one past its end.
///
/// An unterminated block comment extends to the end of the buffer, matching
/// how a raw lexer would recover.
#[must_use]
pub fn comment_end(source: &str, offset: u32) -> Option<u32> {
    let bytes = source.as_bytes();
    let pos = offset as usize;
    if pos + 1 >= bytes.len() || bytes[pos] != b'/' {
        return None;
    }
    match bytes[pos + 1] {
        b'/' => {
            let end = source[pos..]
                .find('\n')
                .map_or(bytes.len(), |newline| pos + newline);
            Some(end as u32)
        }
        b'*' => {
            let end = source[pos + 2..]
                .find("*/")
                .map_or(bytes.len(), |close| pos + 2 + close + 2);
            Some(end as u32)
        }
        _ => None,
    }
}

/// Extends `end` over any run of comments (and the whitespace before them).
/// Returns the new end and whether at least one comment was crossed.
#[must_use]
pub fn extend_over_comments(source: &str, end: u32) -> (u32, bool) {
    let mut current = end;
    let mut extended = false;
    loop {
        let next = skip_whitespace(source, current);
        match comment_end(source, next) {
            Some(comment_close) => {
                current = comment_close;
                extended = true;
            }
            None => return (current, extended),
        }
    }
}

/// Extends `end` over a single following semicolon, if the next token is one.
#[must_use]
pub fn extend_over_semicolon(source: &str, end: u32) -> (u32, bool) {
    let next = skip_whitespace(source, end);
    if source.as_bytes().get(next as usize) == Some(&b';') {
        (next + 1, true)
    } else {
        (end, false)
    }
}

/// True when the next non-whitespace byte after `end` is `#`, the start of a
/// preprocessor directive.
#[must_use]
pub fn next_token_is_hash(source: &str, end: u32) -> bool {
    let next = skip_whitespace(source, end);
    source.as_bytes().get(next as usize) == Some(&b'#')
}
