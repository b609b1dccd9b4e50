// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for the engine test suites: locating node ranges by
//! substring and applying a single mutation descriptor against a source
//! buffer, mirroring how the engine's application pass drives descriptors.

#![allow(dead_code)]

use graft_ast::{LangOptions, LineIndex, SourceRange, SourceRangeInfo};
use graft_engine::mutations::{ApplyContext, DeclSet};
use graft_engine::{Mutation, Options};
use graft_rewrite::Rewriter;

/// Range of the first occurrence of `fragment` in `source`.
pub fn loc(source: &str, fragment: &str) -> SourceRange {
    loc_nth(source, fragment, 0)
}

/// Range of the `nth` (0-based) occurrence of `fragment` in `source`.
pub fn loc_nth(source: &str, fragment: &str, nth: usize) -> SourceRange {
    let mut search_from = 0usize;
    for _ in 0..nth {
        let found = source[search_from..]
            .find(fragment)
            .unwrap_or_else(|| panic!("occurrence of {fragment:?} not found"));
        search_from += found + fragment.len();
    }
    let found = source[search_from..]
        .find(fragment)
        .unwrap_or_else(|| panic!("occurrence of {fragment:?} not found"));
    let begin = (search_from + found) as u32;
    SourceRange::new(begin, begin + fragment.len() as u32)
}

pub fn range_info(source: &str, range: SourceRange) -> SourceRangeInfo {
    SourceRangeInfo::new(range, source, &LineIndex::new(source))
}

pub struct Applied {
    pub rewritten: String,
    pub declarations: Vec<String>,
    pub macros: Vec<String>,
    pub id_count: u32,
}

/// Applies one descriptor with local id 0, the way the original unit tests
/// drive a single mutation.
pub fn apply_mutation(source: &str, is_cpp: bool, optimise: bool, mutation: &Mutation) -> Applied {
    apply_mutation_with(source, is_cpp, Options::new(optimise, false), mutation)
}

pub fn apply_mutation_with(
    source: &str,
    is_cpp: bool,
    options: Options,
    mutation: &Mutation,
) -> Applied {
    let mut rewriter = Rewriter::new(source);
    let mut declarations = DeclSet::default();
    let mut macros = DeclSet::default();
    let mut next_id = 0u32;
    {
        let mut cx = ApplyContext {
            lang: LangOptions { is_cpp },
            options: &options,
            first_id_in_file: 0,
            next_id: &mut next_id,
            rewriter: &mut rewriter,
            declarations: &mut declarations,
            macros: &mut macros,
        };
        mutation.apply(&mut cx).expect("rewrite failed");
    }
    Applied {
        rewritten: rewriter.rewritten_text().expect("rewrite failed"),
        declarations: declarations.iter().map(str::to_string).collect(),
        macros: macros.iter().map(str::to_string).collect(),
        id_count: next_id,
    }
}
