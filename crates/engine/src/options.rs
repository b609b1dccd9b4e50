// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Engine options.

/// Behavioural switches for one engine run.
///
/// Only `optimise_mutations` and `only_track_mutant_coverage` affect the
/// rewritten output; the other two are debugging aids.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Apply the redundancy filters that suppress mutants which are highly
    /// likely to be equivalent to other mutants or to the original program.
    pub optimise_mutations: bool,

    /// Instrument for mutant-coverage tracking instead of mutant selection.
    pub only_track_mutant_coverage: bool,

    /// Dump each translation unit's AST to stderr before mutating.
    pub dump_asts: bool,

    /// Log the AST node kind for every mutation added.
    pub show_ast_node_types: bool,
}

impl Options {
    #[must_use]
    pub const fn new(optimise_mutations: bool, only_track_mutant_coverage: bool) -> Self {
        Self {
            optimise_mutations,
            only_track_mutant_coverage,
            dump_asts: false,
            show_ast_node_types: false,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(true, false)
    }
}
