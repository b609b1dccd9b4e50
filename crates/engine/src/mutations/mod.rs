// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Mutation Catalog
//!
//! The four mutation families: statement removal, unary-operator replacement,
//! binary-operator replacement and expression replacement. A descriptor is
//! created during traversal, carrying everything it needs copied out of the
//! AST; applying it claims a contiguous block of mutation ids, issues its
//! call-site rewrites, and registers the dispatcher it relies on.
//!
//! Dispatchers are deduplicated by exact source-string equality, so two
//! mutations of the same shape share one dispatcher; dispatcher *names* are
//! chosen so that name equality implies body equality.

mod remove_stmt;
mod replace_binary;
mod replace_expr;
mod replace_unary;

pub use remove_stmt::RemoveStmt;
pub use replace_binary::{is_supported_opcode, ReplaceBinary};
pub use replace_expr::ReplaceExpr;
pub use replace_unary::ReplaceUnary;

use crate::options::Options;
use graft_ast::LangOptions;
use graft_rewrite::Rewriter;
use std::collections::HashSet;

/// Insertion-ordered set of generated declaration strings.
///
/// Only previously-unseen strings are kept, and the prelude emits them in
/// first-registration order so output stays deterministic.
#[derive(Debug, Default)]
pub struct DeclSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl DeclSet {
    pub fn insert(&mut self, declaration: String) {
        if self.seen.insert(declaration.clone()) {
            self.items.push(declaration);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

/// Mutable state threaded through the application pass.
pub struct ApplyContext<'a, 's> {
    pub lang: LangOptions,
    pub options: &'a Options,
    /// Subtracted from the global counter to obtain file-local ids.
    pub first_id_in_file: u32,
    /// The global mutation-id counter; each applied mutation advances it by
    /// the number of variants it exposes.
    pub next_id: &'a mut u32,
    pub rewriter: &'a mut Rewriter<'s>,
    /// Dispatcher function definitions for the prelude.
    pub declarations: &'a mut DeclSet,
    /// Helper macro definitions for the prelude (C logical dispatch).
    pub macros: &'a mut DeclSet,
}

impl ApplyContext<'_, '_> {
    #[must_use]
    pub fn local_id(&self) -> u32 {
        *self.next_id - self.first_id_in_file
    }
}

/// One mutation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    RemoveStmt(RemoveStmt),
    ReplaceUnary(ReplaceUnary),
    ReplaceBinary(ReplaceBinary),
    ReplaceExpr(ReplaceExpr),
}

impl Mutation {
    /// Applies the mutation: assigns its id block, rewrites the call site and
    /// registers dispatchers. Returns the ids consumed.
    pub fn apply(&self, cx: &mut ApplyContext) -> graft_rewrite::Result<std::ops::Range<u32>> {
        let lo = *cx.next_id;
        match self {
            Self::RemoveStmt(mutation) => mutation.apply(cx)?,
            Self::ReplaceUnary(mutation) => mutation.apply(cx)?,
            Self::ReplaceBinary(mutation) => mutation.apply(cx)?,
            Self::ReplaceExpr(mutation) => mutation.apply(cx)?,
        }
        Ok(lo..*cx.next_id)
    }

    #[must_use]
    pub fn info(&self) -> &graft_ast::SourceRangeInfo {
        match self {
            Self::RemoveStmt(mutation) => &mutation.info,
            Self::ReplaceUnary(mutation) => &mutation.info,
            Self::ReplaceBinary(mutation) => &mutation.info,
            Self::ReplaceExpr(mutation) => &mutation.info,
        }
    }
}

/// Spaces in type spellings become underscores in dispatcher names.
#[must_use]
pub(crate) fn space_to_underscore(input: &str) -> String {
    input.replace(' ', "_")
}

/// The fast-path line letting the common no-mutant case return immediately.
pub(crate) fn fast_path_line(original: &str) -> String {
    format!("  if (!__dredd_some_mutation_enabled) return {original};\n")
}

/// One `if (__dredd_enabled_mutation(...)) return ...;` line.
pub(crate) fn enabled_line(offset: usize, variant: &str) -> String {
    format!(
        "  if (__dredd_enabled_mutation(local_mutation_id + {offset})) return {variant};\n"
    )
}

/// Builds a dispatcher function body: fast path, one line per variant, and
/// the original computation last. Coverage mode records reachability instead.
pub(crate) fn dispatcher_body(
    options: &Options,
    variants: &[String],
    original: &str,
) -> String {
    let mut body = String::new();
    if options.only_track_mutant_coverage {
        body.push_str(&format!(
            "  __dredd_record_covered_mutants(local_mutation_id, {});\n",
            variants.len()
        ));
        body.push_str(&format!("  return {original};\n"));
        return body;
    }
    body.push_str(&fast_path_line(original));
    for (offset, variant) in variants.iter().enumerate() {
        body.push_str(&enabled_line(offset, variant));
    }
    body.push_str(&format!("  return {original};\n"));
    body
}
