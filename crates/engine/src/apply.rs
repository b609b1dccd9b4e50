// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Per-Unit Application Pass
//!
//! Runs the visitor over one translation unit, then walks the tidied
//! mutation tree in pre-order: each descriptor claims a contiguous block of
//! ids and issues its rewrites, outermost constructs first, so nested
//! wrappers compose through the rewriter's insertion ordering. Afterwards the
//! recorded constant contexts are rewritten to literal values and the
//! prelude is inserted.

use crate::error::{EngineError, Result};
use crate::info::MutationIdTreeNode;
use crate::mutations::{ApplyContext, DeclSet};
use crate::options::Options;
use crate::prelude::build_prelude;
use crate::tree::{MutationTree, TreeNodeId};
use crate::visitor::MutateVisitor;
use graft_ast::{Node, NodeId, TranslationUnit};
use graft_rewrite::Rewriter;

/// The rewritten form of one translation unit.
#[derive(Debug)]
pub struct MutatedUnit {
    pub filename: String,
    pub rewritten_source: String,
    pub mutation_id_tree: MutationIdTreeNode,
    /// Number of mutation ids consumed by this unit.
    pub mutation_count: u32,
}

/// Mutates one translation unit. `first_mutation_id` is the global counter
/// value at which this unit's id block starts.
pub fn mutate_unit(
    unit: &TranslationUnit,
    options: &Options,
    first_mutation_id: u32,
) -> Result<MutatedUnit> {
    if unit.has_errors() {
        return Err(EngineError::ParseFailed {
            filename: unit.filename.clone(),
        });
    }
    if options.dump_asts {
        eprintln!("AST for {}:\n{}", unit.filename, dump_ast(unit));
    }

    let outcome = MutateVisitor::visit(unit, options);
    let mut rewriter = Rewriter::new(&unit.source);
    let mut declarations = DeclSet::default();
    let mut macros = DeclSet::default();
    let mut next_id = first_mutation_id;
    let mut id_tree = MutationIdTreeNode::default();

    let conflict = |source| EngineError::RewriteConflict {
        filename: unit.filename.clone(),
        source,
    };

    {
        let mut cx = ApplyContext {
            lang: unit.lang,
            options,
            first_id_in_file: first_mutation_id,
            next_id: &mut next_id,
            rewriter: &mut rewriter,
            declarations: &mut declarations,
            macros: &mut macros,
        };
        apply_tree(&outcome.tree, MutationTree::ROOT, &mut cx, &mut id_tree)
            .map_err(conflict)?;
    }

    let mutation_count = next_id - first_mutation_id;
    if mutation_count > 0 {
        for &expr_id in outcome
            .constant_arguments
            .iter()
            .chain(&outcome.constant_sized_arrays)
        {
            rewrite_to_constant(unit, expr_id, &mut rewriter).map_err(conflict)?;
        }
        for &condition_id in &outcome.static_assertions {
            let condition = unit.ast.node(condition_id);
            if let Some(range) = condition.range() {
                rewriter.replace(range, "1").map_err(conflict)?;
            }
        }
        let prelude = build_prelude(unit.lang, options, &macros, &declarations);
        rewriter
            .insert_before(outcome.prelude_start, prelude)
            .map_err(conflict)?;
    }

    let rewritten_source = rewriter.rewritten_text().map_err(conflict)?;
    Ok(MutatedUnit {
        filename: unit.filename.clone(),
        rewritten_source,
        mutation_id_tree: id_tree,
        mutation_count,
    })
}

fn apply_tree(
    tree: &MutationTree,
    node: TreeNodeId,
    cx: &mut ApplyContext,
    out: &mut MutationIdTreeNode,
) -> graft_rewrite::Result<()> {
    for mutation in &tree.node(node).mutations {
        let ids = mutation.apply(cx)?;
        out.ids.extend(ids);
    }
    for &child in &tree.node(node).children {
        let mut child_out = MutationIdTreeNode::default();
        apply_tree(tree, child, cx, &mut child_out)?;
        out.children.push(child_out);
    }
    Ok(())
}

/// Replaces a recorded constant-context expression by the value the parser's
/// evaluator assigned to it.
fn rewrite_to_constant(
    unit: &TranslationUnit,
    expr_id: NodeId,
    rewriter: &mut Rewriter,
) -> graft_rewrite::Result<()> {
    let expr = unit.ast.node(expr_id);
    let (Some(range), Some(info)) = (expr.range(), expr.expr()) else {
        return Ok(());
    };
    match info.value {
        Some(value) => rewriter.replace(range, value.literal_text()),
        None => {
            log::debug!(
                "{}: constant context at {} has no evaluated value; leaving as written",
                unit.filename,
                range
            );
            Ok(())
        }
    }
}

fn dump_ast(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    dump_node(unit.ast.root(), 0, &mut out);
    out
}

fn dump_node(node: Node, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.kind().name());
    if let Some(range) = node.range() {
        out.push_str(&format!(" {range}"));
    }
    if let Some(info) = node.expr() {
        if let Some(builtin) = info.ty.as_builtin() {
            out.push_str(&format!(" '{}'", builtin.name(true)));
        }
        if info.is_lvalue() {
            out.push_str(" lvalue");
        }
    }
    out.push('\n');
    for child in node.children() {
        dump_node(child, depth + 1, out);
    }
}
