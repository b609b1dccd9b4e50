// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Unary-operator replacement.
//!
//! The operator expression becomes a call to a dispatcher that evaluates the
//! operand and selects between the original operator and each admissible
//! alternative. R-value operands are passed by value; l-value operands are
//! passed as a reference-returning closure in C++ and by address in C, so
//! increments and decrements act on the original object.

use super::{dispatcher_body, space_to_underscore, ApplyContext};
use graft_ast::{BuiltinType, LangOptions, SourceRange, SourceRangeInfo, UnaryOpcode};

/// Candidate replacement operators, in emission order.
const CANDIDATES: [UnaryOpcode; 7] = [
    UnaryOpcode::PreInc,
    UnaryOpcode::PostInc,
    UnaryOpcode::PreDec,
    UnaryOpcode::PostDec,
    UnaryOpcode::Not,
    UnaryOpcode::Minus,
    UnaryOpcode::LNot,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceUnary {
    pub opcode: UnaryOpcode,
    pub expr_range: SourceRange,
    pub op_range: SourceRange,
    pub operand_range: SourceRange,
    pub operand_type: BuiltinType,
    pub result_type: BuiltinType,
    /// The whole operator expression yields an l-value (C++ prefix `++`/`--`).
    pub expr_is_lvalue: bool,
    pub operand_is_lvalue: bool,
    pub operand_is_volatile: bool,
    pub info: SourceRangeInfo,
}

impl ReplaceUnary {
    fn is_valid_replacement(&self, op: UnaryOpcode) -> bool {
        if op.is_increment_or_decrement() {
            // Increments and decrements need an object to modify and only
            // swap with the matching fixity.
            if !self.operand_is_lvalue
                || !self.opcode.is_increment_or_decrement()
                || op.is_prefix() != self.opcode.is_prefix()
            {
                return false;
            }
        }
        if self.expr_is_lvalue && !matches!(op, UnaryOpcode::PreInc | UnaryOpcode::PreDec) {
            // An l-value result can only come from another prefix
            // increment/decrement.
            return false;
        }
        if op == UnaryOpcode::Not && self.operand_type.is_floating() {
            return false;
        }
        true
    }

    fn arg_eval(&self, lang: LangOptions) -> &'static str {
        if self.operand_is_lvalue {
            if lang.is_cpp { "arg()" } else { "(*arg)" }
        } else {
            "arg"
        }
    }

    fn render(op: UnaryOpcode, eval: &str) -> String {
        if op.is_prefix() {
            format!("{}{eval}", op.spelling())
        } else {
            format!("{eval}{}", op.spelling())
        }
    }

    fn variants(&self, lang: LangOptions, optimise: bool) -> Vec<String> {
        let eval = self.arg_eval(lang);
        let mut variants = Vec::new();
        for op in CANDIDATES {
            if op == self.opcode || !self.is_valid_replacement(op) {
                continue;
            }
            variants.push(Self::render(op, eval));
        }
        // Dropping the operator entirely; with optimisations this only pays
        // off for increments and decrements, as the bare operand is otherwise
        // already covered by expression replacement.
        if !optimise || self.opcode.is_increment_or_decrement() {
            variants.push(eval.to_string());
        }
        if self.opcode == UnaryOpcode::LNot && self.result_type.is_boolean() {
            if lang.is_cpp {
                variants.push("true".to_string());
                variants.push("false".to_string());
            } else {
                variants.push("1".to_string());
                variants.push("0".to_string());
            }
        }
        variants
    }

    /// Dispatcher name; argument types (and volatility for l-values) are
    /// baked in to avoid ambiguous overloads.
    #[must_use]
    pub fn function_name(&self, lang: LangOptions) -> String {
        let mut qualified = String::new();
        if self.operand_is_lvalue && self.operand_is_volatile {
            qualified.push_str("volatile ");
        }
        qualified.push_str(self.operand_type.name(lang.is_cpp));
        format!(
            "__dredd_replace_unary_operator_{}_{}",
            self.opcode.name(),
            space_to_underscore(&qualified)
        )
    }

    fn modified_type(&self, base: BuiltinType, lang: LangOptions) -> String {
        let mut ty = String::new();
        if self.operand_is_volatile {
            ty.push_str("volatile ");
        }
        ty.push_str(base.name(lang.is_cpp));
        ty.push(if lang.is_cpp { '&' } else { '*' });
        ty
    }

    pub(super) fn apply(&self, cx: &mut ApplyContext) -> graft_rewrite::Result<()> {
        let lang = cx.lang;
        let name = self.function_name(lang);
        let input_type = self.operand_type.name(lang.is_cpp);
        let result_type = self.result_type.name(lang.is_cpp);

        let local_id = cx.local_id();
        // The call site: the operator token disappears and the operand turns
        // into the dispatcher argument.
        let (prefix, suffix) = if !self.operand_is_lvalue {
            (format!("{name}("), format!(", {local_id})"))
        } else if lang.is_cpp {
            let input_ref = self.modified_type(self.operand_type, lang);
            (
                format!("{name}([&]() -> {input_ref} {{ return static_cast<{input_ref}>("),
                format!("); }}, {local_id})"),
            )
        } else {
            (format!("{name}(&("), format!("), {local_id})"))
        };
        cx.rewriter.insert_before(self.expr_range.begin, prefix)?;
        cx.rewriter.replace(self.op_range, "")?;
        cx.rewriter.insert_after(self.expr_range.end, suffix)?;

        let variants = self.variants(lang, cx.options.optimise_mutations);
        let original = Self::render(self.opcode, self.arg_eval(lang));

        let return_type = if self.expr_is_lvalue && lang.is_cpp {
            self.modified_type(self.result_type, lang)
        } else {
            result_type.to_string()
        };
        let param = if !self.operand_is_lvalue {
            format!("{input_type} arg")
        } else if lang.is_cpp {
            format!("std::function<{}()> arg", self.modified_type(self.operand_type, lang))
        } else {
            format!("{} arg", self.modified_type(self.operand_type, lang))
        };

        let mut dispatcher = format!("static {return_type} {name}({param}, int local_mutation_id) {{\n");
        dispatcher.push_str(&dispatcher_body(cx.options, &variants, &original));
        dispatcher.push_str("}\n\n");
        cx.declarations.insert(dispatcher);

        *cx.next_id += variants.len() as u32;
        Ok(())
    }
}
