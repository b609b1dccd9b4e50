// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Expression replacement.
//!
//! Wraps an expression in a dispatcher that can negate it, substitute small
//! constants, or (for l-values) increment and decrement it in place. The
//! dispatcher short-circuits through `__dredd_some_mutation_enabled` so the
//! common no-mutant path is a direct return.
//!
//! Boolean expressions rooted at `&&` or `||` additionally get the
//! "omit" variants: replacing an `&&` with literal `false` and an `||` with
//! literal `true`, which subsumes dropping either operand.

use super::{dispatcher_body, space_to_underscore, ApplyContext};
use graft_ast::{BinaryOpcode, BuiltinType, LangOptions, SourceRange, SourceRangeInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceExpr {
    pub expr_range: SourceRange,
    pub ty: BuiltinType,
    pub is_lvalue: bool,
    /// C++11 constant expression; the call-site `static_cast` is dropped and
    /// the dispatcher name records the distinction.
    pub is_constant: bool,
    /// Set when the expression is a logical `&&`/`||` at its root.
    pub logical_root: Option<BinaryOpcode>,
    pub info: SourceRangeInfo,
}

impl ReplaceExpr {
    /// The original computation inside the dispatcher. L-value dispatchers
    /// hand the l-value itself back (a reference in C++, the pointer in C)
    /// so the call site composes with enclosing by-reference rewrites.
    fn arg_eval(&self, lang: LangOptions) -> &'static str {
        if lang.is_cpp { "arg()" } else { "arg" }
    }

    fn variants(&self, lang: LangOptions, optimise: bool) -> Vec<String> {
        let eval = self.arg_eval(lang);
        let mut variants = Vec::new();
        if self.is_lvalue {
            if lang.is_cpp {
                variants.push(format!("++({eval})"));
                variants.push(format!("--({eval})"));
            } else {
                variants.push("(++(*arg), arg)".to_string());
                variants.push("(--(*arg), arg)".to_string());
            }
            return variants;
        }
        let ty = self.ty;
        // Variant selection may only depend on properties the dispatcher
        // name encodes (type, l-valueness, constancy, the logical root):
        // dispatchers are shared by name, so name equality must imply body
        // equality.
        if ty.is_integer() && !(optimise && (self.is_constant || self.logical_root.is_some())) {
            // Negating a constant yields another constant, already covered
            // below; negating a logical operator is covered by the omit
            // variants.
            variants.push(format!("!({eval})"));
        }
        if ty.is_integer() && !ty.is_boolean() {
            variants.push(format!("~({eval})"));
        }
        if ty.is_signed_integer() || ty.is_floating() {
            variants.push(format!("-({eval})"));
        }
        if ty.is_integer() && !ty.is_boolean() {
            variants.push("0".to_string());
            variants.push("1".to_string());
        }
        if ty.is_signed_integer() {
            variants.push("-1".to_string());
        }
        if ty.is_floating() {
            variants.push("0.0".to_string());
            variants.push("1.0".to_string());
            variants.push("-1.0".to_string());
        }
        match self.logical_root {
            Some(BinaryOpcode::LAnd) => {
                variants.push(if lang.is_cpp { "false" } else { "0" }.to_string());
            }
            Some(BinaryOpcode::LOr) => {
                variants.push(if lang.is_cpp { "true" } else { "1" }.to_string());
            }
            _ => {}
        }
        variants
    }

    #[must_use]
    pub fn function_name(&self, lang: LangOptions) -> String {
        let mut name = format!(
            "__dredd_replace_expr_{}",
            space_to_underscore(self.ty.name(lang.is_cpp))
        );
        if self.is_lvalue {
            name.push_str("_lvalue");
        }
        if self.is_constant {
            name.push_str("_constant");
        }
        match self.logical_root {
            Some(BinaryOpcode::LAnd) => name.push_str("_omit_true"),
            Some(BinaryOpcode::LOr) => name.push_str("_omit_false"),
            _ => {}
        }
        name
    }

    fn modified_type(&self, lang: LangOptions) -> String {
        let base = self.ty.name(lang.is_cpp);
        if self.is_lvalue {
            format!("{base}{}", if lang.is_cpp { "&" } else { "*" })
        } else {
            base.to_string()
        }
    }

    pub(super) fn apply(&self, cx: &mut ApplyContext) -> graft_rewrite::Result<()> {
        let lang = cx.lang;
        let name = self.function_name(lang);
        let local_id = cx.local_id();

        let (prefix, suffix) = if lang.is_cpp {
            let ty_ref = self.modified_type(lang);
            if self.is_constant {
                (
                    format!("{name}([&]() -> {ty_ref} {{ return "),
                    format!("; }}, {local_id})"),
                )
            } else {
                (
                    format!("{name}([&]() -> {ty_ref} {{ return static_cast<{ty_ref}>("),
                    format!("); }}, {local_id})"),
                )
            }
        } else if self.is_lvalue {
            // The dispatcher returns the pointer; dereferencing at the call
            // site keeps the whole rewrite an l-value.
            (format!("(*{name}(&("), format!("), {local_id}))"))
        } else {
            (format!("{name}("), format!(", {local_id})"))
        };
        cx.rewriter.insert_before(self.expr_range.begin, prefix)?;
        cx.rewriter.insert_after(self.expr_range.end, suffix)?;

        let variants = self.variants(lang, cx.options.optimise_mutations);
        let original = self.arg_eval(lang).to_string();
        let param = if lang.is_cpp {
            format!("std::function<{}()> arg", self.modified_type(lang))
        } else {
            format!("{} arg", self.modified_type(lang))
        };
        let return_type = if self.is_lvalue {
            self.modified_type(lang)
        } else {
            self.ty.name(lang.is_cpp).to_string()
        };
        let mut dispatcher =
            format!("static {return_type} {name}({param}, int local_mutation_id) {{\n");
        dispatcher.push_str(&dispatcher_body(cx.options, &variants, &original));
        dispatcher.push_str("}\n\n");
        cx.declarations.insert(dispatcher);

        *cx.next_id += variants.len() as u32;
        Ok(())
    }
}
