// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Binary-operator replacement.
//!
//! The operator expression becomes a dispatcher call: `FN(` lands before the
//! LHS, the operator token itself is replaced by a comma, and the mutation id
//! closes the call after the RHS. Dispatchers enumerate the other operators
//! of the original's family plus "return arg1" / "return arg2" variants.
//!
//! Short-circuit semantics of `&&`/`||` are preserved by thunking: in C++ the
//! RHS (and a side-effecting LHS) is wrapped in a lambda; in C, where there
//! are no closures, logical operators dispatch through a function-like macro
//! whose ternary chain keeps the RHS unevaluated.

use super::{space_to_underscore, ApplyContext};
use graft_ast::{BinaryOpcode, BuiltinType, EvalValue, LangOptions, SourceRange, SourceRangeInfo};

const ARITHMETIC: [BinaryOpcode; 5] = [
    BinaryOpcode::Add,
    BinaryOpcode::Div,
    BinaryOpcode::Mul,
    BinaryOpcode::Rem,
    BinaryOpcode::Sub,
];

const COMPARISON: [BinaryOpcode; 6] = [
    BinaryOpcode::EQ,
    BinaryOpcode::NE,
    BinaryOpcode::GE,
    BinaryOpcode::GT,
    BinaryOpcode::LE,
    BinaryOpcode::LT,
];

const LOGICAL: [BinaryOpcode; 4] = [
    BinaryOpcode::LAnd,
    BinaryOpcode::LOr,
    BinaryOpcode::EQ,
    BinaryOpcode::NE,
];

const ASSIGNMENT: [BinaryOpcode; 11] = [
    BinaryOpcode::AddAssign,
    BinaryOpcode::AndAssign,
    BinaryOpcode::Assign,
    BinaryOpcode::DivAssign,
    BinaryOpcode::MulAssign,
    BinaryOpcode::OrAssign,
    BinaryOpcode::RemAssign,
    BinaryOpcode::ShlAssign,
    BinaryOpcode::ShrAssign,
    BinaryOpcode::SubAssign,
    BinaryOpcode::XorAssign,
];

/// Operators meaningless on floating-point operands.
const INT_ONLY: [BinaryOpcode; 7] = [
    BinaryOpcode::Rem,
    BinaryOpcode::RemAssign,
    BinaryOpcode::AndAssign,
    BinaryOpcode::OrAssign,
    BinaryOpcode::XorAssign,
    BinaryOpcode::ShlAssign,
    BinaryOpcode::ShrAssign,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Arithmetic,
    Comparison,
    Logical,
    Assignment,
}

/// Operator family mutated by this catalog entry; shifts, bitwise operators
/// and the comma operator are outside all families and never produce a
/// binary-operator mutation.
fn family(opcode: BinaryOpcode) -> Option<Family> {
    if opcode.is_arithmetic() {
        Some(Family::Arithmetic)
    } else if opcode.is_comparison() {
        Some(Family::Comparison)
    } else if opcode.is_logical() {
        Some(Family::Logical)
    } else if opcode.is_assignment() {
        Some(Family::Assignment)
    } else {
        None
    }
}

/// True when the catalog can mutate this operator at all.
#[must_use]
pub fn is_supported_opcode(opcode: BinaryOpcode) -> bool {
    family(opcode).is_some()
}

/// Optimisation-mode operand equivalences; each also shows up in the
/// dispatcher name so that name equality keeps implying body equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OperandEquiv {
    zero: bool,
    one: bool,
    minus_one: bool,
}

impl OperandEquiv {
    fn of(value: Option<EvalValue>, ty: BuiltinType) -> Self {
        let matches = |k: i64| {
            value.is_some_and(|value| {
                if ty.is_floating() {
                    value.is_float(k as f64)
                } else {
                    value.is_int(k)
                }
            })
        };
        Self {
            zero: matches(0),
            one: matches(1),
            minus_one: matches(-1),
        }
    }

    const fn any(self) -> bool {
        self.zero || self.one || self.minus_one
    }

    fn name_suffix(self, side: &str) -> String {
        if self.zero {
            format!("_{side}_zero")
        } else if self.one {
            format!("_{side}_one")
        } else if self.minus_one {
            format!("_{side}_minus_one")
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceBinary {
    pub opcode: BinaryOpcode,
    pub op_range: SourceRange,
    pub lhs_range: SourceRange,
    pub rhs_range: SourceRange,
    pub lhs_type: BuiltinType,
    pub rhs_type: BuiltinType,
    pub result_type: BuiltinType,
    pub lhs_is_lvalue: bool,
    pub lhs_has_side_effects: bool,
    pub lhs_is_constant: bool,
    pub rhs_is_constant: bool,
    pub lhs_value: Option<EvalValue>,
    pub rhs_value: Option<EvalValue>,
    pub info: SourceRangeInfo,
}

impl ReplaceBinary {
    fn family(&self) -> Family {
        family(self.opcode).expect("unsupported opcode")
    }

    fn is_float_context(&self) -> bool {
        self.lhs_type.is_floating() || self.rhs_type.is_floating() || self.result_type.is_floating()
    }

    fn lhs_equiv(&self, optimise: bool) -> OperandEquiv {
        if optimise && self.family() == Family::Arithmetic {
            OperandEquiv::of(self.lhs_value, self.lhs_type)
        } else {
            OperandEquiv::default()
        }
    }

    fn rhs_equiv(&self, optimise: bool) -> OperandEquiv {
        if optimise && self.family() == Family::Arithmetic {
            OperandEquiv::of(self.rhs_value, self.rhs_type)
        } else {
            OperandEquiv::default()
        }
    }

    /// Replacement opcodes, in canonical family order.
    fn replacement_opcodes(&self, optimise: bool) -> Vec<BinaryOpcode> {
        let family = self.family();
        let base: &[BinaryOpcode] = match family {
            Family::Arithmetic => &ARITHMETIC,
            Family::Comparison => &COMPARISON,
            Family::Logical => &LOGICAL,
            Family::Assignment => &ASSIGNMENT,
        };
        let float_context = self.is_float_context();
        let lhs_equiv = self.lhs_equiv(optimise);
        let rhs_equiv = self.rhs_equiv(optimise);
        base.iter()
            .copied()
            .filter(|&op| op != self.opcode)
            .filter(|&op| !(float_context && INT_ONLY.contains(&op)))
            .filter(|&op| {
                if !optimise {
                    return true;
                }
                match family {
                    Family::Comparison => comparison_keeps(self.opcode, op),
                    Family::Logical => match self.opcode {
                        BinaryOpcode::LAnd => op == BinaryOpcode::EQ,
                        _ => op == BinaryOpcode::NE,
                    },
                    Family::Arithmetic => !arithmetic_is_redundant(op, lhs_equiv, rhs_equiv),
                    Family::Assignment => true,
                }
            })
            .collect()
    }

    /// Whether the "return arg1" / "return arg2" variants are emitted.
    fn arg_variants(&self, optimise: bool) -> (bool, bool) {
        match self.family() {
            Family::Assignment => (false, false),
            Family::Comparison if optimise => (false, false),
            Family::Arithmetic if optimise => (
                !self.lhs_equiv(optimise).any(),
                !self.rhs_equiv(optimise).any(),
            ),
            _ => (true, true),
        }
    }

    /// Counts ids consumed without generating text.
    fn variant_count(&self, optimise: bool) -> u32 {
        let (arg1, arg2) = self.arg_variants(optimise);
        (self.replacement_opcodes(optimise).len() + usize::from(arg1) + usize::from(arg2)) as u32
    }

    fn lhs_thunked(&self, lang: LangOptions) -> bool {
        lang.is_cpp && self.opcode.is_logical() && self.lhs_has_side_effects
    }

    fn rhs_thunked(&self, lang: LangOptions) -> bool {
        lang.is_cpp && self.opcode.is_logical()
    }

    #[must_use]
    pub fn function_name(&self, lang: LangOptions, optimise: bool) -> String {
        format!(
            "__dredd_replace_binary_operator_{}_arg1_{}_arg2_{}{}{}",
            self.opcode.name(),
            space_to_underscore(self.lhs_type.name(lang.is_cpp)),
            space_to_underscore(self.rhs_type.name(lang.is_cpp)),
            self.lhs_equiv(optimise).name_suffix("lhs"),
            self.rhs_equiv(optimise).name_suffix("rhs"),
        )
    }

    fn arg_evals(&self, lang: LangOptions) -> (String, String) {
        if !lang.is_cpp && self.opcode.is_logical() {
            // Macro dispatch: the operands stay textual.
            return ("(arg1)".to_string(), "(arg2)".to_string());
        }
        let lhs = if self.lhs_thunked(lang) {
            "arg1()".to_string()
        } else if !lang.is_cpp && self.opcode.is_assignment() {
            "(*arg1)".to_string()
        } else {
            "arg1".to_string()
        };
        let rhs = if self.rhs_thunked(lang) {
            "arg2()".to_string()
        } else {
            "arg2".to_string()
        };
        (lhs, rhs)
    }

    fn variant_bodies(&self, lang: LangOptions, optimise: bool) -> Vec<String> {
        let (lhs, rhs) = self.arg_evals(lang);
        let mut variants: Vec<String> = self
            .replacement_opcodes(optimise)
            .into_iter()
            .map(|op| format!("{lhs} {} {rhs}", op.spelling()))
            .collect();
        let (arg1, arg2) = self.arg_variants(optimise);
        if arg1 {
            variants.push(lhs.clone());
        }
        if arg2 {
            variants.push(rhs);
        }
        variants
    }

    fn original_body(&self, lang: LangOptions) -> String {
        let (lhs, rhs) = self.arg_evals(lang);
        format!("{lhs} {} {rhs}", self.opcode.spelling())
    }

    fn function_dispatcher(&self, name: &str, cx: &ApplyContext) -> String {
        let lang = cx.lang;
        let optimise = cx.options.optimise_mutations;
        let lhs_type = self.lhs_type.name(lang.is_cpp);
        let rhs_type = self.rhs_type.name(lang.is_cpp);

        let return_type = if self.opcode.is_assignment() {
            if lang.is_cpp {
                format!("{lhs_type}&")
            } else {
                self.result_type.name(lang.is_cpp).to_string()
            }
        } else {
            self.result_type.name(lang.is_cpp).to_string()
        };
        let param1 = if self.lhs_thunked(lang) {
            format!("std::function<{lhs_type}()> arg1")
        } else if self.opcode.is_assignment() {
            if lang.is_cpp {
                format!("{lhs_type}& arg1")
            } else {
                format!("{lhs_type}* arg1")
            }
        } else {
            format!("{lhs_type} arg1")
        };
        let param2 = if self.rhs_thunked(lang) {
            format!("std::function<{rhs_type}()> arg2")
        } else {
            format!("{rhs_type} arg2")
        };

        let mut dispatcher = format!(
            "static {return_type} {name}({param1}, {param2}, int local_mutation_id) {{\n"
        );
        dispatcher.push_str(&super::dispatcher_body(
            cx.options,
            &self.variant_bodies(lang, optimise),
            &self.original_body(lang),
        ));
        dispatcher.push_str("}\n\n");
        dispatcher
    }

    /// C logical operators dispatch through a macro so the RHS is only
    /// evaluated when the selected operator demands it.
    fn macro_dispatcher(&self, name: &str, cx: &ApplyContext) -> String {
        let lang = cx.lang;
        let optimise = cx.options.optimise_mutations;
        let original = self.original_body(lang);
        let variants = self.variant_bodies(lang, optimise);
        let mut lines = format!("#define {name}(arg1, arg2, local_mutation_id) \\\n");
        if cx.options.only_track_mutant_coverage {
            lines.push_str(&format!(
                "  (__dredd_record_covered_mutants((local_mutation_id), {}), ({original}))\n\n",
                variants.len()
            ));
            return lines;
        }
        lines.push_str(&format!(
            "  (!__dredd_some_mutation_enabled ? ({original}) : \\\n"
        ));
        for (offset, variant) in variants.iter().enumerate() {
            lines.push_str(&format!(
                "   __dredd_enabled_mutation((local_mutation_id) + {offset}) ? ({variant}) : \\\n"
            ));
        }
        lines.push_str(&format!("   ({original}))\n\n"));
        lines
    }

    fn thunk_texts(
        &self,
        ty: BuiltinType,
        is_constant: bool,
        lang: LangOptions,
    ) -> (String, String) {
        let ty_name = ty.name(lang.is_cpp);
        if is_constant {
            (format!("[&]() -> {ty_name} {{ return "), "; }".to_string())
        } else {
            (
                format!("[&]() -> {ty_name} {{ return static_cast<{ty_name}>("),
                "); }".to_string(),
            )
        }
    }

    pub(super) fn apply(&self, cx: &mut ApplyContext) -> graft_rewrite::Result<()> {
        let lang = cx.lang;
        let optimise = cx.options.optimise_mutations;
        let name = self.function_name(lang, optimise);
        let local_id = cx.local_id();

        let (lhs_prefix, lhs_suffix) = if self.lhs_thunked(lang) {
            self.thunk_texts(self.lhs_type, self.lhs_is_constant, lang)
        } else if !lang.is_cpp && self.opcode.is_assignment() {
            ("&(".to_string(), ")".to_string())
        } else {
            (String::new(), String::new())
        };
        let (rhs_prefix, rhs_suffix) = if self.rhs_thunked(lang) {
            self.thunk_texts(self.rhs_type, self.rhs_is_constant, lang)
        } else {
            (String::new(), String::new())
        };

        cx.rewriter
            .insert_before(self.lhs_range.begin, format!("{name}({lhs_prefix}"))?;
        if !lhs_suffix.is_empty() {
            cx.rewriter.insert_after(self.lhs_range.end, lhs_suffix)?;
        }
        cx.rewriter.replace(self.op_range, ",")?;
        if !rhs_prefix.is_empty() {
            cx.rewriter.insert_before(self.rhs_range.begin, rhs_prefix)?;
        }
        cx.rewriter
            .insert_after(self.rhs_range.end, format!("{rhs_suffix}, {local_id})"))?;

        if !lang.is_cpp && self.opcode.is_logical() {
            let dispatcher = self.macro_dispatcher(&name, cx);
            cx.macros.insert(dispatcher);
        } else {
            let dispatcher = self.function_dispatcher(&name, cx);
            cx.declarations.insert(dispatcher);
        }

        *cx.next_id += self.variant_count(optimise);
        Ok(())
    }
}

/// The optimisation-mode comparison table: each comparison keeps the two
/// replacements whose disagreement region with the original is smallest.
fn comparison_keeps(original: BinaryOpcode, replacement: BinaryOpcode) -> bool {
    use BinaryOpcode::{EQ, GE, GT, LE, LT, NE};
    let kept: [BinaryOpcode; 2] = match original {
        GT => [NE, GE],
        LT => [NE, LE],
        EQ => [GE, LE],
        NE => [GT, LT],
        GE => [EQ, GT],
        LE => [EQ, LT],
        _ => return false,
    };
    kept.contains(&replacement)
}

/// An arithmetic replacement is redundant when an operand equivalence makes
/// it collapse into an argument or constant variant.
fn arithmetic_is_redundant(
    replacement: BinaryOpcode,
    lhs: OperandEquiv,
    rhs: OperandEquiv,
) -> bool {
    use BinaryOpcode::{Add, Div, Mul, Rem, Sub};
    match replacement {
        Add => lhs.zero || rhs.zero,
        Sub => rhs.zero,
        Mul => lhs.zero || lhs.one || rhs.zero || rhs.one,
        Div => lhs.zero || rhs.one,
        Rem => lhs.zero || rhs.one,
        _ => false,
    }
}
