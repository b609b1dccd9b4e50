// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Binary-operator replacement rewrites and dispatcher texts.

mod common;

use common::{apply_mutation, loc, range_info};
use graft_ast::{BinaryOpcode, BuiltinType, EvalValue, SourceRange};
use graft_engine::{Mutation, ReplaceBinary};

/// Builds a descriptor from the operand ranges; the operator token is
/// located between them.
fn binary(
    source: &str,
    opcode: BinaryOpcode,
    lhs_range: SourceRange,
    rhs_range: SourceRange,
    types: (BuiltinType, BuiltinType, BuiltinType),
) -> ReplaceBinary {
    let between = &source[lhs_range.end as usize..rhs_range.begin as usize];
    let found = between.find(opcode.spelling()).expect("operator token") as u32;
    let op_range = SourceRange::new(
        lhs_range.end + found,
        lhs_range.end + found + opcode.spelling().len() as u32,
    );
    let whole = SourceRange::new(lhs_range.begin, rhs_range.end);
    ReplaceBinary {
        opcode,
        op_range,
        lhs_range,
        rhs_range,
        lhs_type: types.0,
        rhs_type: types.1,
        result_type: types.2,
        lhs_is_lvalue: false,
        lhs_has_side_effects: false,
        lhs_is_constant: false,
        rhs_is_constant: false,
        lhs_value: None,
        rhs_value: None,
        info: range_info(source, whole),
    }
}

/// Ranges of the two single-token operands of `<lhs> <op> <rhs>`.
fn operand_ranges(source: &str, expr: &str) -> (SourceRange, SourceRange) {
    let whole = loc(source, expr);
    (
        SourceRange::new(whole.begin, whole.begin + 1),
        SourceRange::new(whole.end - 1, whole.end),
    )
}

#[test]
fn logical_and_thunks_the_rhs() {
    let source = "void foo(int x, int y) {\n  bool z = x && y;\n}";
    let (lhs, rhs) = operand_ranges(source, "x && y");
    let mutation = binary(
        source,
        BinaryOpcode::LAnd,
        lhs,
        rhs,
        (BuiltinType::Bool, BuiltinType::Bool, BuiltinType::Bool),
    );
    let applied = apply_mutation(source, true, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo(int x, int y) {\n  bool z = __dredd_replace_binary_operator_LAnd_arg1_bool_arg2_bool(x , [&]() -> bool { return static_cast<bool>(y); }, 0);\n}"
    );
    assert_eq!(
        applied.declarations[0],
        "static bool __dredd_replace_binary_operator_LAnd_arg1_bool_arg2_bool(bool arg1, std::function<bool()> arg2, int local_mutation_id) {\n\
         \x20 if (!__dredd_some_mutation_enabled) return arg1 && arg2();\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 0)) return arg1 == arg2();\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 1)) return arg1;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 2)) return arg2();\n\
         \x20 return arg1 && arg2();\n\
         }\n\n"
    );
    assert_eq!(applied.id_count, 3);
}

#[test]
fn logical_and_with_side_effecting_lhs_thunks_both_sides() {
    let source = "void foo(int x, int y) { bool z = (x++) && y; }";
    let lhs = loc(source, "(x++)");
    let rhs_begin = loc(source, "y;").begin;
    let mutation = ReplaceBinary {
        lhs_has_side_effects: true,
        ..binary(
            source,
            BinaryOpcode::LAnd,
            lhs,
            SourceRange::new(rhs_begin, rhs_begin + 1),
            (BuiltinType::Bool, BuiltinType::Bool, BuiltinType::Bool),
        )
    };
    let applied = apply_mutation(source, true, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo(int x, int y) { bool z = __dredd_replace_binary_operator_LAnd_arg1_bool_arg2_bool([&]() -> bool { return static_cast<bool>((x++)); } , [&]() -> bool { return static_cast<bool>(y); }, 0); }"
    );
    assert!(applied.declarations[0].starts_with(
        "static bool __dredd_replace_binary_operator_LAnd_arg1_bool_arg2_bool(std::function<bool()> arg1, std::function<bool()> arg2, int local_mutation_id) {"
    ));
    assert!(applied.declarations[0].contains("return arg1() && arg2();"));
}

#[test]
fn add_without_optimisations_enumerates_the_family() {
    let source = "void foo() { 1 + 2; }";
    let (lhs, rhs) = operand_ranges(source, "1 + 2");
    let mutation = binary(
        source,
        BinaryOpcode::Add,
        lhs,
        rhs,
        (BuiltinType::Int, BuiltinType::Int, BuiltinType::Int),
    );
    let applied = apply_mutation(source, true, false, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo() { __dredd_replace_binary_operator_Add_arg1_int_arg2_int(1 , 2, 0); }"
    );
    assert_eq!(
        applied.declarations[0],
        "static int __dredd_replace_binary_operator_Add_arg1_int_arg2_int(int arg1, int arg2, int local_mutation_id) {\n\
         \x20 if (!__dredd_some_mutation_enabled) return arg1 + arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 0)) return arg1 / arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 1)) return arg1 * arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 2)) return arg1 % arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 3)) return arg1 - arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 4)) return arg1;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 5)) return arg2;\n\
         \x20 return arg1 + arg2;\n\
         }\n\n"
    );
    assert_eq!(applied.id_count, 6);
}

#[test]
fn add_with_unit_lhs_optimises_and_marks_the_name() {
    let source = "void foo() { 1 + 2; }";
    let (lhs, rhs) = operand_ranges(source, "1 + 2");
    let mutation = ReplaceBinary {
        lhs_is_constant: true,
        rhs_is_constant: true,
        lhs_value: Some(EvalValue::Int(1)),
        rhs_value: Some(EvalValue::Int(2)),
        ..binary(
            source,
            BinaryOpcode::Add,
            lhs,
            rhs,
            (BuiltinType::Int, BuiltinType::Int, BuiltinType::Int),
        )
    };
    let applied = apply_mutation(source, true, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo() { __dredd_replace_binary_operator_Add_arg1_int_arg2_int_lhs_one(1 , 2, 0); }"
    );
    let dispatcher = &applied.declarations[0];
    assert!(dispatcher.contains("return arg1 / arg2;"));
    assert!(dispatcher.contains("return arg1 % arg2;"));
    assert!(dispatcher.contains("return arg1 - arg2;"));
    assert!(!dispatcher.contains("return arg1 * arg2;"));
    assert!(dispatcher.contains("local_mutation_id + 3)) return arg2;"));
    assert!(!dispatcher.contains("return arg1;\n"));
    assert_eq!(applied.id_count, 4);
}

#[test]
fn assignment_passes_the_lhs_by_reference() {
    let source = "void foo() { int x; x = 1; }";
    let (lhs, rhs) = operand_ranges(source, "x = 1");
    let mutation = ReplaceBinary {
        lhs_is_lvalue: true,
        ..binary(
            source,
            BinaryOpcode::Assign,
            lhs,
            rhs,
            (BuiltinType::Int, BuiltinType::Int, BuiltinType::Int),
        )
    };
    let applied = apply_mutation(source, true, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo() { int x; __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(x , 1, 0); }"
    );
    assert_eq!(
        applied.declarations[0],
        "static int& __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(int& arg1, int arg2, int local_mutation_id) {\n\
         \x20 if (!__dredd_some_mutation_enabled) return arg1 = arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 0)) return arg1 += arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 1)) return arg1 &= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 2)) return arg1 /= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 3)) return arg1 *= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 4)) return arg1 |= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 5)) return arg1 %= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 6)) return arg1 <<= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 7)) return arg1 >>= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 8)) return arg1 -= arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 9)) return arg1 ^= arg2;\n\
         \x20 return arg1 = arg2;\n\
         }\n\n"
    );
    assert_eq!(applied.id_count, 10);
}

#[test]
fn c_assignment_passes_the_lhs_by_address() {
    let source = "void foo() { int x; x = 1; }";
    let (lhs, rhs) = operand_ranges(source, "x = 1");
    let mutation = ReplaceBinary {
        lhs_is_lvalue: true,
        ..binary(
            source,
            BinaryOpcode::Assign,
            lhs,
            rhs,
            (BuiltinType::Int, BuiltinType::Int, BuiltinType::Int),
        )
    };
    let applied = apply_mutation(source, false, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo() { int x; __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(&(x) , 1, 0); }"
    );
    assert!(applied.declarations[0].starts_with(
        "static int __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(int* arg1, int arg2, int local_mutation_id) {"
    ));
    assert!(applied.declarations[0].contains("return (*arg1) += arg2;"));
    assert!(applied.declarations[0].contains("  return (*arg1) = arg2;\n"));
}

#[test]
fn c_logical_operator_becomes_a_macro() {
    let source = "void foo(int x, int y) { int z = x && y; }";
    let (lhs, rhs) = operand_ranges(source, "x && y");
    let mutation = binary(
        source,
        BinaryOpcode::LAnd,
        lhs,
        rhs,
        (BuiltinType::Int, BuiltinType::Int, BuiltinType::Int),
    );
    let applied = apply_mutation(source, false, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.rewritten,
        "void foo(int x, int y) { int z = __dredd_replace_binary_operator_LAnd_arg1_int_arg2_int(x , y, 0); }"
    );
    assert!(applied.declarations.is_empty());
    assert_eq!(applied.macros.len(), 1);
    assert_eq!(
        applied.macros[0],
        "#define __dredd_replace_binary_operator_LAnd_arg1_int_arg2_int(arg1, arg2, local_mutation_id) \\\n\
         \x20 (!__dredd_some_mutation_enabled ? ((arg1) && (arg2)) : \\\n\
         \x20  __dredd_enabled_mutation((local_mutation_id) + 0) ? ((arg1) == (arg2)) : \\\n\
         \x20  __dredd_enabled_mutation((local_mutation_id) + 1) ? ((arg1)) : \\\n\
         \x20  __dredd_enabled_mutation((local_mutation_id) + 2) ? ((arg2)) : \\\n\
         \x20  ((arg1) && (arg2)))\n\n"
    );
    assert_eq!(applied.id_count, 3);
}

#[test]
fn comparison_optimisation_keeps_the_adjacent_pair() {
    let source = "void foo(int x, int y) { bool z = x > y; }";
    let (lhs, rhs) = operand_ranges(source, "x > y");
    let mutation = binary(
        source,
        BinaryOpcode::GT,
        lhs,
        rhs,
        (BuiltinType::Int, BuiltinType::Int, BuiltinType::Bool),
    );
    let applied = apply_mutation(source, true, true, &Mutation::ReplaceBinary(mutation));
    assert_eq!(
        applied.declarations[0],
        "static bool __dredd_replace_binary_operator_GT_arg1_int_arg2_int(int arg1, int arg2, int local_mutation_id) {\n\
         \x20 if (!__dredd_some_mutation_enabled) return arg1 > arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 0)) return arg1 != arg2;\n\
         \x20 if (__dredd_enabled_mutation(local_mutation_id + 1)) return arg1 >= arg2;\n\
         \x20 return arg1 > arg2;\n\
         }\n\n"
    );
    assert_eq!(applied.id_count, 2);
}
