// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Whole-unit pipeline tests: visitor, guards, id assignment, nesting of
//! rewrites, prelude assembly, JSON projection and the coordinator.

mod common;

use common::loc;
use graft_ast::{
    Ast, AstBuilder, BinaryOpcode, BuiltinType, Diagnostic, EvalValue, ExprInfo, LangOptions,
    NodeKind, QualType, Severity, SourceRange, TranslationUnit, Type,
};
use graft_engine::{mutate_unit, Coordinator, EngineError, MutationIdTreeNode, Options};

fn int_ty() -> QualType {
    QualType::builtin(BuiltinType::Int)
}

fn unit(filename: &str, source: &str, is_cpp: bool, ast: Ast) -> TranslationUnit {
    TranslationUnit {
        filename: filename.to_string(),
        source: source.to_string(),
        lang: LangOptions { is_cpp },
        diagnostics: Vec::new(),
        ast,
    }
}

const ASSIGN_SOURCE: &str = "void foo() { int x; x = 1; }";

/// `void foo() { int x; x = 1; }` as a frontend would attribute it.
fn assignment_unit(filename: &str) -> TranslationUnit {
    let source = ASSIGN_SOURCE;
    let mut builder = AstBuilder::new();
    let function = builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "foo".to_string(),
            is_constexpr: false,
        },
        Some(SourceRange::new(0, source.len() as u32)),
    );
    let body = builder.add(
        function,
        NodeKind::CompoundStmt,
        Some(loc(source, "{ int x; x = 1; }")),
    );
    let decl_stmt = builder.add(body, NodeKind::DeclStmt, Some(loc(source, "int x;")));
    builder.add(
        decl_stmt,
        NodeKind::VarDecl {
            name: "x".to_string(),
            name_loc: Some(loc(source, "x;").begin),
            ty: int_ty(),
            is_constexpr: false,
            has_constant_initializer: false,
            is_static_local: false,
        },
        Some(loc(source, "int x")),
    );
    let assign_range = loc(source, "x = 1");
    let assign = builder.add_expr(
        body,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::Assign,
            op_range: loc(source, "="),
        },
        Some(assign_range),
        ExprInfo::new(int_ty()).lvalue().side_effects(),
    );
    builder.add_expr(
        assign,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(assign_range.begin, assign_range.begin + 1)),
        ExprInfo::new(int_ty()).lvalue(),
    );
    builder.add_expr(
        assign,
        NodeKind::Literal,
        Some(SourceRange::new(assign_range.end - 1, assign_range.end)),
        ExprInfo::new(int_ty())
            .constant()
            .with_value(EvalValue::Int(1)),
    );
    unit(filename, source, true, builder.finish())
}

#[test]
fn assignment_statement_full_pipeline() {
    let mutated = mutate_unit(&assignment_unit("test.cc"), &Options::default(), 0).unwrap();
    assert_eq!(mutated.mutation_count, 18);

    // The statement: removal wraps the dispatcher call, which wraps the
    // operand rewrites, with the assignment LHS passed by reference.
    let expected_statement = "if (!__dredd_enabled_mutation(0)) { \
        __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(\
        __dredd_replace_expr_int_lvalue([&]() -> int& { return static_cast<int&>(x); }, 11) , \
        __dredd_replace_expr_int_constant([&]() -> int { return 1; }, 13), 1); }";
    assert!(
        mutated.rewritten_source.ends_with(&format!(
            "void foo() {{ int x; {expected_statement} }}"
        )),
        "unexpected rewritten source:\n{}",
        mutated.rewritten_source
    );

    // Prelude: include, runtime declarations, then dispatchers in
    // first-registration order.
    let prelude_end = mutated.rewritten_source.find("void foo()").unwrap();
    let prelude = &mutated.rewritten_source[..prelude_end];
    assert!(prelude.starts_with("#include <functional>\n\n"));
    assert!(prelude.contains("extern \"C\" int __dredd_enabled_mutation(int local_mutation_id);"));
    assert!(prelude.contains("extern \"C\" volatile bool __dredd_some_mutation_enabled;"));
    let assign_at = prelude
        .find("static int& __dredd_replace_binary_operator_Assign_arg1_int_arg2_int(")
        .unwrap();
    let lvalue_at = prelude
        .find("static int& __dredd_replace_expr_int_lvalue(")
        .unwrap();
    let constant_at = prelude
        .find("static int __dredd_replace_expr_int_constant(")
        .unwrap();
    assert!(assign_at < lvalue_at && lvalue_at < constant_at);

    // The id tree: statement removal at the root, the operator replacement
    // below it, the two operand scopes as siblings beneath.
    assert_eq!(
        mutated.mutation_id_tree,
        MutationIdTreeNode {
            ids: vec![0],
            children: vec![MutationIdTreeNode {
                ids: (1..11).collect(),
                children: vec![
                    MutationIdTreeNode {
                        ids: vec![11, 12],
                        children: vec![],
                    },
                    MutationIdTreeNode {
                        ids: (13..18).collect(),
                        children: vec![],
                    },
                ],
            }],
        }
    );
}

#[test]
fn runs_are_deterministic() {
    let unit = assignment_unit("test.cc");
    let options = Options::default();
    let first = mutate_unit(&unit, &options, 0).unwrap();
    let second = mutate_unit(&unit, &options, 0).unwrap();
    assert_eq!(first.rewritten_source, second.rewritten_source);
    assert_eq!(first.mutation_id_tree, second.mutation_id_tree);
}

#[test]
fn ids_are_contiguous_in_preorder() {
    let mutated = mutate_unit(&assignment_unit("test.cc"), &Options::default(), 5).unwrap();
    let ids = mutated.mutation_id_tree.all_ids();
    let expected: Vec<u32> = (5..5 + mutated.mutation_count).collect();
    assert_eq!(ids, expected);
}

/// The E6 scenario: `foo(bar::B)` relies on argument-dependent lookup, so
/// the argument must stay textually unchanged.
#[test]
fn adl_sensitive_argument_is_not_wrapped() {
    let source = "namespace bar { enum {B=1}; void foo(int); }\nvoid g(){ foo(bar::B); }";
    let mut builder = AstBuilder::new();
    builder.add(
        builder.root(),
        NodeKind::OtherDecl,
        Some(loc(source, "namespace bar { enum {B=1}; void foo(int); }")),
    );
    let function = builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "g".to_string(),
            is_constexpr: false,
        },
        Some(loc(source, "void g(){ foo(bar::B); }")),
    );
    let body = builder.add(
        function,
        NodeKind::CompoundStmt,
        Some(loc(source, "{ foo(bar::B); }")),
    );
    let call_range = loc(source, "foo(bar::B)");
    let call = builder.add_expr(
        body,
        NodeKind::CallExpr(graft_ast::CallInfo {
            uses_adl: true,
            is_member_call: false,
            is_builtin_frame_address: false,
        }),
        Some(call_range),
        ExprInfo::new(QualType::new(Type::Void)).side_effects(),
    );
    builder.add_expr(
        call,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(call_range.begin, call_range.begin + 3)),
        ExprInfo::new(QualType::new(Type::Other)),
    );
    let argument = builder.add_expr(
        call,
        NodeKind::ImplicitCastExpr,
        Some(loc(source, "bar::B")),
        ExprInfo::new(int_ty()),
    );
    builder.add_expr(
        argument,
        NodeKind::DeclRefExpr {
            to_enum_constant: true,
        },
        Some(loc(source, "bar::B")),
        ExprInfo::new(QualType::new(Type::Enum)),
    );
    let unit = unit("adl.cc", source, true, builder.finish());
    let mutated = mutate_unit(&unit, &Options::default(), 0).unwrap();
    // Only the statement removal fires; the call keeps its exact spelling.
    assert_eq!(mutated.mutation_count, 1);
    assert!(mutated
        .rewritten_source
        .contains("if (!__dredd_enabled_mutation(0)) { foo(bar::B); }"));
    assert!(!mutated.rewritten_source.contains("__dredd_replace_expr"));
}

#[test]
fn global_scope_expressions_are_ignored() {
    let source = "int g = 1 + 2;";
    let mut builder = AstBuilder::new();
    let var = builder.add(
        builder.root(),
        NodeKind::VarDecl {
            name: "g".to_string(),
            name_loc: Some(4),
            ty: int_ty(),
            is_constexpr: false,
            has_constant_initializer: false,
            is_static_local: false,
        },
        Some(SourceRange::new(0, source.len() as u32)),
    );
    let binary = builder.add_expr(
        var,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::Add,
            op_range: loc(source, "+"),
        },
        Some(loc(source, "1 + 2")),
        ExprInfo::new(int_ty()).constant().with_value(EvalValue::Int(3)),
    );
    builder.add_expr(
        binary,
        NodeKind::Literal,
        Some(loc(source, "1")),
        ExprInfo::new(int_ty()).constant().with_value(EvalValue::Int(1)),
    );
    builder.add_expr(
        binary,
        NodeKind::Literal,
        Some(loc(source, "2")),
        ExprInfo::new(int_ty()).constant().with_value(EvalValue::Int(2)),
    );
    let unit = unit("global.cc", source, true, builder.finish());
    let mutated = mutate_unit(&unit, &Options::default(), 0).unwrap();
    assert_eq!(mutated.mutation_count, 0);
    assert_eq!(mutated.rewritten_source, source);
}

#[test]
fn coordinator_carries_ids_and_skips_repeats() {
    let mut coordinator = Coordinator::new(Options::default());
    let first = coordinator
        .process_unit(&assignment_unit("a.cc"))
        .unwrap()
        .unwrap();
    assert_eq!(first.mutation_id_tree.ids, vec![0]);
    assert_eq!(coordinator.next_mutation_id(), 18);

    let second = coordinator
        .process_unit(&assignment_unit("b.cc"))
        .unwrap()
        .unwrap();
    // The second unit's ids continue where the first left off...
    assert_eq!(second.mutation_id_tree.ids, vec![18]);
    // ...while the instrumented code uses file-local ids.
    assert!(second
        .rewritten_source
        .contains("if (!__dredd_enabled_mutation(0))"));

    // Repeat visits are skipped with a warning.
    assert!(coordinator
        .process_unit(&assignment_unit("a.cc"))
        .unwrap()
        .is_none());
    assert_eq!(coordinator.mutation_info().files.len(), 2);
}

#[test]
fn parse_errors_abort_the_unit_without_output() {
    let mut failing = assignment_unit("broken.cc");
    failing.diagnostics.push(Diagnostic {
        severity: Severity::Error,
        message: "expected ';'".to_string(),
    });
    let mut coordinator = Coordinator::new(Options::default());
    let result = coordinator.process_unit(&failing);
    assert!(matches!(result, Err(EngineError::ParseFailed { .. })));
    assert!(coordinator.mutation_info().files.is_empty());
    assert_eq!(coordinator.next_mutation_id(), 0);
}

#[test]
fn prelude_lands_on_the_marker_function() {
    let source = "void foo() { return; }\nvoid __dredd_prelude_start();";
    let mut builder = AstBuilder::new();
    let function = builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "foo".to_string(),
            is_constexpr: false,
        },
        Some(loc(source, "void foo() { return; }")),
    );
    let body = builder.add(
        function,
        NodeKind::CompoundStmt,
        Some(loc(source, "{ return; }")),
    );
    builder.add(body, NodeKind::OtherStmt, Some(loc(source, "return")));
    builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "__dredd_prelude_start".to_string(),
            is_constexpr: false,
        },
        Some(loc(source, "void __dredd_prelude_start();")),
    );
    let unit = unit("marker.cc", source, true, builder.finish());
    let mutated = mutate_unit(&unit, &Options::default(), 0).unwrap();
    // The rewritten file still begins with foo (no prelude at offset 0); the
    // prelude sits just before the marker declaration.
    assert!(mutated.rewritten_source.starts_with("void foo()"));
    let marker_at = mutated
        .rewritten_source
        .find("void __dredd_prelude_start();")
        .unwrap();
    let include_at = mutated.rewritten_source.find("#include <functional>").unwrap();
    assert!(include_at < marker_at);
}

#[test]
fn constant_contexts_are_rewritten_to_values() {
    // A static assertion and a constant-sized array both mention `N`; when
    // mutations exist elsewhere, their constant contexts are replaced by
    // evaluated values so the file stays compilable even if `N`'s definition
    // is mutated.
    let source = "static_assert(N == 4, \"ok\");\nvoid foo() { int a[N]; x = 1; }";
    let mut builder = AstBuilder::new();
    let assertion = builder.add(
        builder.root(),
        NodeKind::StaticAssertDecl,
        Some(loc(source, "static_assert(N == 4, \"ok\");")),
    );
    builder.add_expr(
        assertion,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::EQ,
            op_range: loc(source, "=="),
        },
        Some(loc(source, "N == 4")),
        ExprInfo::new(QualType::builtin(BuiltinType::Bool))
            .constant()
            .with_value(EvalValue::Bool(true)),
    );
    let function = builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "foo".to_string(),
            is_constexpr: false,
        },
        Some(loc(source, "void foo() { int a[N]; x = 1; }")),
    );
    let body = builder.add(
        function,
        NodeKind::CompoundStmt,
        Some(loc(source, "{ int a[N]; x = 1; }")),
    );
    let decl_stmt = builder.add(body, NodeKind::DeclStmt, Some(loc(source, "int a[N];")));
    let array_var = builder.add(
        decl_stmt,
        NodeKind::VarDecl {
            name: "a".to_string(),
            name_loc: Some(loc(source, "a[N]").begin),
            ty: QualType::new(Type::ConstantArray),
            is_constexpr: false,
            has_constant_initializer: false,
            is_static_local: false,
        },
        Some(loc(source, "int a[N]")),
    );
    let type_loc = builder.add(
        array_var,
        NodeKind::ConstantArrayTypeLoc,
        Some(loc(source, "[N]")),
    );
    let size = loc(source, "a[N]");
    builder.add_expr(
        type_loc,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(size.begin + 2, size.begin + 3)),
        ExprInfo::new(int_ty())
            .constant()
            .with_value(EvalValue::Int(4)),
    );
    let assign_range = loc(source, "x = 1");
    let assign = builder.add_expr(
        body,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::Assign,
            op_range: SourceRange::new(assign_range.begin + 2, assign_range.begin + 3),
        },
        Some(assign_range),
        ExprInfo::new(int_ty()).lvalue().side_effects(),
    );
    builder.add_expr(
        assign,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(assign_range.begin, assign_range.begin + 1)),
        ExprInfo::new(int_ty()).lvalue(),
    );
    builder.add_expr(
        assign,
        NodeKind::Literal,
        Some(SourceRange::new(assign_range.end - 1, assign_range.end)),
        ExprInfo::new(int_ty())
            .constant()
            .with_value(EvalValue::Int(1)),
    );
    let unit = unit("constants.cc", source, true, builder.finish());
    let mutated = mutate_unit(&unit, &Options::default(), 0).unwrap();
    assert!(mutated.mutation_count > 0);
    assert!(mutated.rewritten_source.contains("static_assert(1, \"ok\");"));
    assert!(mutated.rewritten_source.contains("int a[4];"));
    // The size expression itself is never wrapped in a dispatcher.
    assert!(!mutated.rewritten_source.contains("a[__dredd"));
}

#[test]
fn c_unit_uses_macros_and_by_value_dispatch() {
    let source = "void foo(int x, int y) { x = y && 1; }";
    let mut builder = AstBuilder::new();
    let function = builder.add(
        builder.root(),
        NodeKind::FunctionDecl {
            name: "foo".to_string(),
            is_constexpr: false,
        },
        Some(SourceRange::new(0, source.len() as u32)),
    );
    builder.add(function, NodeKind::ParamDecl, Some(loc(source, "int x")));
    builder.add(function, NodeKind::ParamDecl, Some(loc(source, "int y")));
    let body = builder.add(
        function,
        NodeKind::CompoundStmt,
        Some(loc(source, "{ x = y && 1; }")),
    );
    let assign_range = loc(source, "x = y && 1");
    let assign = builder.add_expr(
        body,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::Assign,
            op_range: loc(source, "="),
        },
        Some(assign_range),
        ExprInfo::new(int_ty()).side_effects(),
    );
    builder.add_expr(
        assign,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(assign_range.begin, assign_range.begin + 1)),
        ExprInfo::new(int_ty()).lvalue(),
    );
    let land_range = loc(source, "y && 1");
    let land = builder.add_expr(
        assign,
        NodeKind::BinaryOperator {
            opcode: BinaryOpcode::LAnd,
            op_range: loc(source, "&&"),
        },
        Some(land_range),
        ExprInfo::new(int_ty()),
    );
    builder.add_expr(
        land,
        NodeKind::DeclRefExpr {
            to_enum_constant: false,
        },
        Some(SourceRange::new(land_range.begin, land_range.begin + 1)),
        ExprInfo::new(int_ty()).lvalue(),
    );
    builder.add_expr(
        land,
        NodeKind::Literal,
        Some(SourceRange::new(land_range.end - 1, land_range.end)),
        ExprInfo::new(int_ty())
            .constant()
            .with_value(EvalValue::Int(1)),
    );
    let unit = unit("logic.c", source, false, builder.finish());
    let mutated = mutate_unit(&unit, &Options::default(), 0).unwrap();

    // Removal(1) + assignment(10) + lhs lvalue(2) + `y && 1` expression(6)
    // + logical macro(3) + y lvalue(2) + literal constant(5).
    assert_eq!(mutated.mutation_count, 29);
    let text = &mutated.rewritten_source;
    assert!(text.contains("#define __dredd_replace_binary_operator_LAnd_arg1_int_arg2_int("));
    assert!(text.contains("__dredd_replace_binary_operator_Assign_arg1_int_arg2_int(&("));
    assert!(text.contains("(*__dredd_replace_expr_int_lvalue(&(x), 11))"));
    assert!(text.contains("__dredd_replace_expr_int("));
    assert!(!text.contains("#include"));
    assert!(!text.contains("std::function"));
    assert!(text.contains("extern volatile int __dredd_some_mutation_enabled;"));
}
