// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # AST Traversal and Guard Engine
//!
//! Walks one translation unit depth-first, applies every admissibility rule,
//! and produces the mutation tree plus the bookkeeping the application pass
//! needs: expressions that must be rewritten to constants because their
//! context demands compile-time evaluation, and the prelude insertion point.
//!
//! Guards fall into two groups. *Universal* filters reject a candidate node
//! outright (outside the main file, under a constant context, not inside a
//! function, ADL-sensitive, lifetime-sensitive). *Traversal* suppressions
//! prune whole subtrees that must never be mutated (template arguments,
//! array-size expressions, lambda capture initializers, `sizeof` children).

use crate::mutations::{
    is_supported_opcode, Mutation, RemoveStmt, ReplaceBinary, ReplaceExpr, ReplaceUnary,
};
use crate::options::Options;
use crate::tree::{MutationTree, TreeNodeId};
use graft_ast::{
    BinaryOpcode, BuiltinType, ExprInfo, LineIndex, Node, NodeId, NodeKind, SizeofKind,
    SourceRange, SourceRangeInfo, TranslationUnit, Type, UnaryOpcode,
};
use std::collections::HashSet;

/// Everything the traversal learned about one translation unit.
pub struct VisitOutcome {
    /// Tidied mutation tree, ready for the application pass.
    pub tree: MutationTree,
    /// Expressions in constant-demanding argument positions, to be replaced
    /// by their evaluated values.
    pub constant_arguments: Vec<NodeId>,
    /// Constant-sized array size expressions, likewise replaced by value.
    pub constant_sized_arrays: Vec<NodeId>,
    /// `static_assert` conditions, replaced by `1`.
    pub static_assertions: Vec<NodeId>,
    /// Byte offset where the prelude is inserted: the user's
    /// `__dredd_prelude_start` marker if present, else the first declaration
    /// wholly contained in the main file.
    pub prelude_start: u32,
}

pub struct MutateVisitor<'a> {
    unit: &'a TranslationUnit,
    options: &'a Options,
    line_index: LineIndex,
    tree: MutationTree,
    tree_path: Vec<TreeNodeId>,
    enclosing_decls: Vec<NodeId>,
    var_decl_locations: HashSet<u32>,
    constant_arguments: Vec<NodeId>,
    constant_sized_arrays: Vec<NodeId>,
    static_assertions: Vec<NodeId>,
    prelude_start: Option<u32>,
    first_decl_start: Option<u32>,
}

impl<'a> MutateVisitor<'a> {
    pub fn visit(unit: &'a TranslationUnit, options: &'a Options) -> VisitOutcome {
        let mut visitor = Self {
            unit,
            options,
            line_index: unit.line_index(),
            tree: MutationTree::new(),
            tree_path: vec![MutationTree::ROOT],
            enclosing_decls: Vec::new(),
            var_decl_locations: HashSet::new(),
            constant_arguments: Vec::new(),
            constant_sized_arrays: Vec::new(),
            static_assertions: Vec::new(),
            prelude_start: None,
            first_decl_start: None,
        };
        for child in unit.ast.root().children() {
            visitor.traverse_node(child);
        }
        let mut tree = visitor.tree;
        tree.tidy_up();
        VisitOutcome {
            tree,
            constant_arguments: visitor.constant_arguments,
            constant_sized_arrays: visitor.constant_sized_arrays,
            static_assertions: visitor.static_assertions,
            prelude_start: visitor
                .prelude_start
                .or(visitor.first_decl_start)
                .unwrap_or(0),
        }
    }

    fn is_cpp(&self) -> bool {
        self.unit.lang.is_cpp
    }

    fn traverse_node(&mut self, node: Node<'a>) {
        match node.kind() {
            kind if kind.is_decl() => self.traverse_decl(node),
            NodeKind::ConstantArrayTypeLoc
            | NodeKind::VariableArrayTypeLoc
            | NodeKind::DependentSizedArrayTypeLoc
            | NodeKind::TemplateArgumentLoc => self.traverse_type_loc(node),
            _ => self.traverse_stmt(node),
        }
    }

    fn traverse_decl(&mut self, node: Node<'a>) {
        let Some(range) = node.range() else {
            // Not wholly contained in the main file.
            return;
        };
        if self.first_decl_start.is_none() {
            self.first_decl_start = Some(range.begin);
        }
        match node.kind() {
            NodeKind::StaticAssertDecl => {
                // Static assertions are never mutated, but their conditions
                // must stay compile-time constants even when declarations
                // they mention get mutated, so the condition is later
                // replaced by `1`.
                if let Some(condition) = node.child(0) {
                    self.static_assertions.push(condition.id());
                }
                return;
            }
            NodeKind::FunctionDecl { name, is_constexpr } => {
                if name == "__dredd_prelude_start" && self.prelude_start.is_none() {
                    self.prelude_start = Some(range.begin);
                }
                if *is_constexpr {
                    // Mutations act at runtime; constexpr functions demand
                    // compile-time evaluation.
                    return;
                }
            }
            NodeKind::VarDecl { .. } => {
                self.traverse_var_decl(node);
                return;
            }
            NodeKind::ParamDecl => {
                // Parameter declarations (including default arguments) are
                // not descended for mutation.
                return;
            }
            NodeKind::FieldDecl { ty } => {
                if self.is_cpp() && matches!(ty.ty, Type::ConstantArray) {
                    if let Some(size) = self.constant_array_size_expr(node) {
                        self.constant_sized_arrays.push(size);
                    }
                }
            }
            _ => {}
        }
        self.enclosing_decls.push(node.id());
        for child in node.children() {
            self.traverse_node(child);
        }
        self.enclosing_decls.pop();
    }

    fn traverse_var_decl(&mut self, node: Node<'a>) {
        let NodeKind::VarDecl {
            name_loc,
            ty,
            is_constexpr,
            has_constant_initializer,
            is_static_local,
            ..
        } = node.kind()
        else {
            return;
        };
        // Template arguments must remain compile-time constants even if the
        // declarations they mention are mutated elsewhere, so they are
        // collected for constant replacement (recursively, to cover nested
        // specializations).
        self.collect_template_argument_exprs(node);
        if self.is_cpp() && matches!(ty.ty, Type::ConstantArray) {
            if let Some(size) = self.constant_array_size_expr(node) {
                self.constant_sized_arrays.push(size);
            }
        }
        if *is_constexpr || *has_constant_initializer {
            return;
        }
        if !self.is_cpp() && *is_static_local {
            // C static locals have constant initializers.
            return;
        }
        if let Some(loc) = name_loc {
            self.var_decl_locations.insert(*loc);
        }
        self.enclosing_decls.push(node.id());
        for child in node.children() {
            self.traverse_node(child);
        }
        self.enclosing_decls.pop();
    }

    fn collect_template_argument_exprs(&mut self, node: Node<'a>) {
        for child in node.children() {
            if matches!(child.kind(), NodeKind::TemplateArgumentLoc) {
                self.collect_from_template_argument(child);
            }
        }
    }

    fn collect_from_template_argument(&mut self, argument: Node<'a>) {
        for child in argument.children() {
            if matches!(child.kind(), NodeKind::TemplateArgumentLoc) {
                self.collect_from_template_argument(child);
            } else if child.kind().is_expr() {
                self.constant_arguments.push(child.id());
            }
        }
    }

    fn constant_array_size_expr(&self, decl: Node<'a>) -> Option<NodeId> {
        decl.children()
            .find(|child| matches!(child.kind(), NodeKind::ConstantArrayTypeLoc))
            .and_then(|type_loc| type_loc.child(0))
            .map(|size| size.id())
    }

    fn traverse_type_loc(&mut self, node: Node<'a>) {
        match node.kind() {
            // Constant array sizes cannot become non-constant, and template
            // arguments must stay compile-time constants.
            NodeKind::ConstantArrayTypeLoc
            | NodeKind::DependentSizedArrayTypeLoc
            | NodeKind::TemplateArgumentLoc => {}
            NodeKind::VariableArrayTypeLoc => {
                // In C++, lambdas cannot appear in array size expressions.
                if !self.is_cpp() {
                    for child in node.children() {
                        self.traverse_node(child);
                    }
                }
            }
            _ => {}
        }
    }

    fn traverse_stmt(&mut self, node: Node<'a>) {
        match node.kind() {
            // Compile-time-evaluated wrappers whose subtrees must stay
            // untouched.
            NodeKind::UserDefinedLiteral | NodeKind::ConstantExpr | NodeKind::NoexceptExpr => {
                return;
            }
            kind if kind.is_cast() => {
                if node
                    .expr()
                    .is_some_and(|info| matches!(info.ty.ty, Type::Decltype))
                {
                    // The engine does not change expression types, so
                    // anything under `decltype` stays as written.
                    return;
                }
            }
            NodeKind::CallExpr(info) if info.is_builtin_frame_address => {
                // The argument must be a constant integer; record it for
                // constant replacement and leave the call alone.
                if let Some(argument) = node.child(1) {
                    self.constant_arguments.push(argument.id());
                }
                return;
            }
            NodeKind::SwitchCase { .. } => {
                // Case expressions must be constant; only the labelled
                // statement is considered.
                if let Some(sub_stmt) = node.child(node.child_count().wrapping_sub(1)) {
                    self.traverse_stmt(sub_stmt);
                }
                return;
            }
            _ => {}
        }

        let tree_node = self.tree.add_child(*self.tree_path.last().expect("tree path"));
        self.tree_path.push(tree_node);

        if matches!(node.kind(), NodeKind::CompoundStmt) {
            self.traverse_compound(node);
        } else {
            if node.kind().is_expr() {
                self.visit_expr(node);
            }
            for (index, child) in node.children().enumerate() {
                if self.skip_child(node, index) {
                    continue;
                }
                self.traverse_node(child);
            }
        }
        self.tree_path.pop();
    }

    /// Subtree suppressions keyed on the parent: constant-demanding children
    /// are never descended.
    fn skip_child(&self, parent: Node<'a>, index: usize) -> bool {
        match parent.kind() {
            NodeKind::IfStmt { is_constexpr: true } => index == 0,
            NodeKind::NewExpr {
                has_array_size: true,
            } => index == 0,
            NodeKind::SizeofExpr { kind } => {
                matches!(kind, SizeofKind::SizeOf | SizeofKind::AlignOf)
            }
            NodeKind::LambdaExpr { capture_init_count } => index < *capture_init_count as usize,
            _ => false,
        }
    }

    fn traverse_compound(&mut self, compound: Node<'a>) {
        for child in compound.children() {
            // A run of `case`/`default` labels is descended to the first
            // labelled statement: the removal conditional has to sit after
            // the labels, or a branch to a label would jump straight into
            // the conditional's body.
            let mut target = child;
            while matches!(target.kind(), NodeKind::SwitchCase { .. }) {
                match target.child(target.child_count().wrapping_sub(1)) {
                    Some(sub_stmt) => target = sub_stmt,
                    None => break,
                }
            }
            if self.options.optimise_mutations
                && target.kind().is_expr()
                && !target.expr().is_some_and(|info| info.has_side_effects)
            {
                // A side-effect free expression statement: removal is
                // unobservable, and so is every mutation beneath it.
                continue;
            }
            let tree_node = self.tree.add_child(*self.tree_path.last().expect("tree path"));
            self.tree_path.push(tree_node);
            self.traverse_stmt(target);

            let removable = match target.kind() {
                NodeKind::NullStmt | NodeKind::DeclStmt | NodeKind::LabelStmt => false,
                NodeKind::CompoundStmt if self.options.optimise_mutations => false,
                _ => target.range().is_some(),
            };
            if removable {
                if let Some(range) = target.range() {
                    let mutation = Mutation::RemoveStmt(RemoveStmt::new(
                        range,
                        &self.unit.source,
                        &self.line_index,
                    ));
                    self.add_mutation(target, mutation);
                }
            }
            self.tree_path.pop();
        }
    }

    fn add_mutation(&mut self, node: Node<'a>, mutation: Mutation) {
        if self.options.show_ast_node_types {
            let info = mutation.info();
            log::debug!(
                "{}: {} mutation at {}:{} ({:?})",
                self.unit.filename,
                node.kind().name(),
                info.start_line,
                info.start_column,
                info.snippet
            );
        }
        self.tree
            .add_mutation(*self.tree_path.last().expect("tree path"), mutation);
    }

    fn is_in_function(&self) -> bool {
        for &decl_id in self.enclosing_decls.iter().rev() {
            match self.unit.ast.node(decl_id).kind() {
                NodeKind::FunctionDecl { .. } => return true,
                // Visitation inside a variable declaration is fine as long
                // as the declaration itself sits inside a function.
                NodeKind::VarDecl { .. } => {}
                _ => return false,
            }
        }
        false
    }

    fn visit_expr(&mut self, node: Node<'a>) {
        if self.options.optimise_mutations
            && matches!(
                node.kind(),
                NodeKind::ParenExpr | NodeKind::ExprWithCleanups
            )
        {
            // Wrapper nodes sharing their subexpression's type and value.
            return;
        }
        if !self.is_in_function() {
            return;
        }
        let Some(range) = node.range() else {
            return;
        };
        if !range.is_consistent() {
            // Parser quirk: a range that ends before it starts.
            return;
        }
        if self.var_decl_locations.contains(&range.begin) {
            // The expression aliases a declared name, as in
            // `if (auto v = ...)`; wrapping it would mangle the declaration.
            return;
        }
        let Some(info) = node.expr() else {
            return;
        };
        if !info.ty.is_supported() {
            return;
        }
        if self.mutating_may_affect_adl(node) {
            return;
        }
        if Self::may_depend_on_materialized_temporary(node) {
            return;
        }

        self.handle_expr(node, range, info);
        if matches!(node.kind(), NodeKind::UnaryOperator { .. }) {
            self.handle_unary_operator(node, range, info);
        }
        if matches!(node.kind(), NodeKind::BinaryOperator { .. }) {
            self.handle_binary_operator(node, range, info);
        }
    }

    /// L-values may only be mutated by in-place increment/decrement, and only
    /// when a reference can safely bind to them.
    fn can_mutate_lvalue(info: &ExprInfo) -> bool {
        info.ty.is_supported()
            && !info.ty.is_const
            && !info.ty.is_volatile
            && !info.refers_to_bitfield
    }

    fn is_direct_argument_to_adl_call(node: Node<'a>) -> bool {
        node.parent()
            .is_some_and(|parent| matches!(parent.kind(), NodeKind::CallExpr(info) if info.uses_adl))
    }

    /// Mutating an argument that participates in argument-dependent lookup
    /// can change which namespaces are searched, breaking compilation. Both
    /// checks are conservative.
    fn mutating_may_affect_adl(&self, node: Node<'a>) -> bool {
        if matches!(node.kind(), NodeKind::ImplicitCastExpr) {
            if let Some(sub) = node.child(0) {
                let from_unsupported = sub
                    .expr()
                    .is_some_and(|sub_info| !sub_info.ty.is_supported());
                let from_member_call =
                    matches!(sub.kind(), NodeKind::CallExpr(info) if info.is_member_call);
                if (from_unsupported || from_member_call)
                    && Self::is_direct_argument_to_adl_call(node)
                {
                    return true;
                }
            }
        }
        if matches!(node.kind(), NodeKind::CallExpr(info) if info.is_member_call) {
            let mut candidate = node;
            if let Some(parent) = node.parent() {
                if matches!(parent.kind(), NodeKind::ImplicitCastExpr) {
                    candidate = parent;
                }
            }
            if Self::is_direct_argument_to_adl_call(candidate) {
                return true;
            }
        }
        false
    }

    /// A value derived from a materialized temporary may dangle if the
    /// wrapped expression outlives the temporary's storage.
    fn may_depend_on_materialized_temporary(node: Node<'a>) -> bool {
        match node.kind() {
            NodeKind::MaterializeTemporaryExpr => true,
            NodeKind::MemberExpr => {
                let yields_reference = node.is_lvalue()
                    || node.expr().is_some_and(|info| info.ty.is_pointer());
                yields_reference
                    && node
                        .child(0)
                        .is_some_and(Self::may_depend_on_materialized_temporary)
            }
            NodeKind::CallExpr(_) => {
                let yields_reference = node.is_lvalue()
                    || node.expr().is_some_and(|info| info.ty.is_pointer());
                yields_reference
                    && node
                        .children()
                        .skip(1)
                        .any(|argument| Self::may_depend_on_materialized_temporary(argument))
            }
            _ => false,
        }
    }

    fn equivalent_to_int(info: &ExprInfo, k: i64) -> bool {
        !info
            .ty
            .as_builtin()
            .is_some_and(BuiltinType::is_floating)
            && info.value.is_some_and(|value| value.is_int(k))
    }

    fn equivalent_to_float(info: &ExprInfo, k: f64) -> bool {
        info.ty
            .as_builtin()
            .is_some_and(BuiltinType::is_floating)
            && info.value.is_some_and(|value| value.is_float(k))
    }

    fn handle_expr(&mut self, node: Node<'a>, range: SourceRange, info: &ExprInfo) {
        if info.is_lvalue() && !Self::can_mutate_lvalue(info) {
            return;
        }
        if matches!(node.kind(), NodeKind::InitListExpr) {
            // Braced initializer lists are not expressions with one value.
            return;
        }
        if info.is_null_pointer_constant {
            // `int* x = 0`: mutating the 0 under a pointer cast is unsafe in
            // C++ and avoided in C for consistency.
            if let Some(parent) = node.parent() {
                if parent.kind().is_cast()
                    && parent.expr().is_some_and(|parent_info| parent_info.ty.is_pointer())
                {
                    return;
                }
            }
        }
        if self.is_conversion_of_enum_to_constructor(node) {
            return;
        }
        if node.kind().is_cast()
            && node
                .child(0)
                .and_then(|sub| sub.expr())
                .is_some_and(|sub_info| sub_info.refers_to_bitfield)
            && node
                .parent()
                .is_some_and(|parent| matches!(parent.kind(), NodeKind::MaterializeTemporaryExpr))
        {
            // The bit-field l-value is about to be materialized so a
            // reference can bind to it; wrapping would need that reference.
            return;
        }
        if self.options.optimise_mutations {
            if let Some(parent) = node.parent() {
                if parent.kind().is_cast()
                    && parent.is_lvalue() == info.is_lvalue()
                    && node
                        .first_ancestor_where(|ancestor| {
                            matches!(ancestor.kind(), NodeKind::InitListExpr)
                        })
                        .is_none()
                {
                    // Mutating below a value-category-preserving cast mostly
                    // duplicates mutating the cast itself. Initializer-list
                    // contexts are exempt: the outer cast is not acted on
                    // there, and skipping both would lose the narrowing
                    // protection of the inserted static_cast.
                    return;
                }
                if matches!(
                    parent.kind(),
                    NodeKind::CompoundStmt | NodeKind::SwitchCase { .. }
                ) {
                    // A full-expression statement: constants duplicate
                    // statement removal, and operator insertion is covered
                    // at other use sites.
                    return;
                }
            }
        }
        let Some(builtin) = info.ty.as_builtin() else {
            return;
        };
        let logical_root = match node.kind() {
            NodeKind::BinaryOperator { opcode, .. }
                if opcode.is_logical() && builtin.is_boolean() =>
            {
                Some(*opcode)
            }
            _ => None,
        };
        let mutation = Mutation::ReplaceExpr(ReplaceExpr {
            expr_range: range,
            ty: builtin,
            is_lvalue: info.is_lvalue(),
            is_constant: info.is_cxx11_constant,
            logical_root,
            info: SourceRangeInfo::new(range, &self.unit.source, &self.line_index),
        });
        self.add_mutation(node, mutation);
    }

    /// The `c ? Foo(...) : enum_constant` pattern: mutating the implicit
    /// enum-to-int conversion makes overload resolution ambiguous when `Foo`
    /// also overloads `operator int`.
    fn is_conversion_of_enum_to_constructor(&self, node: Node<'a>) -> bool {
        if !matches!(node.kind(), NodeKind::ImplicitCastExpr) {
            return false;
        }
        if !node
            .parent()
            .is_some_and(|parent| matches!(parent.kind(), NodeKind::ConstructExpr))
        {
            return false;
        }
        node.child(0)
            .is_some_and(|sub| matches!(sub.kind(), NodeKind::DeclRefExpr { to_enum_constant: true }))
    }

    fn handle_unary_operator(&mut self, node: Node<'a>, range: SourceRange, info: &ExprInfo) {
        let NodeKind::UnaryOperator { opcode, op_range } = node.kind() else {
            return;
        };
        let opcode = *opcode;
        let op_range = *op_range;
        if opcode == UnaryOpcode::Plus {
            // Unary plus is indistinguishable from inserting an identity
            // operator.
            return;
        }
        if !matches!(
            opcode,
            UnaryOpcode::Minus
                | UnaryOpcode::Not
                | UnaryOpcode::LNot
                | UnaryOpcode::PreInc
                | UnaryOpcode::PostInc
                | UnaryOpcode::PreDec
                | UnaryOpcode::PostDec
        ) {
            return;
        }
        let Some(operand) = node.child(0) else {
            return;
        };
        let (Some(operand_range), Some(operand_info)) = (operand.range(), operand.expr()) else {
            return;
        };
        let Some(operand_type) = operand_info.ty.as_builtin() else {
            return;
        };
        if !range.contains(op_range) {
            return;
        }
        if opcode.is_increment_or_decrement() && operand_info.refers_to_bitfield {
            // The dispatcher needs the operand by reference, and bit-fields
            // cannot be passed that way.
            return;
        }
        if self.options.optimise_mutations {
            if opcode == UnaryOpcode::Minus
                && (Self::equivalent_to_int(operand_info, 1)
                    || Self::equivalent_to_float(operand_info, 1.0))
            {
                return;
            }
            if opcode == UnaryOpcode::Not
                && (Self::equivalent_to_int(operand_info, 0)
                    || Self::equivalent_to_int(operand_info, 1)
                    || Self::equivalent_to_float(operand_info, 0.0)
                    || Self::equivalent_to_float(operand_info, 1.0))
            {
                return;
            }
        }
        let Some(result_type) = info.ty.as_builtin() else {
            return;
        };
        let mutation = Mutation::ReplaceUnary(ReplaceUnary {
            opcode,
            expr_range: range,
            op_range,
            operand_range,
            operand_type,
            result_type,
            expr_is_lvalue: info.is_lvalue(),
            operand_is_lvalue: operand_info.is_lvalue(),
            operand_is_volatile: operand_info.ty.is_volatile,
            info: SourceRangeInfo::new(range, &self.unit.source, &self.line_index),
        });
        self.add_mutation(node, mutation);
    }

    fn handle_binary_operator(&mut self, node: Node<'a>, range: SourceRange, info: &ExprInfo) {
        let NodeKind::BinaryOperator { opcode, op_range } = node.kind() else {
            return;
        };
        let opcode = *opcode;
        let op_range = *op_range;
        if opcode == BinaryOpcode::Comma {
            // The comma operator is too versatile for rewriting to make
            // sense.
            return;
        }
        if !is_supported_opcode(opcode) {
            return;
        }
        let (Some(lhs), Some(rhs)) = (node.child(0), node.child(1)) else {
            return;
        };
        let (Some(lhs_range), Some(lhs_info)) = (lhs.range(), lhs.expr()) else {
            return;
        };
        let (Some(rhs_range), Some(rhs_info)) = (rhs.range(), rhs.expr()) else {
            return;
        };
        let (Some(lhs_type), Some(rhs_type)) =
            (lhs_info.ty.as_builtin(), rhs_info.ty.as_builtin())
        else {
            return;
        };
        let Some(result_type) = info.ty.as_builtin() else {
            return;
        };
        if !range.contains(op_range) {
            return;
        }
        if opcode.is_assignment() && lhs_info.refers_to_bitfield {
            return;
        }
        if self.options.optimise_mutations
            && (Self::equivalent_to_int(lhs_info, 0) || Self::equivalent_to_float(lhs_info, 0.0))
            && (Self::equivalent_to_int(rhs_info, 1) || Self::equivalent_to_float(rhs_info, 1.0))
        {
            // Every replacement collapses into a constant; expression
            // replacement already covers those.
            return;
        }
        let mutation = Mutation::ReplaceBinary(ReplaceBinary {
            opcode,
            op_range,
            lhs_range,
            rhs_range,
            lhs_type,
            rhs_type,
            result_type,
            lhs_is_lvalue: lhs_info.is_lvalue(),
            lhs_has_side_effects: lhs_info.has_side_effects,
            lhs_is_constant: lhs_info.is_cxx11_constant,
            rhs_is_constant: rhs_info.is_cxx11_constant,
            lhs_value: lhs_info.value,
            rhs_value: rhs_info.value,
            info: SourceRangeInfo::new(range, &self.unit.source, &self.line_index),
        });
        self.add_mutation(node, mutation);
    }
}
