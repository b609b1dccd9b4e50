// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # AST Nodes and Navigation
//!
//! The AST is a flat arena of [`NodeData`] records indexed by [`NodeId`];
//! [`Node`] is a borrowed handle offering navigation (parent, children,
//! ancestors) over the arena. Node kinds form a closed sum type: the engine
//! dispatches over exactly the constructs that affect mutation admissibility,
//! and everything else collapses into the `Other*` kinds.
//!
//! Semantic attributes of expressions (type, value category, constancy,
//! bit-field references, side effects, evaluated value) are recorded by the
//! frontend in [`ExprInfo`]; the engine treats them as ground truth.

use crate::eval::EvalValue;
use crate::source::SourceRange;
use crate::types::QualType;
use serde::{Deserialize, Serialize};

/// Index of a node in its [`Ast`] arena. The translation unit root is always
/// node 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Unary operator opcodes, named as a C/C++ parser names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOpcode {
    Plus,
    Minus,
    /// Bitwise complement `~`.
    Not,
    /// Logical negation `!`.
    LNot,
    PreInc,
    PostInc,
    PreDec,
    PostDec,
    Deref,
    AddrOf,
    Other,
}

impl UnaryOpcode {
    #[must_use]
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "~",
            Self::LNot => "!",
            Self::PreInc | Self::PostInc => "++",
            Self::PreDec | Self::PostDec => "--",
            Self::Deref => "*",
            Self::AddrOf => "&",
            Self::Other => "",
        }
    }

    /// The opcode's name as used in dispatcher function names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plus => "Plus",
            Self::Minus => "Minus",
            Self::Not => "Not",
            Self::LNot => "LNot",
            Self::PreInc => "PreInc",
            Self::PostInc => "PostInc",
            Self::PreDec => "PreDec",
            Self::PostDec => "PostDec",
            Self::Deref => "Deref",
            Self::AddrOf => "AddrOf",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub const fn is_increment_or_decrement(self) -> bool {
        matches!(
            self,
            Self::PreInc | Self::PostInc | Self::PreDec | Self::PostDec
        )
    }

    #[must_use]
    pub const fn is_prefix(self) -> bool {
        !matches!(self, Self::PostInc | Self::PostDec)
    }
}

/// Binary operator opcodes, named as a C/C++ parser names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    LAnd,
    LOr,
    EQ,
    NE,
    LT,
    GT,
    LE,
    GE,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    Comma,
}

impl BinaryOpcode {
    #[must_use]
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::LAnd => "&&",
            Self::LOr => "||",
            Self::EQ => "==",
            Self::NE => "!=",
            Self::LT => "<",
            Self::GT => ">",
            Self::LE => "<=",
            Self::GE => ">=",
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::RemAssign => "%=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::XorAssign => "^=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::Comma => ",",
        }
    }

    /// The opcode's name as used in dispatcher function names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
            Self::Rem => "Rem",
            Self::Shl => "Shl",
            Self::Shr => "Shr",
            Self::And => "And",
            Self::Or => "Or",
            Self::Xor => "Xor",
            Self::LAnd => "LAnd",
            Self::LOr => "LOr",
            Self::EQ => "EQ",
            Self::NE => "NE",
            Self::LT => "LT",
            Self::GT => "GT",
            Self::LE => "LE",
            Self::GE => "GE",
            Self::Assign => "Assign",
            Self::AddAssign => "AddAssign",
            Self::SubAssign => "SubAssign",
            Self::MulAssign => "MulAssign",
            Self::DivAssign => "DivAssign",
            Self::RemAssign => "RemAssign",
            Self::AndAssign => "AndAssign",
            Self::OrAssign => "OrAssign",
            Self::XorAssign => "XorAssign",
            Self::ShlAssign => "ShlAssign",
            Self::ShrAssign => "ShrAssign",
            Self::Comma => "Comma",
        }
    }

    #[must_use]
    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::AddAssign
                | Self::SubAssign
                | Self::MulAssign
                | Self::DivAssign
                | Self::RemAssign
                | Self::AndAssign
                | Self::OrAssign
                | Self::XorAssign
                | Self::ShlAssign
                | Self::ShrAssign
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::LAnd | Self::LOr)
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::EQ | Self::NE | Self::LT | Self::GT | Self::LE | Self::GE
        )
    }

    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem
        )
    }
}

/// Value category of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueCategory {
    #[default]
    RValue,
    LValue,
}

/// Call-expression attributes the guard engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallInfo {
    /// The callee was found through argument-dependent lookup.
    #[serde(default)]
    pub uses_adl: bool,
    /// A C++ member call (`obj.f(...)`).
    #[serde(default)]
    pub is_member_call: bool,
    /// The callee is `__builtin_frame_address`, whose argument must stay a
    /// compile-time constant.
    #[serde(default)]
    pub is_builtin_frame_address: bool,
}

/// Distinguishes `sizeof`/`alignof` from the other unary type traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeofKind {
    SizeOf,
    AlignOf,
    Other,
}

/// Frontend-recorded semantic attributes of an expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprInfo {
    pub ty: QualType,
    #[serde(default)]
    pub category: ValueCategory,
    /// The expression is a C++11 constant expression.
    #[serde(default)]
    pub is_cxx11_constant: bool,
    #[serde(default)]
    pub refers_to_bitfield: bool,
    #[serde(default)]
    pub has_side_effects: bool,
    #[serde(default)]
    pub is_null_pointer_constant: bool,
    /// Compile-time value, when the parser's evaluator succeeded and the
    /// expression is not value-dependent.
    #[serde(default)]
    pub value: Option<EvalValue>,
}

impl ExprInfo {
    #[must_use]
    pub const fn new(ty: QualType) -> Self {
        Self {
            ty,
            category: ValueCategory::RValue,
            is_cxx11_constant: false,
            refers_to_bitfield: false,
            has_side_effects: false,
            is_null_pointer_constant: false,
            value: None,
        }
    }

    #[must_use]
    pub const fn lvalue(mut self) -> Self {
        self.category = ValueCategory::LValue;
        self
    }

    #[must_use]
    pub const fn constant(mut self) -> Self {
        self.is_cxx11_constant = true;
        self
    }

    #[must_use]
    pub const fn with_value(mut self, value: EvalValue) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub const fn side_effects(mut self) -> Self {
        self.has_side_effects = true;
        self
    }

    #[must_use]
    pub const fn bitfield(mut self) -> Self {
        self.refers_to_bitfield = true;
        self
    }

    #[must_use]
    pub const fn null_pointer(mut self) -> Self {
        self.is_null_pointer_constant = true;
        self
    }

    #[must_use]
    pub const fn is_lvalue(&self) -> bool {
        matches!(self.category, ValueCategory::LValue)
    }
}

/// The closed sum of node kinds the engine dispatches over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations.
    TranslationUnit,
    FunctionDecl {
        name: String,
        #[serde(default)]
        is_constexpr: bool,
    },
    VarDecl {
        name: String,
        /// Begin offset of the declared name; expressions starting here are
        /// aliases of the declaration (e.g. `if (auto v = ...)`).
        name_loc: Option<u32>,
        ty: QualType,
        #[serde(default)]
        is_constexpr: bool,
        /// Carries a `constinit`-style constant-initialization requirement.
        #[serde(default)]
        has_constant_initializer: bool,
        #[serde(default)]
        is_static_local: bool,
    },
    ParamDecl,
    FieldDecl {
        ty: QualType,
    },
    /// `static_assert(cond, ...)`; the condition is the first child.
    StaticAssertDecl,
    RecordDecl {
        name: String,
    },
    OtherDecl,

    // Statements.
    CompoundStmt,
    NullStmt,
    DeclStmt,
    LabelStmt,
    /// `case expr:` / `default:`; the labelled statement is the last child,
    /// the case expression (if any) comes before it.
    SwitchCase {
        is_default: bool,
    },
    /// `if`; children are condition, then-branch, optional else-branch.
    IfStmt {
        is_constexpr: bool,
    },
    OtherStmt,

    // Expressions.
    UnaryOperator {
        opcode: UnaryOpcode,
        op_range: SourceRange,
    },
    /// Children are LHS then RHS; `op_range` covers the operator token.
    BinaryOperator {
        opcode: BinaryOpcode,
        op_range: SourceRange,
    },
    ParenExpr,
    CallExpr(CallInfo),
    ImplicitCastExpr,
    ExplicitCastExpr,
    DeclRefExpr {
        #[serde(default)]
        to_enum_constant: bool,
    },
    InitListExpr,
    MaterializeTemporaryExpr,
    /// Member access; the base expression is the first child.
    MemberExpr,
    /// Parser wrapper marking a manifestly constant-evaluated subexpression.
    ConstantExpr,
    UserDefinedLiteral,
    ExprWithCleanups,
    NoexceptExpr,
    SizeofExpr {
        kind: SizeofKind,
    },
    /// C++ `new`; when `has_array_size` is set the size expression is the
    /// first child.
    NewExpr {
        has_array_size: bool,
    },
    ConstructExpr,
    /// Lambda expression; the first `capture_init_count` children are
    /// capture initializers, the rest is the body.
    LambdaExpr {
        capture_init_count: u32,
    },
    Literal,
    OtherExpr,

    // Type locations attached to declarations.
    /// Constant-sized array type; the size expression is the first child.
    ConstantArrayTypeLoc,
    VariableArrayTypeLoc,
    DependentSizedArrayTypeLoc,
    /// Template argument written in source; expression arguments appear as
    /// children.
    TemplateArgumentLoc,
}

impl NodeKind {
    /// Short kind name, used by the AST dump and debug logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TranslationUnit => "TranslationUnit",
            Self::FunctionDecl { .. } => "FunctionDecl",
            Self::VarDecl { .. } => "VarDecl",
            Self::ParamDecl => "ParamDecl",
            Self::FieldDecl { .. } => "FieldDecl",
            Self::StaticAssertDecl => "StaticAssertDecl",
            Self::RecordDecl { .. } => "RecordDecl",
            Self::OtherDecl => "OtherDecl",
            Self::CompoundStmt => "CompoundStmt",
            Self::NullStmt => "NullStmt",
            Self::DeclStmt => "DeclStmt",
            Self::LabelStmt => "LabelStmt",
            Self::SwitchCase { .. } => "SwitchCase",
            Self::IfStmt { .. } => "IfStmt",
            Self::OtherStmt => "OtherStmt",
            Self::UnaryOperator { .. } => "UnaryOperator",
            Self::BinaryOperator { .. } => "BinaryOperator",
            Self::ParenExpr => "ParenExpr",
            Self::CallExpr(_) => "CallExpr",
            Self::ImplicitCastExpr => "ImplicitCastExpr",
            Self::ExplicitCastExpr => "ExplicitCastExpr",
            Self::DeclRefExpr { .. } => "DeclRefExpr",
            Self::InitListExpr => "InitListExpr",
            Self::MaterializeTemporaryExpr => "MaterializeTemporaryExpr",
            Self::MemberExpr => "MemberExpr",
            Self::ConstantExpr => "ConstantExpr",
            Self::UserDefinedLiteral => "UserDefinedLiteral",
            Self::ExprWithCleanups => "ExprWithCleanups",
            Self::NoexceptExpr => "NoexceptExpr",
            Self::SizeofExpr { .. } => "SizeofExpr",
            Self::NewExpr { .. } => "NewExpr",
            Self::ConstructExpr => "ConstructExpr",
            Self::LambdaExpr { .. } => "LambdaExpr",
            Self::Literal => "Literal",
            Self::OtherExpr => "OtherExpr",
            Self::ConstantArrayTypeLoc => "ConstantArrayTypeLoc",
            Self::VariableArrayTypeLoc => "VariableArrayTypeLoc",
            Self::DependentSizedArrayTypeLoc => "DependentSizedArrayTypeLoc",
            Self::TemplateArgumentLoc => "TemplateArgumentLoc",
        }
    }

    #[must_use]
    pub const fn is_decl(&self) -> bool {
        matches!(
            self,
            Self::TranslationUnit
                | Self::FunctionDecl { .. }
                | Self::VarDecl { .. }
                | Self::ParamDecl
                | Self::FieldDecl { .. }
                | Self::StaticAssertDecl
                | Self::RecordDecl { .. }
                | Self::OtherDecl
        )
    }

    #[must_use]
    pub const fn is_expr(&self) -> bool {
        matches!(
            self,
            Self::UnaryOperator { .. }
                | Self::BinaryOperator { .. }
                | Self::ParenExpr
                | Self::CallExpr(_)
                | Self::ImplicitCastExpr
                | Self::ExplicitCastExpr
                | Self::DeclRefExpr { .. }
                | Self::InitListExpr
                | Self::MaterializeTemporaryExpr
                | Self::MemberExpr
                | Self::ConstantExpr
                | Self::UserDefinedLiteral
                | Self::ExprWithCleanups
                | Self::NoexceptExpr
                | Self::SizeofExpr { .. }
                | Self::NewExpr { .. }
                | Self::ConstructExpr
                | Self::LambdaExpr { .. }
                | Self::Literal
                | Self::OtherExpr
        )
    }

    #[must_use]
    pub const fn is_cast(&self) -> bool {
        matches!(self, Self::ImplicitCastExpr | Self::ExplicitCastExpr)
    }
}

/// One node record in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Main-file source range; `None` when the node has no usable main-file
    /// spelling (header code, or a macro expansion that does not map back
    /// cleanly).
    pub range: Option<SourceRange>,
    #[serde(default)]
    pub expr: Option<ExprInfo>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub parent: Option<NodeId>,
}

/// An attributed AST for one translation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<NodeData>,
}

impl Ast {
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.node(Self::ROOT)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { ast: self, id }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }
}

/// A borrowed handle to one node, tied to its arena.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> Node<'a> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &'a NodeKind {
        &self.ast.data(self.id).kind
    }

    /// Main-file source range, or `None` when the node must not be rewritten.
    #[must_use]
    pub fn range(&self) -> Option<SourceRange> {
        self.ast.data(self.id).range
    }

    #[must_use]
    pub fn expr(&self) -> Option<&'a ExprInfo> {
        self.ast.data(self.id).expr.as_ref()
    }

    #[must_use]
    pub fn ty(&self) -> Option<QualType> {
        self.expr().map(|info| info.ty)
    }

    #[must_use]
    pub fn is_lvalue(&self) -> bool {
        self.expr().is_some_and(ExprInfo::is_lvalue)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node<'a>> {
        self.ast.data(self.id).parent.map(|id| self.ast.node(id))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'a>> + use<'a> {
        let ast = self.ast;
        self.ast
            .data(self.id)
            .children
            .iter()
            .map(move |&id| ast.node(id))
    }

    #[must_use]
    pub fn child(&self, nth: usize) -> Option<Node<'a>> {
        self.ast
            .data(self.id)
            .children
            .get(nth)
            .map(|&id| self.ast.node(id))
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.ast.data(self.id).children.len()
    }

    /// Ancestors from the parent upwards, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> + use<'a> {
        let mut current = self.parent();
        std::iter::from_fn(move || {
            let node = current?;
            current = node.parent();
            Some(node)
        })
    }

    /// The nearest ancestor satisfying `predicate`.
    pub fn first_ancestor_where<P>(&self, predicate: P) -> Option<Node<'a>>
    where
        P: Fn(&Node<'a>) -> bool,
    {
        self.ancestors().find(|node| predicate(node))
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id.0)
            .field("kind", &self.kind().name())
            .field("range", &self.range())
            .finish()
    }
}

/// Arena builder used by frontends and tests.
///
/// Parents are wired automatically: `add` appends the new node to the given
/// parent's child list, in call order, which must be source order.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<NodeData>,
}

impl AstBuilder {
    /// Starts an AST with a translation-unit root as node 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::TranslationUnit,
                range: None,
                expr: None,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        Ast::ROOT
    }

    pub fn add(&mut self, parent: NodeId, kind: NodeKind, range: Option<SourceRange>) -> NodeId {
        self.add_node(parent, kind, range, None)
    }

    pub fn add_expr(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        range: Option<SourceRange>,
        info: ExprInfo,
    ) -> NodeId {
        self.add_node(parent, kind, range, Some(info))
    }

    fn add_node(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        range: Option<SourceRange>,
        expr: Option<ExprInfo>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            expr,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    #[must_use]
    pub fn finish(self) -> Ast {
        Ast { nodes: self.nodes }
    }
}
