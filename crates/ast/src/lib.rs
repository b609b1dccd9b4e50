// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Typed C/C++ AST Model
//!
//! The data model an external parser frontend hands to the mutation engine.
//! Graft does not parse C or C++ itself: a frontend (typically a thin
//! Clang-based exporter) serializes one translation unit per source file into
//! this model, and the engine consumes it.
//!
//! ## Key Concepts
//!
//! ### Translation units ([`TranslationUnit`])
//! One source file together with its language options, the main-file source
//! text, the parser's diagnostics, and the attributed AST.
//!
//! ### Nodes ([`Node`], [`NodeKind`])
//! The AST is an arena of nodes whose kinds form a closed sum type covering
//! exactly the constructs the engine distinguishes. Semantic attributes the
//! engine needs (type, value category, constant-expression status, bit-field
//! references, side effects, compile-time value) are recorded per expression
//! by the frontend rather than recomputed here.
//!
//! ### Source ranges ([`SourceRange`])
//! Half-open byte ranges over the *main file* only. A node whose spelling has
//! no main-file representation (it lives in a header, or in a macro whose
//! expansion does not map cleanly back into the main file) carries no range
//! and is never mutated.

pub mod context;
pub mod eval;
pub mod node;
pub mod scan;
pub mod source;
pub mod types;

pub use context::{Diagnostic, LangOptions, Severity, TranslationUnit};
pub use eval::EvalValue;
pub use node::{
    Ast, AstBuilder, BinaryOpcode, CallInfo, ExprInfo, Node, NodeId, NodeKind, SizeofKind,
    UnaryOpcode, ValueCategory,
};
pub use source::{LineIndex, Position, SourceRange, SourceRangeInfo};
pub use types::{BuiltinType, QualType, Type};
