// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Graft Mutation Engine
//!
//! Rewrites C/C++ translation units so that a large family of syntactic
//! mutations can be enabled dynamically at runtime, and reports every
//! introduced mutation as JSON.
//!
//! ## Pipeline
//!
//! For each translation unit (parsed externally into the `graft-ast` model):
//!
//! 1. [`visitor::MutateVisitor`] walks the AST, applies the admissibility
//!    guards, and builds a [`tree::MutationTree`] mirroring syntactic scope.
//! 2. The application pass ([`apply::mutate_unit`]) walks the tidied tree in
//!    pre-order; each descriptor claims a contiguous id block, rewrites its
//!    call site through `graft-rewrite`, and registers its dispatcher.
//! 3. Constant-demanding contexts are rewritten to literal values and the
//!    prelude (runtime declarations plus dispatchers) is inserted.
//! 4. [`coordinator::Coordinator`] carries the id counter across units and
//!    accumulates the [`info::MutationInfo`] JSON report.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut coordinator = Coordinator::new(Options::default());
//! for unit in units {
//!     match coordinator.process_unit(&unit) {
//!         Ok(Some(mutated)) => std::fs::write(&unit.filename, mutated.rewritten_source)?,
//!         Ok(None) => {}                       // repeat visit, skipped
//!         Err(error) => log::error!("{error}"), // this unit aborted
//!     }
//! }
//! let json = coordinator.mutation_info().to_json()?;
//! ```

pub mod apply;
pub mod coordinator;
pub mod error;
pub mod info;
pub mod mutations;
pub mod options;
pub mod prelude;
pub mod tree;
pub mod visitor;

pub use apply::{mutate_unit, MutatedUnit};
pub use coordinator::Coordinator;
pub use error::{EngineError, Result};
pub use info::{MutationIdTreeNode, MutationInfo, MutationInfoForFile};
pub use mutations::{DeclSet, Mutation, RemoveStmt, ReplaceBinary, ReplaceExpr, ReplaceUnary};
pub use options::Options;
pub use tree::MutationTree;
pub use visitor::{MutateVisitor, VisitOutcome};
