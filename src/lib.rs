// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Graft - a dynamic mutation engine for C and C++.
//!
//! This is the main library crate that re-exports functionality from the
//! component crates in the workspace.

// Re-export core functionality
pub use graft_engine as engine;

// Re-export other major components
pub use graft_ast as ast;
pub use graft_rewrite as rewrite;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
