// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Engine error types.
//!
//! Per-candidate problems (unsupported types, ranges outside the main file)
//! are silent skips and never surface here; these errors are the per-file
//! failures that abort one translation unit while the run continues.

use graft_rewrite::RewriteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The frontend reported error-severity diagnostics; the unit is skipped
    /// and no partial rewrite is emitted.
    #[error("parse errors in {filename}; no rewrite emitted")]
    ParseFailed { filename: String },

    /// An invariant violation in the rewrite plan for one file.
    #[error("rewrite conflict in {filename}: {source}")]
    RewriteConflict {
        filename: String,
        #[source]
        source: RewriteError,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
