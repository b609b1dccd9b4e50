// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Compile-time values recorded by the frontend's constant evaluator.
//!
//! The engine never evaluates C/C++ expressions itself; when the parser's
//! evaluator succeeds on an expression that is not value-dependent, the
//! frontend stores the result on the expression node. The helpers here
//! implement the "equivalent to K" notion used by the optimisation filters:
//! the recorded value equals the literal under the expression's own type,
//! ignoring truncation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EvalValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl EvalValue {
    /// True when the value equals the integer `k`. Booleans participate with
    /// their usual integer promotion, as the parser's integer evaluator
    /// succeeds on boolean expressions.
    #[must_use]
    pub fn is_int(self, k: i64) -> bool {
        match self {
            Self::Int(value) => value == k,
            Self::Bool(value) => i64::from(value) == k,
            Self::Float(_) => false,
        }
    }

    #[must_use]
    pub fn is_float(self, k: f64) -> bool {
        match self {
            Self::Float(value) => value == k,
            Self::Int(_) | Self::Bool(_) => false,
        }
    }

    /// Decimal literal spelling used when a constant context forces an
    /// expression to be replaced by its value.
    #[must_use]
    pub fn literal_text(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Bool(value) => i64::from(value).to_string(),
            Self::Float(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{value:.1}")
                } else {
                    value.to_string()
                }
            }
        }
    }
}
