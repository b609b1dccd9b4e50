// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Translation-Unit Context
//!
//! Everything the engine needs to know about one parsed source file: the
//! main-file text, the language options, the frontend's diagnostics, and the
//! attributed AST. This is also the serialized interchange format between an
//! external parser frontend and the `graft` driver.

use crate::node::Ast;
use crate::source::LineIndex;
use serde::{Deserialize, Serialize};

/// Language options of the translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LangOptions {
    /// C++ when set, C otherwise. Dispatcher generation and call-site
    /// rewrites branch on this.
    #[serde(default)]
    pub is_cpp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

/// One diagnostic reported by the parser frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// One translation unit handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path of the main file, as reported in the mutation info.
    pub filename: String,
    /// Main-file source text. Header content is never included; nodes from
    /// headers simply carry no main-file range.
    pub source: String,
    #[serde(default)]
    pub lang: LangOptions,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    pub ast: Ast,
}

impl TranslationUnit {
    /// Errors from the parser mean the unit must be skipped entirely.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity >= Severity::Error)
    }

    #[must_use]
    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AstBuilder;

    #[test]
    fn error_detection() {
        let mut unit = TranslationUnit {
            filename: "a.c".to_string(),
            source: String::new(),
            lang: LangOptions::default(),
            diagnostics: vec![Diagnostic {
                severity: Severity::Warning,
                message: "unused variable".to_string(),
            }],
            ast: AstBuilder::new().finish(),
        };
        assert!(!unit.has_errors());
        unit.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: "expected ';'".to_string(),
        });
        assert!(unit.has_errors());
    }
}
