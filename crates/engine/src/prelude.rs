// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Prelude Synthesis
//!
//! Assembles the block of generated code inserted at the top of a rewritten
//! file: runtime forward declarations, helper macros, and every deduplicated
//! dispatcher definition. The runtime itself is external; the instrumented
//! program links against `__dredd_enabled_mutation`,
//! `__dredd_some_mutation_enabled` and (in coverage mode)
//! `__dredd_record_covered_mutants`.

use crate::mutations::DeclSet;
use crate::options::Options;
use graft_ast::LangOptions;

#[must_use]
pub fn build_prelude(
    lang: LangOptions,
    options: &Options,
    macros: &DeclSet,
    declarations: &DeclSet,
) -> String {
    let mut prelude = String::new();
    if lang.is_cpp {
        prelude.push_str("#include <functional>\n\n");
        if options.only_track_mutant_coverage {
            prelude.push_str(
                "extern \"C\" void __dredd_record_covered_mutants(int local_mutation_id, int num_mutations);\n\n",
            );
        } else {
            prelude.push_str("extern \"C\" int __dredd_enabled_mutation(int local_mutation_id);\n");
            prelude.push_str("extern \"C\" volatile bool __dredd_some_mutation_enabled;\n\n");
        }
    } else if options.only_track_mutant_coverage {
        prelude.push_str(
            "void __dredd_record_covered_mutants(int local_mutation_id, int num_mutations);\n\n",
        );
    } else {
        prelude.push_str("int __dredd_enabled_mutation(int local_mutation_id);\n");
        prelude.push_str("extern volatile int __dredd_some_mutation_enabled;\n\n");
    }
    for helper_macro in macros.iter() {
        prelude.push_str(helper_macro);
    }
    for declaration in declarations.iter() {
        prelude.push_str(declaration);
    }
    prelude
}
