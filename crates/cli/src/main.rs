// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The `graft` driver.
//!
//! Consumes translation-unit bundles - JSON documents produced by a parser
//! frontend, containing the main-file source, language options, diagnostics
//! and the attributed AST - mutates each unit in place, and writes the
//! mutation-info JSON for the whole run.
//!
//! Exit code is nonzero when any unit failed to parse or rewrite; failures
//! abort only the unit they occur in.

use anyhow::Context;
use clap::Parser;
use graft_ast::TranslationUnit;
use graft_engine::{Coordinator, Options};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "graft", version, about = "Dynamic mutation instrumentation for C and C++")]
struct Args {
    /// Translation-unit bundles (JSON) to mutate; the rewritten source is
    /// written back to each bundle's main file.
    #[arg(required = true, value_name = "BUNDLE")]
    files: Vec<PathBuf>,

    /// Disable the optimisations that suppress likely-redundant mutants.
    #[arg(long)]
    no_mutation_opts: bool,

    /// Instrument for mutant-coverage tracking instead of mutant selection.
    #[arg(long)]
    only_track_mutant_coverage: bool,

    /// Path for the mutation-info JSON report.
    #[arg(long, value_name = "PATH")]
    mutation_info_file: Option<PathBuf>,

    /// Dump each translation unit's AST to stderr (debugging aid).
    #[arg(long)]
    dump_asts: bool,

    /// Log the AST node kind of every mutation added (debugging aid).
    #[arg(long)]
    show_ast_node_types: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::error!("{failed} translation unit(s) failed");
            ExitCode::FAILURE
        }
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<usize> {
    let options = Options {
        optimise_mutations: !args.no_mutation_opts,
        only_track_mutant_coverage: args.only_track_mutant_coverage,
        dump_asts: args.dump_asts,
        show_ast_node_types: args.show_ast_node_types,
    };
    let mut coordinator = Coordinator::new(options);
    let mut failures = 0usize;
    for path in &args.files {
        if let Err(error) = process_bundle(path, &mut coordinator) {
            log::error!("{}: {error:#}", path.display());
            failures += 1;
        }
    }
    if let Some(info_path) = &args.mutation_info_file {
        let json = coordinator.mutation_info().to_json()?;
        std::fs::write(info_path, json + "\n")
            .with_context(|| format!("writing {}", info_path.display()))?;
    }
    Ok(failures)
}

fn process_bundle(path: &Path, coordinator: &mut Coordinator) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let unit: TranslationUnit = serde_json::from_str(&text)
        .with_context(|| format!("decoding translation unit from {}", path.display()))?;
    if let Some(mutated) = coordinator.process_unit(&unit)? {
        std::fs::write(&unit.filename, &mutated.rewritten_source)
            .with_context(|| format!("writing rewritten source to {}", unit.filename))?;
        log::info!(
            "{}: {} mutation(s) applied",
            unit.filename,
            mutated.mutation_count
        );
    }
    Ok(())
}
