// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Cross-File Coordinator
//!
//! Carries the monotonic mutation-id counter across translation units,
//! refuses to process the same file twice, and accumulates the run's
//! mutation info. Units are processed sequentially; the counter is atomic so
//! independent engine instances can share it when units are farmed out.

use crate::apply::{mutate_unit, MutatedUnit};
use crate::error::Result;
use crate::info::MutationInfo;
use crate::options::Options;
use graft_ast::TranslationUnit;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct Coordinator {
    options: Options,
    next_mutation_id: AtomicU32,
    processed_files: HashSet<String>,
    info: MutationInfo,
}

impl Coordinator {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self::with_initial_id(options, 0)
    }

    #[must_use]
    pub fn with_initial_id(options: Options, initial_mutation_id: u32) -> Self {
        Self {
            options,
            next_mutation_id: AtomicU32::new(initial_mutation_id),
            processed_files: HashSet::new(),
            info: MutationInfo::default(),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Current value of the shared id counter.
    #[must_use]
    pub fn next_mutation_id(&self) -> u32 {
        self.next_mutation_id.load(Ordering::SeqCst)
    }

    /// Mutates one translation unit. Returns `Ok(None)` for a repeat visit
    /// of a file already processed (logged as a warning); errors abort only
    /// this file and the caller decides whether to continue.
    pub fn process_unit(&mut self, unit: &TranslationUnit) -> Result<Option<MutatedUnit>> {
        if !self.processed_files.insert(unit.filename.clone()) {
            log::warn!(
                "already processed {}; skipping repeat occurrence",
                unit.filename
            );
            return Ok(None);
        }
        let first_mutation_id = self.next_mutation_id();
        let mutated = mutate_unit(unit, &self.options, first_mutation_id)?;
        self.next_mutation_id
            .fetch_add(mutated.mutation_count, Ordering::SeqCst);
        self.info
            .add_file(unit.filename.clone(), mutated.mutation_id_tree.clone());
        Ok(Some(mutated))
    }

    #[must_use]
    pub const fn mutation_info(&self) -> &MutationInfo {
        &self.info
    }

    #[must_use]
    pub fn into_mutation_info(self) -> MutationInfo {
        self.info
    }
}
