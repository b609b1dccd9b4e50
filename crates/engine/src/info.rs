// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Mutation Info Serialization
//!
//! The id-tree projection of the mutation tree, reported per file as JSON:
//!
//! ```json
//! { "files": [ { "filename": "...",
//!                "mutation_tree": { "ids": [...], "children": [ ... ] } } ] }
//! ```
//!
//! Downstream test runners parse this to discover mutant ids and the mutual
//! exclusions encoded by ancestor-descendant relations.

use serde::{Deserialize, Serialize};

/// One node of the id tree: the ids assigned to this scope's descriptors and
/// the child scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationIdTreeNode {
    pub ids: Vec<u32>,
    pub children: Vec<MutationIdTreeNode>,
}

impl MutationIdTreeNode {
    /// All ids in the subtree, pre-order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<u32> {
        let mut ids = self.ids.clone();
        for child in &self.children {
            ids.extend(child.all_ids());
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationInfoForFile {
    pub filename: String,
    pub mutation_tree: MutationIdTreeNode,
}

/// The whole run's mutation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationInfo {
    pub files: Vec<MutationInfoForFile>,
}

impl MutationInfo {
    pub fn add_file(&mut self, filename: String, mutation_tree: MutationIdTreeNode) {
        self.files.push(MutationInfoForFile {
            filename,
            mutation_tree,
        });
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
