// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # Mutation Tree
//!
//! Mutations are arranged in a tree that mirrors the syntactic scopes entered
//! during traversal. Mutations in ancestor-descendant relation are mutually
//! exclusive (enabling one makes the other unreachable or meaningless);
//! sibling subtrees are independent. After traversal the tree is tidied:
//! empty subtrees are pruned and chains of descriptorless single-child nodes
//! are compressed, so the serialized tree stays small.

use crate::mutations::Mutation;

/// Index of a node in the [`MutationTree`] arena; the root is node 0.
pub type TreeNodeId = usize;

#[derive(Debug, Default)]
pub struct TreeNode {
    pub mutations: Vec<Mutation>,
    pub children: Vec<TreeNodeId>,
}

/// Arena-backed mutation tree built during traversal.
#[derive(Debug)]
pub struct MutationTree {
    nodes: Vec<TreeNode>,
}

impl Default for MutationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationTree {
    pub const ROOT: TreeNodeId = 0;

    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::default()],
        }
    }

    pub fn add_child(&mut self, parent: TreeNodeId) -> TreeNodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::default());
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_mutation(&mut self, node: TreeNodeId, mutation: Mutation) {
        self.nodes[node].mutations.push(mutation);
    }

    #[must_use]
    pub fn node(&self, id: TreeNodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Total number of mutations in the whole tree.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.nodes.iter().map(|node| node.mutations.len()).sum()
    }

    /// Prunes empty subtrees, then compresses descriptorless single-child
    /// chains into their children.
    pub fn tidy_up(&mut self) {
        self.prune_empty_subtrees(Self::ROOT);
        self.compress(Self::ROOT);
    }

    fn is_empty_subtree(&self, id: TreeNodeId) -> bool {
        self.nodes[id].mutations.is_empty()
            && self.nodes[id]
                .children
                .iter()
                .all(|&child| self.is_empty_subtree(child))
    }

    fn prune_empty_subtrees(&mut self, id: TreeNodeId) {
        let children = std::mem::take(&mut self.nodes[id].children);
        let kept: Vec<TreeNodeId> = children
            .into_iter()
            .filter(|&child| !self.is_empty_subtree(child))
            .collect();
        for &child in &kept {
            self.prune_empty_subtrees(child);
        }
        self.nodes[id].children = kept;
    }

    fn compress(&mut self, id: TreeNodeId) {
        while self.nodes[id].mutations.is_empty() && self.nodes[id].children.len() == 1 {
            let child = self.nodes[id].children[0];
            let child_mutations = std::mem::take(&mut self.nodes[child].mutations);
            let child_children = std::mem::take(&mut self.nodes[child].children);
            self.nodes[id].mutations = child_mutations;
            self.nodes[id].children = child_children;
        }
        let children = self.nodes[id].children.clone();
        for child in children {
            self.compress(child);
        }
    }
}
