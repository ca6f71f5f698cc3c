// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the direct children of a node.
///
/// Created by [`NodeStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a NodeStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(NodeId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}

/// A depth-first pre-order iterator over a node and its descendants.
///
/// Created by [`NodeStore::subtree`]. Walks sibling links without
/// allocating.
#[derive(Debug)]
pub struct Subtree<'a> {
    store: &'a NodeStore,
    root: u32,
    current: u32,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(store: &'a NodeStore, root: u32) -> Self {
        Self {
            store,
            root,
            current: root,
        }
    }

    /// Pre-order successor of `idx` that stays inside the subtree.
    fn advance(&self, idx: u32) -> u32 {
        let first = self.store.first_child[idx as usize];
        if first != INVALID {
            return first;
        }
        let mut cur = idx;
        while cur != self.root {
            let next = self.store.next_sibling[cur as usize];
            if next != INVALID {
                return next;
            }
            cur = self.store.parent[cur as usize];
        }
        INVALID
    }
}

impl Iterator for Subtree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.advance(idx);
        Some(NodeId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}
