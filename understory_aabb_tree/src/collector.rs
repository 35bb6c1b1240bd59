// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visitor traits that query traversals report to.
//!
//! A traversal never allocates result storage of its own: it hands each hit to
//! a [`Collector`] (single-tree queries) or a [`PairCollector`] (tree-vs-tree).
//! Both traits have optional predicates that let the caller prune or
//! bulk-accept whole subtrees; they are consulted before the traversal
//! descends into an internal node, so returning `false` from
//! [`Collector::descent`] is also how a query is stopped early.
//!
//! Closures implement both traits, which covers most call sites:
//!
//! ```rust
//! use glam::Vec3;
//! use understory_aabb_tree::{AabbTree, Leaf, Volume};
//!
//! let mut tree: AabbTree<u32> = AabbTree::new();
//! let _ = tree.insert(Volume::from_min_max(Vec3::ZERO, Vec3::ONE), 7);
//!
//! let mut hits = 0;
//! tree.collide_tree_volume(&Volume::from_point(Vec3::splat(0.5)), &mut |leaf: Leaf<u32>| {
//!     assert_eq!(leaf.payload, 7);
//!     hits += 1;
//! });
//! assert_eq!(hits, 1);
//! ```

use crate::arena::{LeafId, NodeId};
use crate::types::Volume;

/// A leaf as seen by a collector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Leaf<P> {
    /// Handle of the leaf in the tree being traversed.
    pub id: LeafId,
    /// The leaf's stored (possibly fattened) volume.
    pub volume: Volume,
    /// The payload handle given at insertion.
    pub payload: P,
}

/// Any node (leaf or internal) as seen by collector predicates, enumeration and writers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeRef<P> {
    /// Node identity. Compare these, never volumes, to tell nodes apart.
    pub id: NodeId,
    /// The node's volume.
    pub volume: Volume,
    /// The payload for leaves, `None` for internal nodes.
    pub payload: Option<P>,
}

impl<P> NodeRef<P> {
    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.payload.is_some()
    }
}

/// Receives the leaves found by a single-tree query.
pub trait Collector<P> {
    /// Report a hit.
    fn process(&mut self, leaf: Leaf<P>);

    /// Whether to descend into an internal node that passed the query's test.
    ///
    /// Returning `false` skips the whole subtree.
    fn descent(&mut self, node: &NodeRef<P>) -> bool {
        let _ = node;
        true
    }

    /// Whether every leaf under an internal node should be reported without
    /// further tests.
    fn all_leaves(&mut self, node: &NodeRef<P>) -> bool {
        let _ = node;
        false
    }
}

impl<P, F: FnMut(Leaf<P>)> Collector<P> for F {
    fn process(&mut self, leaf: Leaf<P>) {
        self(leaf);
    }
}

/// Receives the overlapping leaf pairs found by a tree-vs-tree query.
pub trait PairCollector<A, B> {
    /// Report an overlapping pair; `a` comes from the first tree, `b` from the second.
    fn process(&mut self, a: Leaf<A>, b: Leaf<B>);

    /// Whether to expand an overlapping node pair where at least one side is internal.
    ///
    /// Returning `false` skips every pair below it.
    fn descent(&mut self, a: &NodeRef<A>, b: &NodeRef<B>) -> bool {
        let _ = (a, b);
        true
    }
}

impl<A, B, F: FnMut(Leaf<A>, Leaf<B>)> PairCollector<A, B> for F {
    fn process(&mut self, a: Leaf<A>, b: Leaf<B>) {
        self(a, b);
    }
}
