// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only traversals: tree-vs-volume, tree-vs-plane, tree-vs-tree, and enumeration.
//!
//! All traversals are iterative. Single-tree queries keep their work stack in
//! a [`SmallVec`] with [`INLINE_STACK`] inline entries, which covers balanced
//! trees of any practical size without touching the heap and spills to the
//! heap for deeper ones. Tree-vs-tree queries use a [`PairStack`], which can
//! be kept around to reuse its buffer across calls.

use alloc::vec::Vec;

use glam::Vec3;
use smallvec::{SmallVec, smallvec};

use crate::arena::{LeafId, NodeIdx, NodeKind};
use crate::collector::{Collector, Leaf, NodeRef, PairCollector};
use crate::tree::AabbTree;
use crate::types::{Plane, Volume};

/// Inline capacity of single-tree traversal stacks.
pub const INLINE_STACK: usize = 64;

pub(crate) type NodeStack = SmallVec<[NodeIdx; INLINE_STACK]>;

impl<P: Copy> AabbTree<P> {
    /// Report every leaf whose volume overlaps `volume`.
    pub fn collide_tree_volume<C: Collector<P>>(&self, volume: &Volume, collector: &mut C) {
        self.collide_with(collector, |v| v.overlaps(volume));
    }

    /// Report every leaf that is not entirely on the positive side of `plane`.
    ///
    /// Leaves touching the plane are reported.
    pub fn collide_tree_plane<C: Collector<P>>(&self, plane: &Plane, collector: &mut C) {
        self.collide_with(collector, |v| !v.is_on_positive_side(plane));
    }

    /// Report every overlapping pair between this tree and `other`.
    ///
    /// See [`collide_tree_tree`].
    pub fn collide_tree_tree<Q: Copy, C: PairCollector<P, Q>>(
        &self,
        other: &AabbTree<Q>,
        collector: &mut C,
    ) {
        collide_tree_tree(self, other, collector);
    }

    /// Report every overlapping pair of distinct leaves within this tree, once each.
    pub fn collide_self<C: PairCollector<P, P>>(&self, collector: &mut C) {
        collide_tree_tree(self, self, collector);
    }

    /// Entries whose volume overlaps `volume`.
    pub fn query_volume(&self, volume: &Volume) -> impl Iterator<Item = (LeafId, P)> + use<P> {
        let mut out = Vec::new();
        self.collide_tree_volume(volume, &mut |leaf: Leaf<P>| out.push((leaf.id, leaf.payload)));
        out.into_iter()
    }

    /// Entries whose volume contains the point.
    pub fn query_point(&self, p: Vec3) -> impl Iterator<Item = (LeafId, P)> + use<P> {
        self.query_volume(&Volume::from_point(p))
    }

    /// Visit every node in pre-order (parent before children, child 0 before child 1).
    pub fn enum_nodes<F: FnMut(NodeRef<P>)>(&self, mut f: F) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: NodeStack = smallvec![root];
        while let Some(idx) = stack.pop() {
            f(self.node_ref(idx));
            if let Some([c0, c1]) = self.arena.get(idx).children() {
                stack.push(c1);
                stack.push(c0);
            }
        }
    }

    /// Visit every leaf, in the same order as [`Self::enum_nodes`].
    pub fn enum_leaves<F: FnMut(Leaf<P>)>(&self, f: F) {
        if let Some(root) = self.root {
            self.enum_leaves_from(root, f);
        }
    }

    /// Iterator over every leaf.
    pub fn leaves(&self) -> Leaves<'_, P> {
        Leaves {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    fn enum_leaves_from<F: FnMut(Leaf<P>)>(&self, start: NodeIdx, mut f: F) {
        let mut stack: NodeStack = smallvec![start];
        while let Some(idx) = stack.pop() {
            match self.arena.get(idx).kind {
                NodeKind::Leaf(_) => f(self.leaf_ref(idx)),
                NodeKind::Internal([c0, c1]) => {
                    stack.push(c1);
                    stack.push(c0);
                }
            }
        }
    }

    fn collide_with<C, F>(&self, collector: &mut C, test: F)
    where
        C: Collector<P>,
        F: Fn(&Volume) -> bool,
    {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: NodeStack = smallvec![root];
        while let Some(idx) = stack.pop() {
            let node = self.arena.get(idx);
            if !test(&node.volume) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf(_) => collector.process(self.leaf_ref(idx)),
                NodeKind::Internal([c0, c1]) => {
                    let r = self.node_ref(idx);
                    if !collector.descent(&r) {
                        continue;
                    }
                    if collector.all_leaves(&r) {
                        self.enum_leaves_from(idx, |leaf| collector.process(leaf));
                        continue;
                    }
                    stack.push(c1);
                    stack.push(c0);
                }
            }
        }
    }
}

/// Iterator over the leaves of an [`AabbTree`], returned by [`AabbTree::leaves`].
#[derive(Debug)]
pub struct Leaves<'a, P> {
    tree: &'a AabbTree<P>,
    stack: NodeStack,
}

impl<P: Copy> Iterator for Leaves<'_, P> {
    type Item = Leaf<P>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.stack.pop() {
            match self.tree.arena.get(idx).kind {
                NodeKind::Leaf(_) => return Some(self.tree.leaf_ref(idx)),
                NodeKind::Internal([c0, c1]) => {
                    self.stack.push(c1);
                    self.stack.push(c0);
                }
            }
        }
        None
    }
}

/// Reusable work stack for tree-vs-tree queries.
///
/// Keeps its allocation between calls, so repeatedly colliding the same pair
/// of trees (every tick, say) stops allocating once the buffer has grown to
/// the deepest traversal seen.
///
/// ```rust
/// use glam::Vec3;
/// use understory_aabb_tree::{AabbTree, Leaf, PairStack, Volume};
///
/// let mut a: AabbTree<u32> = AabbTree::new();
/// let mut b: AabbTree<u32> = AabbTree::new();
/// let _ = a.insert(Volume::from_min_max(Vec3::ZERO, Vec3::ONE), 1);
/// let _ = b.insert(Volume::from_min_max(Vec3::splat(0.5), Vec3::splat(2.0)), 2);
///
/// let mut stack = PairStack::new();
/// let mut pairs = Vec::new();
/// for _ in 0..3 {
///     pairs.clear();
///     stack.collide(&a, &b, &mut |x: Leaf<u32>, y: Leaf<u32>| pairs.push((x.payload, y.payload)));
///     assert_eq!(pairs, [(1, 2)]);
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct PairStack {
    pairs: Vec<(NodeIdx, NodeIdx)>,
}

impl PairStack {
    /// Create an empty stack; it grows on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack with room for `n` pending node pairs.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(n),
        }
    }

    /// Current buffer capacity in node pairs.
    pub fn capacity(&self) -> usize {
        self.pairs.capacity()
    }

    /// Report every overlapping leaf pair between `a` and `b`.
    ///
    /// When `a` and `b` are the same tree, each unordered pair of distinct
    /// leaves is reported exactly once and no leaf is paired with itself.
    /// Sameness is decided by identity, never by comparing volumes.
    pub fn collide<A, B, C>(&mut self, a: &AabbTree<A>, b: &AabbTree<B>, collector: &mut C)
    where
        A: Copy,
        B: Copy,
        C: PairCollector<A, B>,
    {
        self.pairs.clear();
        let (Some(ra), Some(rb)) = (a.root, b.root) else {
            return;
        };
        let same_tree = core::ptr::addr_eq(a, b);
        self.pairs.push((ra, rb));
        while let Some((ia, ib)) = self.pairs.pop() {
            let na = a.arena.get(ia);
            let nb = b.arena.get(ib);

            if same_tree && ia == ib {
                // A subtree against itself: pair up its halves, never a leaf with itself.
                if let Some([c0, c1]) = na.children() {
                    if !collector.descent(&a.node_ref(ia), &b.node_ref(ib)) {
                        continue;
                    }
                    self.pairs.push((c0, c0));
                    self.pairs.push((c1, c1));
                    self.pairs.push((c0, c1));
                }
                continue;
            }

            if !na.volume.overlaps(&nb.volume) {
                continue;
            }
            let (ca, cb) = (na.children(), nb.children());
            if ca.is_none() && cb.is_none() {
                collector.process(a.leaf_ref(ia), b.leaf_ref(ib));
                continue;
            }
            if !collector.descent(&a.node_ref(ia), &b.node_ref(ib)) {
                continue;
            }
            match (ca, cb) {
                (Some([a0, a1]), Some([b0, b1])) => {
                    self.pairs.push((a0, b0));
                    self.pairs.push((a0, b1));
                    self.pairs.push((a1, b0));
                    self.pairs.push((a1, b1));
                }
                (Some([a0, a1]), None) => {
                    self.pairs.push((a0, ib));
                    self.pairs.push((a1, ib));
                }
                (None, Some([b0, b1])) => {
                    self.pairs.push((ia, b0));
                    self.pairs.push((ia, b1));
                }
                (None, None) => {}
            }
        }
    }
}

/// Report every overlapping leaf pair between two trees (possibly the same one).
///
/// Uses a fresh [`PairStack`]; keep one around and call [`PairStack::collide`]
/// to reuse its buffer.
pub fn collide_tree_tree<A, B, C>(a: &AabbTree<A>, b: &AabbTree<B>, collector: &mut C)
where
    A: Copy,
    B: Copy,
    C: PairCollector<A, B>,
{
    PairStack::with_capacity(2 * INLINE_STACK).collide(a, b, collector);
}
