// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree quality maintenance: full rebuilds and amortized per-tick rebalancing.
//!
//! Insertion only ever looks one path deep, so a long run of updates can
//! leave the hierarchy lopsided. Three remedies, from most to least expensive:
//!
//! - [`AabbTree::optimize_bottom_up`]: greedy pairwise merging of the closest
//!   subtrees. Best shape, but quadratic per merge step, so keep it to small sets.
//! - [`AabbTree::optimize_top_down`]: recursive centroid partitioning that
//!   falls back to bottom-up merging for partitions at or below a threshold.
//! - [`AabbTree::optimize_incremental`]: reinsert a few leaves per call,
//!   cycling through all of them over time.
//!
//! None of them change a leaf's handle, payload, or stored volume.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use tracing::debug;

use crate::arena::{LeafId, Node, NodeIdx};
use crate::query::NodeStack;
use crate::tree::AabbTree;
use crate::types::Volume;

/// Partition size at or below which [`AabbTree::optimize_top_down`] switches
/// to bottom-up merging when no other threshold is wanted.
pub const DEFAULT_BOTTOM_UP_THRESHOLD: usize = 128;

impl<P: Copy> AabbTree<P> {
    /// Rebuild the whole tree by greedily merging the closest pair of subtrees.
    pub fn optimize_bottom_up(&mut self) {
        if self.root.is_none() {
            return;
        }
        let mut nodes = self.detach_all();
        let root = self.build_bottom_up(&mut nodes);
        self.root = Some(root);
        debug!(leaves = self.leaf_count, "bottom-up rebuild");
    }

    /// Rebuild the whole tree by recursive partitioning.
    ///
    /// Each partition is split into equal halves at the median centre along
    /// the longest axis of its leaves' centres. Partitions with at most `threshold` leaves are built with
    /// bottom-up merging instead.
    pub fn optimize_top_down(&mut self, threshold: usize) {
        if self.root.is_none() {
            return;
        }
        let mut leaves = self.detach_all();
        let root = self.build_top_down(&mut leaves, threshold.max(1));
        self.root = Some(root);
        debug!(leaves = self.leaf_count, threshold, "top-down rebuild");
    }

    /// Reinsert the next `passes` leaves in round-robin order.
    ///
    /// Meant to be called every tick with a small count so that tree quality
    /// recovers gradually instead of through a full rebuild.
    pub fn optimize_incremental(&mut self, passes: usize) {
        if self.leaf_count < 2 {
            return;
        }
        for _ in 0..passes {
            let Some(leaf) = self.next_round_robin_leaf() else {
                return;
            };
            self.reinsert(LeafId(self.arena.id(leaf)));
        }
    }

    /// Advance the cursor to the next live leaf slot, wrapping around.
    fn next_round_robin_leaf(&mut self) -> Option<NodeIdx> {
        let slots = self.arena.slot_count();
        let mut i = if self.cursor < slots { self.cursor } else { 0 };
        for _ in 0..slots {
            let idx = self.arena.idx_at(i);
            i = self.arena.next_slot(i);
            if self.arena.try_get(idx).is_some_and(Node::is_leaf) {
                self.cursor = i;
                return Some(idx);
            }
        }
        None
    }

    /// Free every internal node and return the now parentless leaves.
    fn detach_all(&mut self) -> Vec<NodeIdx> {
        let mut leaves = Vec::with_capacity(self.leaf_count);
        let mut stack: NodeStack = self.root.take().into_iter().collect();
        while let Some(idx) = stack.pop() {
            match self.arena.get(idx).children() {
                Some([c0, c1]) => {
                    let _ = self.arena.free(idx);
                    stack.push(c1);
                    stack.push(c0);
                }
                None => {
                    self.arena.get_mut(idx).parent = None;
                    leaves.push(idx);
                }
            }
        }
        leaves
    }

    /// Merge parentless subtree roots pairwise until one remains and return it.
    fn build_bottom_up(&mut self, nodes: &mut Vec<NodeIdx>) -> NodeIdx {
        debug_assert!(!nodes.is_empty(), "bottom-up build of an empty set");
        while nodes.len() > 1 {
            let mut best = (f32::INFINITY, 0, 1);
            for i in 0..nodes.len() {
                let vi = self.arena.get(nodes[i]).volume;
                for j in i + 1..nodes.len() {
                    let p = Volume::proximity(&vi, &self.arena.get(nodes[j]).volume);
                    if p < best.0 {
                        best = (p, i, j);
                    }
                }
            }
            let (_, i, j) = best;
            let (a, b) = (nodes[i], nodes[j]);
            let merged = Volume::merge(&self.arena.get(a).volume, &self.arena.get(b).volume);
            let parent = self.arena.alloc(Node::internal(merged, None, [a, b]));
            self.arena.get_mut(a).parent = Some(parent);
            self.arena.get_mut(b).parent = Some(parent);
            nodes[i] = parent;
            let _ = nodes.swap_remove(j);
        }
        nodes[0]
    }

    fn build_top_down(&mut self, leaves: &mut [NodeIdx], threshold: usize) -> NodeIdx {
        debug_assert!(!leaves.is_empty(), "top-down build of an empty set");
        let mut root = NodeIdx::DANGLING;
        // (partition, parent and child slot to attach the built subtree to)
        let mut work: Vec<(Range<usize>, Option<(NodeIdx, usize)>)> =
            vec![(0..leaves.len(), None)];
        while let Some((range, link)) = work.pop() {
            let part = &mut leaves[range.clone()];
            let subtree = if part.len() <= threshold {
                let mut nodes = part.to_vec();
                self.build_bottom_up(&mut nodes)
            } else {
                let volume = self.bounds_of(part);
                let k = self.split(part);
                let node = self
                    .arena
                    .alloc(Node::internal(volume, None, [NodeIdx::DANGLING; 2]));
                work.push((range.start + k..range.end, Some((node, 1))));
                work.push((range.start..range.start + k, Some((node, 0))));
                node
            };
            match link {
                Some((parent, slot)) => self.set_child(parent, slot, subtree),
                None => root = subtree,
            }
        }
        root
    }

    fn bounds_of(&self, part: &[NodeIdx]) -> Volume {
        let first = self.arena.get(part[0]).volume;
        part[1..].iter().fold(first, |acc, &idx| {
            Volume::merge(&acc, &self.arena.get(idx).volume)
        })
    }

    /// Reorder `part` so that `part[..k]` and `part[k..]` are the two halves; returns `k`.
    ///
    /// Cuts at the median centre along the longest axis of the centres'
    /// bounds, so `k` is always `part.len() / 2` whatever the distribution.
    fn split(&self, part: &mut [NodeIdx]) -> usize {
        let center = |idx: NodeIdx| self.arena.get(idx).volume.center();
        let first = Volume::from_point(center(part[0]));
        let centers = part[1..].iter().fold(first, |acc, &idx| {
            Volume::merge(&acc, &Volume::from_point(center(idx)))
        });
        let axis = centers.longest_axis();
        let k = part.len() / 2;
        let _ = part.select_nth_unstable_by(k, |&a, &b| {
            center(a)[axis].total_cmp(&center(b)[axis])
        });
        k
    }
}
