// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Topology snapshots and deep copies.
//!
//! [`TreeWriter`] is the hook for exporting a tree's shape (for debugging
//! views, serialization, or building a mirror structure elsewhere). Nodes are
//! numbered breadth-first from the root, so a node's index is always greater
//! than its parent's and the two children of an internal node are adjacent.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use tracing::debug;

use crate::arena::{LeafId, Node, NodeId, NodeIdx, NodeKind};
use crate::collector::NodeRef;
use crate::tree::AabbTree;

/// Receives a breadth-first walk of a tree from [`AabbTree::write`].
pub trait TreeWriter<P> {
    /// Called once before any node, with the root id and the number of nodes to follow.
    fn prepare(&mut self, root: Option<NodeId>, node_count: usize);

    /// An internal node and the sequential indices of its parent and children.
    fn write_node(
        &mut self,
        node: NodeRef<P>,
        index: usize,
        parent: Option<usize>,
        child0: usize,
        child1: usize,
    );

    /// A leaf and the sequential index of its parent.
    fn write_leaf(&mut self, node: NodeRef<P>, index: usize, parent: Option<usize>);
}

impl<P: Copy> AabbTree<P> {
    /// Walk the tree breadth-first, numbering nodes from 0 at the root.
    pub fn write<W: TreeWriter<P>>(&self, writer: &mut W) {
        let node_count = self.arena.live();
        writer.prepare(self.root(), node_count);
        let Some(root) = self.root else {
            return;
        };

        let mut queue: VecDeque<(NodeIdx, Option<usize>)> = VecDeque::with_capacity(node_count);
        queue.push_back((root, None));
        let mut index = 0;
        let mut next = 1;
        while let Some((idx, parent)) = queue.pop_front() {
            let node = self.node_ref(idx);
            match self.arena.get(idx).children() {
                Some([c0, c1]) => {
                    writer.write_node(node, index, parent, next, next + 1);
                    queue.push_back((c0, Some(index)));
                    queue.push_back((c1, Some(index)));
                    next += 2;
                }
                None => writer.write_leaf(node, index, parent),
            }
            index += 1;
        }
    }

    /// Copy this tree's topology and volumes into `dst`.
    ///
    /// Anything already in `dst` is cleared first, which makes every handle
    /// into it stale. `clone_leaf` is called once per leaf with the leaf's handle in `dst`
    /// and its payload here, and returns the payload to store in `dst`.
    pub fn clone_into<Q, F>(&self, dst: &mut AabbTree<Q>, mut clone_leaf: F)
    where
        Q: Copy,
        F: FnMut(LeafId, &P) -> Q,
    {
        dst.clear();
        let Some(root) = self.root else {
            return;
        };

        // (source node, destination parent and child slot)
        let mut work: Vec<(NodeIdx, Option<(NodeIdx, usize)>)> = Vec::from([(root, None)]);
        while let Some((src, link)) = work.pop() {
            let node = self.arena.get(src);
            let copied = match node.kind {
                NodeKind::Internal([c0, c1]) => {
                    let idx = dst
                        .arena
                        .alloc(Node::internal(node.volume, None, [NodeIdx::DANGLING; 2]));
                    work.push((c1, Some((idx, 1))));
                    work.push((c0, Some((idx, 0))));
                    idx
                }
                NodeKind::Leaf(payload) => {
                    let id = LeafId(dst.arena.next_id());
                    let q = clone_leaf(id, &payload);
                    dst.arena.alloc(Node::leaf(node.volume, q))
                }
            };
            match link {
                Some((parent, slot)) => dst.set_child(parent, slot, copied),
                None => dst.root = Some(copied),
            }
        }
        dst.leaf_count = self.leaf_count;
        debug!(leaves = self.leaf_count, "cloned tree");
    }
}
