// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the fallible tree surface and by [`AabbTree::validate`](crate::AabbTree::validate).

use thiserror::Error;

use crate::arena::{LeafId, NodeId};

/// Errors produced by [`AabbTree`](crate::AabbTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle does not refer to a live leaf of this tree.
    #[error("stale or foreign leaf handle: {0:?}")]
    StaleLeaf(LeafId),
    /// An internal node's volume is not the exact merge of its children.
    #[error("volume of {node:?} is not the merge of its children")]
    VolumeMismatch {
        /// The offending internal node.
        node: NodeId,
    },
    /// A child's parent link does not point back at the node holding it.
    #[error("parent link of {node:?} is inconsistent")]
    ParentMismatch {
        /// The child whose parent link is wrong.
        node: NodeId,
    },
    /// The root has a parent link.
    #[error("root {node:?} has a parent")]
    RootHasParent {
        /// The root node.
        node: NodeId,
    },
    /// A child link points at a vacant slot.
    #[error("child link of {node:?} points at a vacant slot")]
    DanglingChild {
        /// The internal node holding the dangling link.
        node: NodeId,
    },
    /// The cached leaf count disagrees with the leaves reachable from the root.
    #[error("leaf count is {expected} but {found} leaves are reachable")]
    LeafCountMismatch {
        /// Cached leaf count.
        expected: usize,
        /// Leaves reachable from the root.
        found: usize,
    },
    /// Some live arena slots are not reachable from the root.
    #[error("{live} live nodes but only {reachable} reachable from the root")]
    UnreachableNodes {
        /// Occupied arena slots.
        live: usize,
        /// Nodes reachable from the root.
        reachable: usize,
    },
}
