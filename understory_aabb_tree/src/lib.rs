// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_aabb_tree --heading-base-level=0

//! Understory AABB Tree: a dynamic 3D bounding volume hierarchy.
//!
//! A binary tree of axis-aligned boxes meant to be kept alive and mutated
//! every frame: a broad-phase for physics, an interest-management index for
//! a game server, a culling structure for a renderer.
//!
//! - Insert, remove, and move boxes carrying a `Copy` payload handle.
//! - Fattened updates: moving a box only touches the tree when it leaves its
//!   stored volume, which can be padded by a margin and stretched along a velocity.
//! - Queries against a box, a half-space, or another tree (including itself),
//!   reported through collector traits that can prune or bulk-accept subtrees.
//! - Quality maintenance: full bottom-up or top-down rebuilds, and an
//!   incremental mode that reinserts a few leaves per call.
//! - Breadth-first topology export and deep copy with payload mapping.
//!
//! Nodes live in a flat slot arena. Leaves are addressed by generational
//! [`LeafId`] handles that survive updates and rebuilds and never alias a
//! newer leaf after removal.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use understory_aabb_tree::{AabbTree, Leaf, Volume};
//!
//! let mut tree: AabbTree<u32> = AabbTree::new();
//! let a = tree.insert(Volume::from_min_max(Vec3::ZERO, Vec3::ONE), 1);
//! let _b = tree.insert(Volume::from_min_max(Vec3::splat(5.0), Vec3::splat(6.0)), 2);
//!
//! // Move `a` with some slack; small moves after this are free.
//! let moved = Volume::from_min_max(Vec3::splat(2.0), Vec3::splat(3.0));
//! assert!(tree.update_with_margin(a, moved, Vec3::X, 0.5));
//! assert!(!tree.update(a, moved));
//!
//! // Query a box.
//! let hits: Vec<_> = tree.query_point(Vec3::splat(5.5)).map(|(_, p)| p).collect();
//! assert_eq!(hits, [2]);
//!
//! // Overlapping pairs within the tree.
//! let mut pairs = 0;
//! tree.collide_self(&mut |_: Leaf<u32>, _: Leaf<u32>| pairs += 1);
//! assert_eq!(pairs, 0);
//! ```
//!
//! ## Keeping the tree in shape
//!
//! Insertion is a greedy walk, so a tree built from sorted input or moved
//! around for a long time can end up deep. Call
//! [`AabbTree::optimize_incremental`] with a small count every tick, or
//! rebuild with [`AabbTree::optimize_top_down`] after a bulk load.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in volumes. Debug builds assert `min <= max`.

#![no_std]

extern crate alloc;

pub mod arena;
pub mod collector;
pub mod error;
pub mod optimize;
pub mod query;
pub mod tree;
pub mod types;
pub mod writer;

#[cfg(test)]
mod testing;

pub use arena::{LeafId, NodeId};
pub use collector::{Collector, Leaf, NodeRef, PairCollector};
pub use error::TreeError;
pub use optimize::DEFAULT_BOTTOM_UP_THRESHOLD;
pub use query::{INLINE_STACK, Leaves, PairStack, collide_tree_tree};
pub use tree::{AabbTree, DEFAULT_LOOKAHEAD, TreeConfig};
pub use types::{Plane, Volume};
pub use writer::TreeWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use glam::Vec3;

    #[test]
    fn bulk_load_query_and_remove() {
        let mut tree = AabbTree::new();
        let handles: Vec<LeafId> = (0..1000_u32)
            .map(|i| {
                let x = i as f32;
                tree.insert(
                    Volume::from_min_max(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0)),
                    i,
                )
            })
            .collect();
        tree.optimize_top_down(DEFAULT_BOTTOM_UP_THRESHOLD);
        tree.optimize_incremental(50);
        tree.validate().unwrap();

        let q = Volume::from_min_max(Vec3::new(400.0, 0.0, 0.0), Vec3::new(410.0, 1.0, 1.0));
        let mut hits: Vec<u32> = tree.query_volume(&q).map(|(_, p)| p).collect();
        hits.sort_unstable();
        assert_eq!(hits, (399..=410).collect::<Vec<_>>());

        for &h in &handles[..500] {
            let _ = tree.remove(h);
        }
        tree.validate().unwrap();
        assert_eq!(tree.len(), 500);
        assert_eq!(tree.leaves().count(), 500);
        assert!(tree.query_volume(&q).next().is_none());
    }
}
