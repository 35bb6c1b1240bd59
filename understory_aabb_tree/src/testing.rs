// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for unit tests.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use glam::Vec3;
use rand::Rng;

use crate::arena::LeafId;
use crate::tree::AabbTree;
use crate::types::Volume;

/// Unit cube spanning `[x, x + 1]` on the x axis and `[0, 1]` on y and z.
pub(crate) fn cube(x: f32) -> Volume {
    Volume::from_min_max(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
}

/// A box somewhere in `[-50, 55]^3` with sides up to 5.
pub(crate) fn random_volume<R: Rng>(rng: &mut R) -> Volume {
    let min = Vec3::new(
        rng.random_range(-50.0..50.0),
        rng.random_range(-50.0..50.0),
        rng.random_range(-50.0..50.0),
    );
    let size = Vec3::new(
        rng.random_range(0.0..5.0),
        rng.random_range(0.0..5.0),
        rng.random_range(0.0..5.0),
    );
    Volume::from_min_max(min, min + size)
}

/// A tree of `n` random boxes with payloads `0..n`.
pub(crate) fn random_tree<R: Rng>(rng: &mut R, n: u32) -> (AabbTree<u32>, Vec<LeafId>) {
    let mut tree = AabbTree::new();
    let handles = (0..n)
        .map(|i| tree.insert(random_volume(rng), i))
        .collect();
    (tree, handles)
}

pub(crate) fn leaf_payloads(tree: &AabbTree<u32>) -> BTreeSet<u32> {
    tree.leaves().map(|l| l.payload).collect()
}
