// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory AABB Tree: insert, move, query, remove.

use glam::Vec3;
use understory_aabb_tree::{AabbTree, Leaf, Plane, Volume};

fn main() {
    let mut tree: AabbTree<u32> = AabbTree::new();
    let a = tree.insert(Volume::from_min_max(Vec3::ZERO, Vec3::ONE), 1);
    let b = tree.insert(Volume::from_min_max(Vec3::splat(2.0), Vec3::splat(3.0)), 2);

    // Move box 1 next to box 2
    let moved = tree.update(a, Volume::from_min_max(Vec3::splat(1.5), Vec3::splat(2.5)));
    println!("moved a: {moved}, bounds: {:?}", tree.bounds());

    // Query a point
    let hits: Vec<_> = tree.query_point(Vec3::splat(2.2)).collect();
    println!("hits at (2.2, 2.2, 2.2): {:?}", hits);

    // Everything reaching down to the plane y = 2
    let plane = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
    tree.collide_tree_plane(&plane, &mut |leaf: Leaf<u32>| {
        println!("reaches y <= 2: {}", leaf.payload);
    });

    let payload = tree.remove(b);
    println!("removed {payload}, {} left", tree.len());
}
