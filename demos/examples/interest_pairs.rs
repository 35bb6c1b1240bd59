// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interest management.
//!
//! Players carry an area of interest; entities move around a small world each
//! tick. Each tick the entity tree is updated with fattened volumes, a few
//! leaves are reinserted to keep the tree in shape, and the player tree is
//! collided against it to find who sees what.
//!
//! Run:
//! - `cargo run -p understory_aabb_tree_demos --example interest_pairs`

use glam::Vec3;
use understory_aabb_tree::{AabbTree, Leaf, PairStack, Volume};

const ENTITIES: u32 = 200;
const TICKS: u32 = 10;

fn main() {
    let mut entities: AabbTree<u32> = AabbTree::new();
    let mut positions = Vec::new();
    let mut handles = Vec::new();
    for i in 0..ENTITIES {
        let p = Vec3::new((i % 20) as f32 * 5.0, 0.0, (i / 20) as f32 * 5.0);
        positions.push(p);
        handles.push(entities.insert(Volume::from_center_half_extents(p, Vec3::splat(0.5)), i));
    }

    let mut players: AabbTree<&'static str> = AabbTree::new();
    let _ = players.insert(
        Volume::from_center_half_extents(Vec3::new(10.0, 0.0, 10.0), Vec3::splat(8.0)),
        "alice",
    );
    let _ = players.insert(
        Volume::from_center_half_extents(Vec3::new(70.0, 0.0, 40.0), Vec3::splat(12.0)),
        "bob",
    );

    let mut stack = PairStack::new();
    for tick in 0..TICKS {
        let mut reinserted = 0;
        for (i, (h, p)) in handles.iter().zip(positions.iter_mut()).enumerate() {
            let velocity = Vec3::new(if i % 2 == 0 { 0.4 } else { -0.3 }, 0.0, 0.2);
            *p += velocity;
            let body = Volume::from_center_half_extents(*p, Vec3::splat(0.5));
            if entities.update_with_margin(*h, body, velocity, 0.25) {
                reinserted += 1;
            }
        }
        entities.optimize_incremental(8);

        let mut seen = [0_usize; 2];
        stack.collide(&players, &entities, &mut |who: Leaf<&'static str>, _: Leaf<u32>| {
            seen[usize::from(who.payload == "bob")] += 1;
        });
        println!(
            "tick {tick}: reinserted={reinserted} height={} alice sees {} bob sees {}",
            entities.height(),
            seen[0],
            seen[1]
        );
    }
}
