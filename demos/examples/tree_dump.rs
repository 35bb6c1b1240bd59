// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree shape before and after a rebuild.
//!
//! Insert a sorted row of boxes (the worst case for greedy insertion), print
//! the breadth-first layout, then rebuild top-down and print it again.
//!
//! Run:
//! - `cargo run -p understory_aabb_tree_demos --example tree_dump`

use glam::Vec3;
use understory_aabb_tree::{AabbTree, NodeId, NodeRef, TreeWriter, Volume};

#[derive(Default)]
struct Printer {
    depth: Vec<usize>,
}

impl TreeWriter<u32> for Printer {
    fn prepare(&mut self, root: Option<NodeId>, node_count: usize) {
        println!("root={root:?} nodes={node_count}");
        self.depth.clear();
    }

    fn write_node(
        &mut self,
        node: NodeRef<u32>,
        index: usize,
        parent: Option<usize>,
        child0: usize,
        child1: usize,
    ) {
        let depth = parent.map_or(0, |p| self.depth[p] + 1);
        self.depth.push(depth);
        println!(
            "{:indent$}#{index} [{:?} .. {:?}] -> #{child0}, #{child1}",
            "",
            node.volume.min,
            node.volume.max,
            indent = depth * 2
        );
    }

    fn write_leaf(&mut self, node: NodeRef<u32>, index: usize, parent: Option<usize>) {
        let depth = parent.map_or(0, |p| self.depth[p] + 1);
        self.depth.push(depth);
        println!(
            "{:indent$}#{index} leaf {:?}",
            "",
            node.payload,
            indent = depth * 2
        );
    }
}

fn main() {
    let mut tree = AabbTree::new();
    for i in 0..8_u32 {
        let min = Vec3::new(i as f32 * 2.0, 0.0, 0.0);
        let _ = tree.insert(Volume::from_min_max(min, min + Vec3::ONE), i);
    }
    println!("after insertion, height {}", tree.height());
    tree.write(&mut Printer::default());

    tree.optimize_top_down(1);
    println!("after top-down rebuild, height {}", tree.height());
    tree.write(&mut Printer::default());
}
