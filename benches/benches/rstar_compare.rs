// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_aabb_tree::{AabbTree, DEFAULT_BOTTOM_UP_THRESHOLD, Volume};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_lattice(n: usize, cell: f32) -> Vec<Volume> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Vec3::new(x as f32, y as f32, z as f32) * cell;
                out.push(Volume::from_min_max(min, min + Vec3::ONE));
            }
        }
    }
    out
}

fn to_rstar_rects(v: &[Volume]) -> Vec<Rectangle<[f32; 3]>> {
    v.iter()
        .map(|b| Rectangle::from_corners(b.min.to_array(), b.max.to_array()))
        .collect()
}

fn bench_rstar_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_compare");
    for &n in &[16usize, 24] {
        let volumes = gen_lattice(n, 2.0);
        let query = Volume::from_min_max(Vec3::splat(4.0), Vec3::splat(20.0));
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_function(format!("understory_build_query_n{}", n), |b| {
            b.iter_batched(
                AabbTree::<u32>::new,
                |mut tree| {
                    for (i, v) in volumes.iter().copied().enumerate() {
                        let _ = tree.insert(v, i as u32);
                    }
                    let hits: usize = tree.query_volume(&query).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("understory_build_query_top_down_n{}", n), |b| {
            b.iter_batched(
                AabbTree::<u32>::new,
                |mut tree| {
                    for (i, v) in volumes.iter().copied().enumerate() {
                        let _ = tree.insert(v, i as u32);
                    }
                    tree.optimize_top_down(DEFAULT_BOTTOM_UP_THRESHOLD);
                    let hits: usize = tree.query_volume(&query).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_rects(&volumes),
                |rectangles| {
                    let mut tree = RTree::new();
                    for r in rectangles {
                        tree.insert(r);
                    }
                    let aabb = AABB::from_corners(query.min.to_array(), query.max.to_array());
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_rects(&volumes),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(query.min.to_array(), query.max.to_array());
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rstar_compare);
criterion_main!(benches);
