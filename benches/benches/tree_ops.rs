// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_aabb_tree::{
    AabbTree, DEFAULT_BOTTOM_UP_THRESHOLD, Leaf, LeafId, PairStack, Plane, Volume,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
    fn next_vec3(&mut self, scale: f32) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32()) * scale
    }
}

/// `n³` unit cubes on a lattice with spacing `cell`.
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

fn gen_random(count: usize, world: f32, size: f32) -> Vec<Volume> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let min = rng.next_vec3(world - size);
            Volume::from_min_max(min, min + Vec3::splat(size))
        })
        .collect()
}

fn build(volumes: &[Volume]) -> (AabbTree<u32>, Vec<LeafId>) {
    let mut tree = AabbTree::new();
    let handles = volumes
        .iter()
        .enumerate()
        .map(|(i, &v)| tree.insert(v, i as u32))
        .collect();
    (tree, handles)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000usize, 10_000] {
        let volumes = gen_random(n, 1000.0, 4.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("random_n{}", n), |b| {
            b.iter(|| {
                let (tree, _) = build(&volumes);
                black_box(tree.len());
            });
        });
        group.bench_function(format!("random_top_down_n{}", n), |b| {
            b.iter(|| {
                let (mut tree, _) = build(&volumes);
                tree.optimize_top_down(DEFAULT_BOTTOM_UP_THRESHOLD);
                black_box(tree.height());
            });
        });
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let n = 5_000usize;
    let volumes = gen_random(n, 1000.0, 4.0);
    group.throughput(Throughput::Elements(n as u64));

    // Jitter inside the margin: every update takes the cheap path.
    group.bench_function("jitter_within_margin", |b| {
        b.iter_batched(
            || {
                let mut tree = AabbTree::new();
                let handles: Vec<_> = volumes
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| tree.insert(v.expand_uniform(0.5), i as u32))
                    .collect();
                (tree, handles)
            },
            |(mut tree, handles)| {
                let mut moved = 0;
                for (h, v) in handles.iter().zip(&volumes) {
                    let shifted = Volume::from_min_max(v.min + 0.25, v.max + 0.25);
                    moved += usize::from(tree.update(*h, shifted));
                }
                black_box(moved);
            },
            BatchSize::LargeInput,
        );
    });

    // Steady drift: leaves escape their fattened volume and get reinserted.
    group.bench_function("drift_with_velocity", |b| {
        b.iter_batched(
            || build(&volumes),
            |(mut tree, handles)| {
                let mut rng = Rng::new(7);
                for (h, v) in handles.iter().zip(&volumes) {
                    let vel = rng.next_vec3(4.0) - 2.0;
                    let next = Volume::from_min_max(v.min + vel, v.max + vel);
                    let _ = tree.update_with_margin(*h, next, vel, 0.1);
                }
                tree.optimize_incremental(64);
                black_box(tree.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    for &n in &[16usize, 32] {
        let volumes = gen_lattice(n, 2.0);
        let (mut tree, _) = build(&volumes);
        tree.optimize_top_down(DEFAULT_BOTTOM_UP_THRESHOLD);
        let q = Volume::from_min_max(Vec3::splat(4.0), Vec3::splat(12.0));
        let plane = Plane::from_point_normal(Vec3::splat(n as f32), Vec3::new(1.0, 1.0, 0.0).normalize());

        group.bench_function(format!("volume_n{}", n * n * n), |b| {
            b.iter(|| {
                let mut hits = 0usize;
                tree.collide_tree_volume(&q, &mut |_: Leaf<u32>| hits += 1);
                black_box(hits);
            });
        });
        group.bench_function(format!("plane_n{}", n * n * n), |b| {
            b.iter(|| {
                let mut hits = 0usize;
                tree.collide_tree_plane(&plane, &mut |_: Leaf<u32>| hits += 1);
                black_box(hits);
            });
        });
        group.bench_function(format!("query_point_n{}", n * n * n), |b| {
            b.iter(|| black_box(tree.query_point(Vec3::splat(8.5)).count()));
        });
    }
    group.finish();
}

fn bench_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairs");
    for &n in &[1_000usize, 5_000] {
        let volumes = gen_random(n, 200.0, 4.0);
        let (a, _) = build(&volumes);
        let (b, _) = build(&gen_random(n, 200.0, 2.0));
        let mut stack = PairStack::new();

        group.bench_function(format!("self_n{}", n), |bench| {
            bench.iter(|| {
                let mut pairs = 0usize;
                stack.collide(&a, &a, &mut |_: Leaf<u32>, _: Leaf<u32>| pairs += 1);
                black_box(pairs);
            });
        });
        group.bench_function(format!("tree_tree_n{}", n), |bench| {
            bench.iter(|| {
                let mut pairs = 0usize;
                stack.collide(&a, &b, &mut |_: Leaf<u32>, _: Leaf<u32>| pairs += 1);
                black_box(pairs);
            });
        });
    }
    group.finish();
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    let volumes = gen_random(2_000, 500.0, 4.0);
    group.bench_function("top_down_n2000", |b| {
        b.iter_batched(
            || build(&volumes).0,
            |mut tree| {
                tree.optimize_top_down(DEFAULT_BOTTOM_UP_THRESHOLD);
                black_box(tree.height());
            },
            BatchSize::LargeInput,
        );
    });
    let small = gen_random(256, 100.0, 4.0);
    group.bench_function("bottom_up_n256", |b| {
        b.iter_batched(
            || build(&small).0,
            |mut tree| {
                tree.optimize_bottom_up();
                black_box(tree.height());
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("incremental_64_n2000", |b| {
        b.iter_batched(
            || build(&volumes).0,
            |mut tree| {
                tree.optimize_incremental(64);
                black_box(tree.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_update,
    bench_query,
    bench_pairs,
    bench_optimize
);
criterion_main!(benches);
