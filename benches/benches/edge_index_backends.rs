// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_index::{
    Aabb3D, EdgeIndex, EdgeIndexGeneric, EdgeKind, EntityId, FlatScan, FlatSpans, IndexConfig,
    IntervalBackend, PlanarBackend, Point3, RTree, SortedSpans, UniformGrid,
};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SECTION: f64 = 40.0;

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
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Random-walk skeletons: fine steps in the plane, one section per step along z.
fn gen_skeletons(n_skeletons: usize, per_skeleton: usize) -> Vec<(EntityId, Point3, Point3)> {
    let mut out = Vec::with_capacity(n_skeletons * per_skeleton);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for s in 0..n_skeletons {
        let mut at = Point3::new(
            rng.next_f64() * 20_000.0,
            rng.next_f64() * 20_000.0,
            (rng.next_f64() * 200.0).floor() * SECTION,
        );
        for _ in 0..per_skeleton {
            let dz = match rng.next_u64() % 4 {
                0 => -SECTION,
                1 => 0.0,
                _ => SECTION,
            };
            let next = Point3::new(
                at.x + (rng.next_f64() - 0.5) * 60.0,
                at.y + (rng.next_f64() - 0.5) * 60.0,
                at.z + dz,
            );
            out.push((EntityId(s as u64), at, next));
            at = next;
        }
    }
    out
}

/// Field-of-view style queries: a wide window a few sections deep.
fn gen_view_queries(count: usize) -> Vec<(Point3, Point3)> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            let x = rng.next_f64() * 19_000.0;
            let y = rng.next_f64() * 19_000.0;
            let z = (rng.next_f64() * 200.0).floor() * SECTION;
            (
                Point3::new(x, y, z),
                Point3::new(x + 1_000.0, y + 1_000.0, z + 2.0 * SECTION),
            )
        })
        .collect()
}

fn load<P: PlanarBackend, I: IntervalBackend>(
    idx: &EdgeIndexGeneric<P, I>,
    edges: &[(EntityId, Point3, Point3)],
) {
    let mut txn = idx.begin();
    for &(entity, p0, p1) in edges {
        txn.insert_edge(entity, EdgeKind::Treenode, p0, p1)
            .expect("generated edges are finite");
    }
    let _ = txn.commit();
}

fn run_queries<P: PlanarBackend, I: IntervalBackend>(
    idx: &EdgeIndexGeneric<P, I>,
    queries: &[(Point3, Point3)],
) -> usize {
    queries
        .iter()
        .map(|&(min, max)| idx.query_box(min, max).map_or(0, |o| o.entities.len()))
        .sum()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[64usize, 256] {
        let edges = gen_skeletons(n, 64);
        group.throughput(Throughput::Elements(edges.len() as u64));
        group.bench_function(format!("rtree_sorted_n{}", edges.len()), |b| {
            b.iter_batched(
                EdgeIndex::new,
                |idx| {
                    load(&idx, &edges);
                    black_box(idx.len());
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("rtree_sorted_rebuild_n{}", edges.len()), |b| {
            let idx = EdgeIndex::new();
            load(&idx, &edges);
            b.iter(|| idx.rebuild());
        });
        group.bench_function(format!("grid_sorted_n{}", edges.len()), |b| {
            b.iter_batched(
                || EdgeIndex::with_uniform_grid(IndexConfig::default(), 256.0, 256.0, 0.0, 0.0),
                |idx| {
                    load(&idx, &edges);
                    black_box(idx.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_query<P, I>(c: &mut Criterion, name: &str, make: impl Fn() -> EdgeIndexGeneric<P, I>)
where
    P: PlanarBackend,
    I: IntervalBackend,
{
    let mut group = c.benchmark_group("view_queries");
    let edges = gen_skeletons(256, 64);
    let queries = gen_view_queries(256);
    let idx = make();
    load(&idx, &edges);
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function(name, |b| b.iter(|| black_box(run_queries(&idx, &queries))));
    group.finish();
}

fn bench_backends(c: &mut Criterion) {
    bench_query(c, "rtree_sorted", EdgeIndexGeneric::<RTree, SortedSpans>::new);
    bench_query(c, "rtree_sorted_unverified", || {
        EdgeIndexGeneric::<RTree, SortedSpans>::with_config(IndexConfig::default().unverified())
    });
    bench_query(c, "grid_sorted", || {
        EdgeIndexGeneric::with_backends(
            IndexConfig::default(),
            UniformGrid::new(256.0, 256.0, 0.0, 0.0),
            SortedSpans::new(),
        )
    });
    bench_query(c, "rtree_flat", EdgeIndexGeneric::<RTree, FlatSpans>::new);
    bench_query(c, "flat_flat", EdgeIndexGeneric::<FlatScan, FlatSpans>::new);
}

fn bench_brute_force(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_queries");
    let edges = gen_skeletons(256, 64);
    let queries = gen_view_queries(256);
    let boxes: Vec<_> = edges
        .iter()
        .map(|&(entity, p0, p1)| (entity, Aabb3D::from_segment(p0, p1)))
        .collect();
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("brute_force_3d", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for &(min, max) in &queries {
                let q = Aabb3D::new(min, max);
                let mut hits: Vec<_> = boxes
                    .iter()
                    .filter(|(_, bb)| bb.intersects(&q))
                    .map(|(e, _)| *e)
                    .collect();
                hits.sort_unstable();
                hits.dedup();
                total += hits.len();
            }
            black_box(total)
        });
    });
    group.finish();
}

fn bench_update_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_heavy");
    let edges = gen_skeletons(64, 64);
    group.bench_function("shift_every_edge_then_commit", |b| {
        b.iter_batched(
            || {
                let idx = EdgeIndex::new();
                let mut txn = idx.begin();
                let ids: Vec<_> = edges
                    .iter()
                    .map(|&(e, p0, p1)| {
                        txn.insert_edge(e, EdgeKind::Treenode, p0, p1)
                            .expect("generated edges are finite")
                    })
                    .collect();
                let _ = txn.commit();
                (idx, ids)
            },
            |(idx, ids)| {
                let mut txn = idx.begin();
                for (j, id) in ids.into_iter().enumerate() {
                    let (_, p0, p1) = edges[j];
                    let dx = (j % 5) as f64 - 2.0;
                    let shift = |p: Point3| Point3::new(p.x + dx, p.y, p.z);
                    txn.update_edge_geometry(id, shift(p0), shift(p1))
                        .expect("shifted edges stay finite");
                }
                black_box(txn.commit());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_backends,
    bench_brute_force,
    bench_update_heavy,
);
criterion_main!(benches);
