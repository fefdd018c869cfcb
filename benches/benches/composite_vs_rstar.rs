// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use arbor_index::{EdgeIndex, EdgeKind, EntityId, Point3};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

const SECTION: f64 = 40.0;

type Volume = GeomWithData<Rectangle<[f64; 3]>, EntityId>;

/// Straight skeleton trunks on a lattice, each crossing `depth` sections.
fn gen_trunks(n: usize, depth: usize) -> Vec<(EntityId, Point3, Point3)> {
    let mut out = Vec::with_capacity(n * n * depth);
    for y in 0..n {
        for x in 0..n {
            let entity = EntityId((y * n + x) as u64);
            for z in 0..depth {
                let p0 = Point3::new(x as f64 * 50.0, y as f64 * 50.0, z as f64 * SECTION);
                let p1 = Point3::new(p0.x + 7.0, p0.y + 3.0, p0.z + SECTION);
                out.push((entity, p0, p1));
            }
        }
    }
    out
}

fn to_volumes(edges: &[(EntityId, Point3, Point3)]) -> Vec<Volume> {
    edges
        .iter()
        .map(|&(entity, p0, p1)| {
            GeomWithData::new(
                Rectangle::from_corners([p0.x, p0.y, p0.z], [p1.x, p1.y, p1.z]),
                entity,
            )
        })
        .collect()
}

fn bench_composite_vs_volumetric(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_vs_volumetric");
    for &n in &[32usize, 64] {
        let edges = gen_trunks(n, 32);
        let (qmin, qmax) = (
            Point3::new(200.0, 200.0, 10.0 * SECTION),
            Point3::new(1_200.0, 1_200.0, 11.0 * SECTION),
        );
        group.throughput(Throughput::Elements(edges.len() as u64));

        group.bench_function(format!("arbor_build_query_n{}", edges.len()), |b| {
            b.iter_batched(
                EdgeIndex::new,
                |idx| {
                    let mut txn = idx.begin();
                    for &(entity, p0, p1) in &edges {
                        txn.insert_edge(entity, EdgeKind::Treenode, p0, p1)
                            .expect("generated edges are finite");
                    }
                    let _ = txn.commit();
                    let hits = idx.query_box(qmin, qmax).map_or(0, |o| o.entities.len());
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", edges.len()), |b| {
            b.iter_batched(
                || to_volumes(&edges),
                |volumes| {
                    let tree = RTree::bulk_load(volumes);
                    let aabb = AABB::from_corners([qmin.x, qmin.y, qmin.z], [qmax.x, qmax.y, qmax.z]);
                    let mut hits: Vec<_> = tree
                        .locate_in_envelope_intersecting(&aabb)
                        .map(|v| v.data)
                        .collect();
                    hits.sort_unstable();
                    hits.dedup();
                    black_box(hits.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_composite_vs_volumetric);
criterion_main!(benches);
