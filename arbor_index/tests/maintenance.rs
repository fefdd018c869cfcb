// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation, persistence, and concurrency behavior of the composite index.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use arbor_index::{
    Aabb2D, AxisRange, EdgeIndex, EdgeIndexGeneric, EdgeKind, EdgeRecord, EdgeRow, EdgeStore,
    EntityId, EntryId, FlatScan, FlatSpans, IndexConfig, IndexError, IntervalBackend,
    PlanarBackend, Point3,
};

fn p(x: f64, y: f64, z: f64) -> Point3 {
    Point3::new(x, y, z)
}

/// One skeleton: a chain of `n` edges walking up through sections 40 units apart.
fn skeleton(idx: &EdgeIndex, entity: EntityId, x: f64, n: usize) -> Vec<EntryId> {
    let mut txn = idx.begin();
    let mut ids = Vec::new();
    let mut prev = p(x, 0.0, 0.0);
    for i in 1..=n {
        let next = p(x + (i % 3) as f64, i as f64 * 0.5, i as f64 * 40.0);
        ids.push(txn.insert_edge(entity, EdgeKind::Treenode, prev, next).unwrap());
        prev = next;
    }
    txn.commit();
    ids
}

#[test]
fn deleted_edge_is_gone_and_second_delete_fails() {
    let idx = EdgeIndex::new();
    let ids = skeleton(&idx, EntityId(1), 0.0, 4);
    skeleton(&idx, EntityId(2), 100.0, 4);

    idx.delete_edge(ids[1]).unwrap();
    assert_eq!(idx.delete_edge(ids[1]), Err(IndexError::EntryNotFound(ids[1])));
    assert_eq!(idx.len(), 7);
    assert!(idx.get_edge(ids[0]).is_some());
    assert!(idx.audit().is_empty());

    let mut txn = idx.begin();
    assert!(txn.delete_edge(EntryId(9_999)).is_err());
    assert!(txn.is_empty());
}

#[test]
fn restructuring_a_skeleton_is_one_atomic_step() {
    let idx = EdgeIndex::new();
    let ids = skeleton(&idx, EntityId(1), 0.0, 5);
    let around_old = || {
        idx.query_box(p(-1.0, -1.0, 0.0), p(3.0, 3.0, 200.0))
            .unwrap()
            .entities
    };
    assert_eq!(around_old(), BTreeSet::from([EntityId(1)]));

    // Translate the whole skeleton far away in one transaction.
    let mut txn = idx.begin();
    for &id in &ids {
        let rec = txn.get_edge(id).unwrap();
        let shift = |q: Point3| p(q.x + 1000.0, q.y, q.z);
        txn.update_edge_geometry(id, shift(rec.p0), shift(rec.p1)).unwrap();
    }
    let dmg = txn.commit();
    assert_eq!(dmg.moved.len(), ids.len());
    assert!(around_old().is_empty());
    let moved = idx
        .query_box(p(999.0, -1.0, 0.0), p(1003.0, 3.0, 200.0))
        .unwrap();
    assert_eq!(moved.entities, BTreeSet::from([EntityId(1)]));
}

#[test]
fn update_edge_replaces_owner_and_kind() {
    let idx = EdgeIndex::new();
    let id = idx
        .insert_edge(EntityId(1), EdgeKind::Treenode, p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0))
        .unwrap();
    let replacement = EdgeRecord::new(
        EntityId(2),
        EdgeKind::TreenodeConnector,
        p(0.0, 0.0, 0.0),
        p(1.0, 0.0, 0.0),
    )
    .unwrap();
    let mut txn = idx.begin();
    txn.update_edge(id, replacement).unwrap();
    let dmg = txn.commit();
    assert!(dmg.is_empty());
    let out = idx.query_box(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)).unwrap();
    assert_eq!(out.entities, BTreeSet::from([EntityId(2)]));
}

#[test]
fn rows_survive_a_json_round_trip() {
    let idx = EdgeIndex::new();
    skeleton(&idx, EntityId(1), 0.0, 6);
    skeleton(&idx, EntityId(2), 50.0, 3);
    let rows = idx.export_rows();
    let json = serde_json::to_string_pretty(&rows).unwrap();
    let back: Vec<EdgeRow> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rows);

    let reloaded = EdgeIndex::from_rows(IndexConfig::default(), back).unwrap();
    assert_eq!(reloaded.len(), idx.len());
    let (min, max) = (p(-5.0, -5.0, 30.0), p(60.0, 60.0, 90.0));
    assert_eq!(
        reloaded.query_box(min, max).unwrap(),
        idx.query_box(min, max).unwrap()
    );
}

#[test]
fn rows_with_bad_geometry_are_rejected() {
    let rec = EdgeRecord::new(EntityId(1), EdgeKind::Treenode, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
        .unwrap();
    let mut row = EdgeRow::derive(EntryId(1), &rec, arbor_index::Axis::Z);
    row.p1 = p(1.0, f64::INFINITY, 1.0);
    let err = EdgeIndex::from_rows(IndexConfig::default(), [row]).unwrap_err();
    assert!(matches!(err, IndexError::InvalidGeometry { .. }));
}

#[test]
fn diverged_parts_are_reported_then_repaired() {
    let cfg = IndexConfig::default();
    let a = EdgeRecord::new(EntityId(1), EdgeKind::Treenode, p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
        .unwrap();
    let b = EdgeRecord::new(EntityId(2), EdgeKind::Treenode, p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
        .unwrap();
    let records = EdgeStore::from_records([(EntryId(1), a), (EntryId(2), b)]).unwrap();

    let mut planar = FlatScan::new();
    let mut interval = FlatSpans::new();
    // Entry 1: planar box left at stale geometry. Entry 2: missing from the interval index.
    planar.insert(EntryId(1), Aabb2D::new(40.0, 40.0, 41.0, 41.0));
    interval.insert(EntryId(1), AxisRange::new(0.0, 2.0));
    planar.insert(EntryId(2), b.planar_box(cfg.slicing_axis));
    // Entry 3: orphan in both.
    planar.insert(EntryId(3), Aabb2D::new(0.0, 0.0, 1.0, 1.0));
    interval.insert(EntryId(3), AxisRange::new(0.0, 1.0));

    let idx = EdgeIndexGeneric::from_parts(cfg, records, planar, interval);
    assert_eq!(idx.audit(), vec![EntryId(1), EntryId(2), EntryId(3)]);

    let out = idx.query_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
    // Canonical data still decides membership.
    assert_eq!(out.entities, BTreeSet::from([EntityId(1), EntityId(2)]));
    assert!(out.is_degraded());
    assert_eq!(
        out.warnings,
        vec![
            IndexError::InconsistentEntry(EntryId(1)),
            IndexError::InconsistentEntry(EntryId(2)),
            IndexError::InconsistentEntry(EntryId(3)),
        ]
    );

    assert_eq!(idx.run_repairs(), 3);
    assert!(idx.audit().is_empty());
    let out = idx.query_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).unwrap();
    assert!(!out.is_degraded());
    assert_eq!(out.entities, BTreeSet::from([EntityId(1), EntityId(2)]));
}

#[test]
fn readers_never_see_half_applied_transactions() {
    let idx = EdgeIndex::new();
    let ids = skeleton(&idx, EntityId(1), 0.0, 8);
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    // The skeleton lives either all near x = 0 or all near x = 500.
                    let near = idx
                        .query_box(p(-1.0, -1.0, 0.0), p(3.0, 10.0, 400.0))
                        .unwrap();
                    let far = idx
                        .query_box(p(499.0, -1.0, 0.0), p(503.0, 10.0, 400.0))
                        .unwrap();
                    assert!(!near.is_degraded() && !far.is_degraded());
                    let edges = idx
                        .query_edges(p(-1.0, -1.0, 0.0), p(503.0, 10.0, 400.0))
                        .unwrap();
                    let xs: BTreeSet<bool> = edges.edges.iter().map(|(_, r)| r.p1.x > 100.0).collect();
                    assert!(xs.len() <= 1, "mixed old and new geometry");
                }
            });
        }
        for round in 0..50 {
            let dx = if round % 2 == 0 { 500.0 } else { -500.0 };
            let mut txn = idx.begin();
            for &id in &ids {
                let r = txn.get_edge(id).unwrap();
                txn.update_edge_geometry(id, p(r.p0.x + dx, r.p0.y, r.p0.z), p(r.p1.x + dx, r.p1.y, r.p1.z))
                    .unwrap();
            }
            txn.commit();
        }
        done.store(true, Ordering::Release);
    });

    assert!(idx.audit().is_empty());
    assert_eq!(idx.len(), ids.len());
}

#[test]
fn concurrent_writers_serialize() {
    let idx = EdgeIndex::new();
    std::thread::scope(|s| {
        for t in 0..4_u64 {
            let idx = &idx;
            s.spawn(move || {
                for i in 0..25 {
                    let z = f64::from(i) * 40.0;
                    idx.insert_edge(EntityId(t), EdgeKind::Treenode, p(0.0, 0.0, z), p(1.0, 1.0, z + 40.0))
                        .unwrap();
                }
            });
        }
    });
    assert_eq!(idx.len(), 100);
    let ids: BTreeSet<_> = idx.export_rows().iter().map(|r| r.entry_id).collect();
    assert_eq!(ids.len(), 100);
    let all = idx.query_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0)).unwrap();
    assert_eq!(all.entities.len(), 4);
}
