// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactional edits, persisted rows, and repair of a diverged index.
//!
//! Run:
//! - `cargo run -p arbor_demos --example edit_and_repair`

use arbor_index::{
    AxisRange, EdgeIndex, EdgeIndexGeneric, EdgeKind, EdgeRow, EdgeStore, EntityId, FlatScan,
    FlatSpans, IndexConfig, IntervalBackend, PlanarBackend, Point3,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let idx = EdgeIndex::new();
    let root = Point3::new(0.0, 0.0, 0.0);
    let Ok(trunk) = idx.insert_edge(EntityId(1), EdgeKind::Treenode, root, Point3::new(10.0, 0.0, 40.0))
    else {
        return;
    };

    // Split the trunk at a new node: one move plus one insert, visible together.
    let mut txn = idx.begin();
    let mid = Point3::new(5.0, 0.0, 40.0);
    let branch = txn
        .update_edge_geometry(trunk, root, mid)
        .and_then(|()| txn.insert_edge(EntityId(1), EdgeKind::Treenode, mid, Point3::new(10.0, 0.0, 80.0)));
    match branch {
        Ok(id) => println!("split trunk {trunk} at {mid:?}, new edge {id}"),
        Err(err) => println!("edit failed: {err}"),
    }
    let damage = txn.commit();
    println!("damage: {} added, {} moved", damage.added.len(), damage.moved.len());

    // Persist and reload.
    let rows = idx.export_rows();
    let json = serde_json::to_string_pretty(&rows).unwrap_or_default();
    println!("{json}");
    let back: Vec<EdgeRow> = serde_json::from_str(&json).unwrap_or_default();
    match EdgeIndex::from_rows(IndexConfig::default(), back) {
        Ok(reloaded) => println!("reloaded {} edges", reloaded.len()),
        Err(err) => println!("reload failed: {err}"),
    }

    // Assemble an index whose interval rows lost an entry and kept a stale one.
    let mut records = Vec::new();
    let mut planar = FlatScan::new();
    let mut interval = FlatSpans::new();
    for row in &rows {
        if let Ok(record) = row.record() {
            records.push((row.entry_id, record));
        }
        planar.insert(row.entry_id, row.planar_box);
    }
    if let Some(row) = rows.first() {
        interval.insert(row.entry_id, AxisRange::new(500.0, 540.0));
    }
    let Ok(store) = EdgeStore::from_records(records) else {
        return;
    };
    let diverged = EdgeIndexGeneric::from_parts(IndexConfig::default(), store, planar, interval);
    println!("audit before repair: {:?}", diverged.audit());

    if let Ok(out) = diverged.query_box(root, Point3::new(10.0, 10.0, 80.0)) {
        println!("degraded={} entities={:?}", out.is_degraded(), out.entities);
        for warning in &out.warnings {
            println!("  {warning}");
        }
    }
    println!("repaired {} entries", diverged.run_repairs());
    println!("audit after repair: {:?}", diverged.audit());
}
