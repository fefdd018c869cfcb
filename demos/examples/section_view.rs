// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field-of-view queries over a few synthetic skeletons.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p arbor_demos --example section_view`

use arbor_index::{EdgeIndex, EdgeKind, EdgeKinds, EntityId, Point3};

const SECTION: f64 = 40.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let idx = EdgeIndex::new();
    let mut txn = idx.begin();
    // Three neurons, each a spiral climbing through 20 sections.
    for n in 0..3_u64 {
        let cx = n as f64 * 300.0;
        let mut prev = Point3::new(cx, 0.0, 0.0);
        for s in 1..=20 {
            let a = f64::from(s) * 0.6;
            let next = Point3::new(cx + 80.0 * a.cos(), 80.0 * a.sin(), f64::from(s) * SECTION);
            if let Err(err) = txn.insert_edge(EntityId(n), EdgeKind::Treenode, prev, next) {
                log::error!("skipping edge: {err}");
            }
            prev = next;
        }
        // A synapse on each neuron, stored as a point.
        let synapse = Point3::new(cx, 0.0, 10.0 * SECTION);
        let _ = txn.insert_edge(EntityId(100 + n), EdgeKind::ConnectorGeometry, synapse, synapse);
    }
    let damage = txn.commit();
    println!("indexed {} edges, dirty region {:?}", idx.len(), damage.union());

    // Step through sections with a fixed 500x500 view, one section deep.
    for section in [0, 5, 10, 19] {
        let z = f64::from(section) * SECTION;
        let view = idx.query_box(
            Point3::new(-100.0, -100.0, z),
            Point3::new(400.0, 400.0, z + SECTION),
        );
        match view {
            Ok(out) => println!("section {section:>2}: {:?}", out.entities),
            Err(err) => println!("section {section:>2}: {err}"),
        }
    }

    // Connectors only, around the synapse layer.
    let synapses = idx.query_box_kinds(
        Point3::new(-1_000.0, -1_000.0, 9.0 * SECTION),
        Point3::new(1_000.0, 1_000.0, 11.0 * SECTION),
        EdgeKinds::CONNECTOR_GEOMETRY,
    );
    if let Ok(out) = synapses {
        println!("connectors near section 10: {:?}", out.entities);
    }

    // An inverted box is rejected before either sub-index is touched.
    if let Err(err) = idx.query_box(Point3::new(0.0, 0.0, 10.0), Point3::new(1.0, 1.0, 0.0)) {
        println!("rejected: {err}");
    }
}
