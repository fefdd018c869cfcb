// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical edge storage and the persisted row layout.
//!
//! The store is the only owner of edge geometry. Planar and interval entries are
//! derived from it and can always be re-derived, which is what
//! [`EdgeIndexGeneric::rebuild`](crate::EdgeIndexGeneric::rebuild) relies on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::edge::{EdgeKind, EdgeRecord, EntityId, EntryId, validate_endpoints};
use crate::error::Result;
use crate::range::AxisRange;
use crate::types::{Aabb2D, Axis, Point3};

/// Canonical records keyed by entry id.
#[derive(Clone, Debug, Default)]
pub struct EdgeStore {
    records: BTreeMap<EntryId, EdgeRecord>,
}

impl EdgeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing records, validating every endpoint.
    pub fn from_records(records: impl IntoIterator<Item = (EntryId, EdgeRecord)>) -> Result<Self> {
        let mut store = Self::new();
        for (id, record) in records {
            validate_endpoints(record.p0, record.p1)?;
            store.records.insert(id, record);
        }
        Ok(store)
    }

    /// Number of live edges.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no edges.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up an edge.
    pub fn get(&self, id: EntryId) -> Option<&EdgeRecord> {
        self.records.get(&id)
    }

    /// Whether `id` names a live edge.
    pub fn contains(&self, id: EntryId) -> bool {
        self.records.contains_key(&id)
    }

    /// Iterate records in entry id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &EdgeRecord)> + '_ {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    /// Largest entry id in use.
    pub(crate) fn max_id(&self) -> Option<EntryId> {
        self.records.keys().next_back().copied()
    }

    pub(crate) fn put(&mut self, id: EntryId, record: EdgeRecord) -> Option<EdgeRecord> {
        self.records.insert(id, record)
    }

    pub(crate) fn take(&mut self, id: EntryId) -> Option<EdgeRecord> {
        self.records.remove(&id)
    }
}

/// Persisted form of one edge: canonical fields plus the derived entries.
///
/// The derived fields are informational; loading always re-derives them from
/// `p0` and `p1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    /// Entry id.
    pub entry_id: EntryId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Edge family.
    pub kind: EdgeKind,
    /// First endpoint.
    pub p0: Point3,
    /// Second endpoint.
    pub p1: Point3,
    /// Derived span along the slicing axis.
    pub axis_range: AxisRange,
    /// Derived planar bounding box.
    pub planar_box: Aabb2D,
}

impl EdgeRow {
    /// Build a row for `record` with entries derived for `slicing`.
    pub fn derive(entry_id: EntryId, record: &EdgeRecord, slicing: Axis) -> Self {
        Self {
            entry_id,
            entity_id: record.entity_id,
            kind: record.kind,
            p0: record.p0,
            p1: record.p1,
            axis_range: record.axis_range(slicing),
            planar_box: record.planar_box(slicing),
        }
    }

    /// The canonical record held by this row.
    pub fn record(&self) -> Result<EdgeRecord> {
        EdgeRecord::new(self.entity_id, self.kind, self.p0, self.p1)
    }

    /// Whether the persisted derived fields match the endpoints.
    pub fn derived_matches(&self, slicing: Axis) -> bool {
        let canonical = EdgeRecord {
            entity_id: self.entity_id,
            kind: self.kind,
            p0: self.p0,
            p1: self.p1,
        };
        canonical.axis_range(slicing) == self.axis_range
            && canonical.planar_box(slicing) == self.planar_box
    }
}
