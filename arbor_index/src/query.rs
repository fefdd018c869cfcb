// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite box queries.
//!
//! A 3D box query is split into a planar rectangle over the two non-slicing axes
//! and a range on the slicing axis. Axis-aligned boxes intersect iff they overlap
//! on every axis, so an edge matches iff its planar box intersects the rectangle
//! and its axis range overlaps the range. Each sub-index answers one half; the
//! intersection of the two candidate sets is the exact answer.

use std::collections::{BTreeSet, HashSet};

use crate::edge::{EdgeKinds, EdgeRecord, EntityId, EntryId};
use crate::error::{IndexError, Result};
use crate::index::{EdgeIndexGeneric, State};
use crate::interval::IntervalBackend;
use crate::planar::PlanarBackend;
use crate::types::{Aabb3D, Axis, Point3, le};

/// Entities matched by a box query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOutcome {
    /// Owners of every matching edge, each once.
    pub entities: BTreeSet<EntityId>,
    /// [`IndexError::InconsistentEntry`] for every entry found out of sync while answering.
    pub warnings: Vec<IndexError>,
}

impl QueryOutcome {
    /// Whether inconsistencies were detected. The entities are still exact with
    /// respect to the record store.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Drop the warnings and keep the entity set.
    pub fn into_entities(self) -> BTreeSet<EntityId> {
        self.entities
    }
}

/// Matching edges with their records, in entry id order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeHits {
    /// `(entry, record)` for every matching edge.
    pub edges: Vec<(EntryId, EdgeRecord)>,
    /// Same as [`QueryOutcome::warnings`].
    pub warnings: Vec<IndexError>,
}

/// Build the query box, rejecting bounds that are inverted or NaN on any axis.
pub(crate) fn query_bounds(min: Point3, max: Point3) -> Result<Aabb3D> {
    for axis in Axis::ALL {
        let (lo, hi) = (min.get(axis), max.get(axis));
        if !le(lo, hi) {
            return Err(IndexError::InvalidQuery {
                axis,
                min: lo,
                max: hi,
            });
        }
    }
    Ok(Aabb3D::new(min, max))
}

impl<P: PlanarBackend, I: IntervalBackend> EdgeIndexGeneric<P, I> {
    /// Entities owning an edge whose 3D bounding box intersects `[min, max]`.
    ///
    /// Boundaries are closed: touching counts. Infinite bounds are accepted.
    pub fn query_box(&self, min: Point3, max: Point3) -> Result<QueryOutcome> {
        self.query_box_kinds(min, max, EdgeKinds::all())
    }

    /// [`Self::query_box`] restricted to edges of the given kinds.
    pub fn query_box_kinds(
        &self,
        min: Point3,
        max: Point3,
        kinds: EdgeKinds,
    ) -> Result<QueryOutcome> {
        let hits = self.query_edges_kinds(min, max, kinds)?;
        Ok(QueryOutcome {
            entities: hits.edges.iter().map(|(_, r)| r.entity_id).collect(),
            warnings: hits.warnings,
        })
    }

    /// Entities near `center`: the box extends `half_extent` along each axis.
    pub fn query_around(&self, center: Point3, half_extent: Point3) -> Result<QueryOutcome> {
        let min = Point3::new(
            center.x - half_extent.x,
            center.y - half_extent.y,
            center.z - half_extent.z,
        );
        let max = Point3::new(
            center.x + half_extent.x,
            center.y + half_extent.y,
            center.z + half_extent.z,
        );
        self.query_box(min, max)
    }

    /// Matching edges with their records instead of owner ids.
    pub fn query_edges(&self, min: Point3, max: Point3) -> Result<EdgeHits> {
        self.query_edges_kinds(min, max, EdgeKinds::all())
    }

    fn query_edges_kinds(&self, min: Point3, max: Point3, kinds: EdgeKinds) -> Result<EdgeHits> {
        let bounds = query_bounds(min, max)?;
        let slicing = self.config.slicing_axis;
        let (rect, range) = bounds.project(slicing);

        let state = self.state.read();
        let mut planar: HashSet<EntryId> = state.planar.query_rect(rect).collect();
        let planar_count = planar.len();
        let mut both = Vec::new();
        let mut one_sided = Vec::new();
        for id in state.interval.query_overlapping(range) {
            if planar.remove(&id) {
                both.push(id);
            } else if self.config.verify_candidates {
                one_sided.push(id);
            }
        }
        let axis_count = both.len() + one_sided.len();
        if self.config.verify_candidates {
            one_sided.extend(planar.drain());
        }

        let mut edges = Vec::with_capacity(both.len());
        let mut inconsistent = BTreeSet::new();
        for (id, in_both) in both
            .into_iter()
            .map(|id| (id, true))
            .chain(one_sided.into_iter().map(|id| (id, false)))
        {
            let Some(record) = state.records.get(id) else {
                // Orphaned sub-index row.
                inconsistent.insert(id);
                continue;
            };
            let checked = !in_both || self.config.verify_derived;
            if checked && !state.entry_matches(id, record, slicing) {
                inconsistent.insert(id);
                if record.bounds().intersects(&bounds) && kinds.admits(record.kind) {
                    edges.push((id, *record));
                }
                continue;
            }
            if in_both && kinds.admits(record.kind) {
                edges.push((id, *record));
            }
        }
        log::trace!(
            "box query: {planar_count} planar candidates, {axis_count} axis candidates, {} hits",
            edges.len()
        );
        edges.sort_unstable_by_key(|(id, _)| *id);
        let warnings = self.flag_inconsistent(&state, inconsistent);
        Ok(EdgeHits { edges, warnings })
    }

    fn flag_inconsistent(
        &self,
        state: &State<P, I>,
        inconsistent: BTreeSet<EntryId>,
    ) -> Vec<IndexError> {
        if inconsistent.is_empty() {
            return Vec::new();
        }
        let mut queue = self.repairs.lock();
        inconsistent
            .into_iter()
            .map(|id| {
                log::warn!(
                    "edge entry {id} is out of sync with its sub-indexes (record present: {}); queued for repair",
                    state.records.contains(id)
                );
                queue.insert(id);
                IndexError::InconsistentEntry(id)
            })
            .collect()
    }
}
