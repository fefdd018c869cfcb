// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interval index: spans along the slicing axis keyed by entry id.
//!
//! - `flat`: linear scans; the reference backend.
//! - `sorted`: ordered by lower bound within power-of-two length classes, each class
//!   bounding how far left of the query one of its spans can start.

use std::fmt::Debug;

use crate::edge::EntryId;
use crate::range::AxisRange;

pub mod flat;
pub mod sorted;

pub use flat::FlatSpans;
pub use sorted::SortedSpans;

/// Overlap structure over [`AxisRange`]s.
///
/// Same contract shape as [`PlanarBackend`](crate::planar::PlanarBackend):
/// closed-interval overlap, each id at most once per query, order unspecified.
pub trait IntervalBackend: Debug + Send + Sync {
    /// Insert an entry. Inserting an id that is already present replaces it.
    fn insert(&mut self, id: EntryId, range: AxisRange);

    /// Replace the range of an existing entry; inserts if it is missing.
    fn update(&mut self, id: EntryId, range: AxisRange);

    /// Remove an entry. Unknown ids are ignored.
    fn remove(&mut self, id: EntryId);

    /// Remove every entry.
    fn clear(&mut self);

    /// The stored range of an entry.
    fn get(&self, id: EntryId) -> Option<AxisRange>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids whose range overlaps `query`, endpoints included.
    fn query_overlapping<'a>(&'a self, query: AxisRange)
    -> Box<dyn Iterator<Item = EntryId> + 'a>;

    /// Replace the whole content with `items`.
    fn bulk_load(&mut self, items: &[(EntryId, AxisRange)]) {
        self.clear();
        for &(id, range) in items {
            self.insert(id, range);
        }
    }
}
