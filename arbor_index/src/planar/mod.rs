// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Planar index: rectangles in the slicing plane keyed by entry id.
//!
//! - `flat`: linear scans. Small, simple, and the reference the others are tested against.
//! - `grid`: hashed uniform grid with an origin offset; good when edges are short
//!   relative to the cell size, which is the common case for skeleton data.
//! - `rtree`: R-tree with SAH-like splits and packed bulk loading. The default.
//!
//! SAH note
//! --------
//! For a split point `k` along a sorted axis the R-tree minimizes
//!
//! `cost(k) = m(LB_k) * k + m(RB_k) * (n - k)`
//!
//! where `LB_k` and `RB_k` bound the first `k` and remaining `n - k` children and `m`
//! is the area plus the half perimeter. Skeleton edges project to thin boxes, so the
//! perimeter term keeps zero-area candidates distinguishable.

use std::fmt::Debug;

use crate::edge::EntryId;
use crate::types::Aabb2D;

pub mod flat;
pub mod grid;
pub mod rtree;

pub use flat::FlatScan;
pub use grid::UniformGrid;
pub use rtree::RTree;

/// Spatial structure over planar bounding boxes.
///
/// Every query uses closed-interval semantics on both axes and yields each
/// matching id exactly once, in no particular order. Implementations know
/// nothing about edge lifecycles; they hold exactly the entries given to them.
pub trait PlanarBackend: Debug + Send + Sync {
    /// Insert an entry. Inserting an id that is already present replaces it.
    fn insert(&mut self, id: EntryId, rect: Aabb2D);

    /// Replace the rectangle of an existing entry; inserts if it is missing.
    fn update(&mut self, id: EntryId, rect: Aabb2D);

    /// Remove an entry. Unknown ids are ignored.
    fn remove(&mut self, id: EntryId);

    /// Remove every entry.
    fn clear(&mut self);

    /// The stored rectangle of an entry.
    fn get(&self, id: EntryId) -> Option<Aabb2D>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids whose rectangle intersects `rect`, boundaries included.
    fn query_rect<'a>(&'a self, rect: Aabb2D) -> Box<dyn Iterator<Item = EntryId> + 'a>;

    /// Replace the whole content with `items`.
    fn bulk_load(&mut self, items: &[(EntryId, Aabb2D)]) {
        self.clear();
        for &(id, rect) in items {
            self.insert(id, rect);
        }
    }
}
