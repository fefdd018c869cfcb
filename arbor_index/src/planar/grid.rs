// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend with hashed cells.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;

use super::PlanarBackend;
use crate::edge::EntryId;
use crate::types::Aabb2D;

/// Entries covering more cells than this are kept in a separate list that every
/// query scans.
const MAX_CELLS_PER_ENTRY: i128 = 1024;

type CellKey = (i64, i64);

/// Inclusive range of cell keys covered by a rectangle.
#[derive(Copy, Clone, Debug)]
struct CellSpan {
    min: CellKey,
    max: CellKey,
}

impl CellSpan {
    /// Number of covered cells. Saturates for spans clamped to the full key range.
    fn count(&self) -> i128 {
        let w = i128::from(self.max.0) - i128::from(self.min.0) + 1;
        let h = i128::from(self.max.1) - i128::from(self.min.1) + 1;
        w.max(0).saturating_mul(h.max(0))
    }

    fn contains(&self, key: CellKey) -> bool {
        (self.min.0..=self.max.0).contains(&key.0) && (self.min.1..=self.max.1).contains(&key.1)
    }

    fn keys(self) -> impl Iterator<Item = CellKey> {
        (self.min.1..=self.max.1).flat_map(move |y| (self.min.0..=self.max.0).map(move |x| (x, y)))
    }
}

/// Uniform grid backend.
///
/// Maps rectangles to the cells they cover, using floor division of
/// `(u - origin_u) / cell_u` and `(v - origin_v) / cell_v`, so negative
/// coordinates are supported. Cells are allocated lazily.
pub struct UniformGrid {
    cell_u: f64,
    cell_v: f64,
    origin_u: f64,
    origin_v: f64,
    entries: HashMap<EntryId, Aabb2D>,
    cells: HashMap<CellKey, Vec<EntryId>>,
    oversized: HashSet<EntryId>,
}

impl UniformGrid {
    /// Create a grid with the given cell size and origin offset.
    ///
    /// # Panics
    ///
    /// Panics if a cell size is not strictly positive and finite.
    pub fn new(cell_u: f64, cell_v: f64, origin_u: f64, origin_v: f64) -> Self {
        assert!(
            cell_u > 0.0 && cell_v > 0.0 && cell_u.is_finite() && cell_v.is_finite(),
            "cell sizes must be positive and finite"
        );
        Self {
            cell_u,
            cell_v,
            origin_u,
            origin_v,
            entries: HashMap::new(),
            cells: HashMap::new(),
            oversized: HashSet::new(),
        }
    }

    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Saturating float-to-int casts clamp open-ended query bounds."
    )]
    fn floor_to_i64(v: f64) -> i64 {
        v.floor() as i64
    }

    fn key_for(&self, u: f64, v: f64) -> CellKey {
        (
            Self::floor_to_i64((u - self.origin_u) / self.cell_u),
            Self::floor_to_i64((v - self.origin_v) / self.cell_v),
        )
    }

    fn span_for(&self, a: &Aabb2D) -> CellSpan {
        CellSpan {
            min: self.key_for(a.min_u, a.min_v),
            max: self.key_for(a.max_u, a.max_v),
        }
    }

    fn place(&mut self, id: EntryId, rect: Aabb2D) {
        let span = self.span_for(&rect);
        if span.count() > MAX_CELLS_PER_ENTRY {
            self.oversized.insert(id);
        } else {
            for key in span.keys() {
                self.cells.entry(key).or_default().push(id);
            }
        }
        self.entries.insert(id, rect);
    }

    fn unplace(&mut self, id: EntryId) -> Option<Aabb2D> {
        let old = self.entries.remove(&id)?;
        if !self.oversized.remove(&id) {
            for key in self.span_for(&old).keys() {
                if let Some(slots) = self.cells.get_mut(&key) {
                    if let Some(pos) = slots.iter().position(|&s| s == id) {
                        slots.swap_remove(pos);
                    }
                    if slots.is_empty() {
                        self.cells.remove(&key);
                    }
                }
            }
        }
        Some(old)
    }
}

impl PlanarBackend for UniformGrid {
    fn insert(&mut self, id: EntryId, rect: Aabb2D) {
        self.unplace(id);
        self.place(id, rect);
    }

    fn update(&mut self, id: EntryId, rect: Aabb2D) {
        self.insert(id, rect);
    }

    fn remove(&mut self, id: EntryId) {
        self.unplace(id);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.oversized.clear();
    }

    fn get(&self, id: EntryId) -> Option<Aabb2D> {
        self.entries.get(&id).copied()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D) -> Box<dyn Iterator<Item = EntryId> + 'a> {
        let mut set = BTreeSet::new();
        let span = self.span_for(&rect);
        // Wide queries visit occupied cells instead of enumerating the span.
        let candidates: Box<dyn Iterator<Item = &Vec<EntryId>> + '_> =
            if span.count() > self.cells.len() as i128 {
                Box::new(
                    self.cells
                        .iter()
                        .filter(move |(key, _)| span.contains(**key))
                        .map(|(_, slots)| slots),
                )
            } else {
                Box::new(span.keys().filter_map(|key| self.cells.get(&key)))
            };
        for slots in candidates {
            set.extend(slots.iter().copied());
        }
        set.extend(self.oversized.iter().copied());
        Box::new(
            set.into_iter()
                .filter(move |id| self.entries.get(id).is_some_and(|a| a.intersects(&rect))),
        )
    }
}

impl Debug for UniformGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniformGrid")
            .field("cell_u", &self.cell_u)
            .field("cell_v", &self.cell_v)
            .field("origin_u", &self.origin_u)
            .field("origin_v", &self.origin_v)
            .field("alive", &self.entries.len())
            .field("cells", &self.cells.len())
            .field("oversized", &self.oversized.len())
            .finish_non_exhaustive()
    }
}
