// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector interval backend with linear scans.

use std::collections::HashMap;
use std::fmt::Debug;

use super::IntervalBackend;
use crate::edge::EntryId;
use crate::range::AxisRange;

/// Flat vector backend with linear scans.
#[derive(Default)]
pub struct FlatSpans {
    entries: Vec<(EntryId, AxisRange)>,
    positions: HashMap<EntryId, usize>,
}

impl FlatSpans {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Debug for FlatSpans {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatSpans")
            .field("alive", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl IntervalBackend for FlatSpans {
    fn insert(&mut self, id: EntryId, range: AxisRange) {
        if let Some(&pos) = self.positions.get(&id) {
            self.entries[pos].1 = range;
            return;
        }
        self.positions.insert(id, self.entries.len());
        self.entries.push((id, range));
    }

    fn update(&mut self, id: EntryId, range: AxisRange) {
        self.insert(id, range);
    }

    fn remove(&mut self, id: EntryId) {
        let Some(pos) = self.positions.remove(&id) else {
            return;
        };
        self.entries.swap_remove(pos);
        if let Some(&(moved, _)) = self.entries.get(pos) {
            self.positions.insert(moved, pos);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    fn get(&self, id: EntryId) -> Option<AxisRange> {
        self.positions.get(&id).map(|&pos| self.entries[pos].1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query_overlapping<'a>(
        &'a self,
        query: AxisRange,
    ) -> Box<dyn Iterator<Item = EntryId> + 'a> {
        Box::new(
            self.entries
                .iter()
                .filter(move |(_, r)| r.overlaps(&query))
                .map(|(id, _)| *id),
        )
    }
}
