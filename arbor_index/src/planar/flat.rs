// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend with linear scans. Small and simple; good for tiny sets.

use std::collections::HashMap;
use std::fmt::Debug;

use super::PlanarBackend;
use crate::edge::EntryId;
use crate::types::Aabb2D;

/// Flat vector backend with linear scans.
#[derive(Default)]
pub struct FlatScan {
    entries: Vec<(EntryId, Aabb2D)>,
    positions: HashMap<EntryId, usize>,
}

impl FlatScan {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Debug for FlatScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatScan")
            .field("alive", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl PlanarBackend for FlatScan {
    fn insert(&mut self, id: EntryId, rect: Aabb2D) {
        if let Some(&pos) = self.positions.get(&id) {
            self.entries[pos].1 = rect;
            return;
        }
        self.positions.insert(id, self.entries.len());
        self.entries.push((id, rect));
    }

    fn update(&mut self, id: EntryId, rect: Aabb2D) {
        self.insert(id, rect);
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

    fn get(&self, id: EntryId) -> Option<Aabb2D> {
        self.positions.get(&id).map(|&pos| self.entries[pos].1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D) -> Box<dyn Iterator<Item = EntryId> + 'a> {
        Box::new(
            self.entries
                .iter()
                .filter(move |(_, a)| a.intersects(&rect))
                .map(|(id, _)| *id),
        )
    }
}
