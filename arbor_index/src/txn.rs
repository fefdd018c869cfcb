// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Write transactions: staged edge changes applied atomically on commit.

use std::collections::BTreeMap;

use parking_lot::RwLockUpgradableReadGuard;

use crate::damage::Damage;
use crate::edge::{EdgeKind, EdgeRecord, EntityId, EntryId};
use crate::error::{IndexError, Result};
use crate::index::{EdgeIndexGeneric, State};
use crate::interval::IntervalBackend;
use crate::planar::PlanarBackend;
use crate::types::Point3;

/// Open write transaction on an [`EdgeIndexGeneric`].
///
/// Changes are staged and become visible to queries only on [`Transaction::commit`],
/// all at once. Dropping the transaction without committing discards them.
///
/// Only one transaction is open at a time; [`EdgeIndexGeneric::begin`] blocks until
/// the previous one ends. Queries are never blocked by staging, only briefly by commit.
pub struct Transaction<'a, P: PlanarBackend, I: IntervalBackend> {
    index: &'a EdgeIndexGeneric<P, I>,
    guard: RwLockUpgradableReadGuard<'a, State<P, I>>,
    /// `Some` for inserted or modified records, `None` for deletions.
    staged: BTreeMap<EntryId, Option<EdgeRecord>>,
}

impl<P: PlanarBackend, I: IntervalBackend> core::fmt::Debug for Transaction<'_, P, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transaction")
            .field("staged", &self.staged.len())
            .finish_non_exhaustive()
    }
}

impl<'a, P: PlanarBackend, I: IntervalBackend> Transaction<'a, P, I> {
    pub(crate) fn new(
        index: &'a EdgeIndexGeneric<P, I>,
        guard: RwLockUpgradableReadGuard<'a, State<P, I>>,
    ) -> Self {
        Self {
            index,
            guard,
            staged: BTreeMap::new(),
        }
    }

    /// The record as this transaction sees it: staged value first, then committed state.
    pub fn get_edge(&self, id: EntryId) -> Option<EdgeRecord> {
        match self.staged.get(&id) {
            Some(staged) => *staged,
            None => self.guard.records.get(id).copied(),
        }
    }

    /// Whether nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Stage a new edge and return its freshly allocated entry id.
    pub fn insert_edge(
        &mut self,
        entity_id: EntityId,
        kind: EdgeKind,
        p0: Point3,
        p1: Point3,
    ) -> Result<EntryId> {
        let record = EdgeRecord::new(entity_id, kind, p0, p1)?;
        let id = self.index.allocate_id();
        self.staged.insert(id, Some(record));
        Ok(id)
    }

    /// Stage new endpoints for an existing edge, keeping its owner and kind.
    pub fn update_edge_geometry(&mut self, id: EntryId, p0: Point3, p1: Point3) -> Result<()> {
        let current = self.get_edge(id).ok_or(IndexError::EntryNotFound(id))?;
        let record = current.with_geometry(p0, p1)?;
        self.staged.insert(id, Some(record));
        Ok(())
    }

    /// Stage a full replacement record for an existing edge.
    pub fn update_edge(&mut self, id: EntryId, record: EdgeRecord) -> Result<()> {
        if self.get_edge(id).is_none() {
            return Err(IndexError::EntryNotFound(id));
        }
        let record = EdgeRecord::new(record.entity_id, record.kind, record.p0, record.p1)?;
        self.staged.insert(id, Some(record));
        Ok(())
    }

    /// Stage the deletion of an edge.
    ///
    /// Deleting an id that is not live (never existed, or already deleted) fails
    /// with [`IndexError::EntryNotFound`] and leaves the transaction unchanged.
    pub fn delete_edge(&mut self, id: EntryId) -> Result<()> {
        if self.get_edge(id).is_none() {
            return Err(IndexError::EntryNotFound(id));
        }
        self.staged.insert(id, None);
        Ok(())
    }

    /// Discard every staged change.
    pub fn rollback(self) {
        if !self.staged.is_empty() {
            log::debug!("rolled back transaction with {} staged edges", self.staged.len());
        }
    }

    /// Apply every staged change to the record store and both sub-indexes at once.
    ///
    /// Returns the world-space boxes affected.
    pub fn commit(self) -> Damage {
        let Self {
            index,
            guard,
            staged,
        } = self;
        let slicing = index.config.slicing_axis;
        let mut damage = Damage::default();
        if staged.is_empty() {
            return damage;
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(guard);
        for (id, change) in &staged {
            let id = *id;
            match (state.records.get(id).copied(), change) {
                (None, Some(new)) => {
                    state.index_entry(id, new, slicing);
                    state.records.put(id, *new);
                    damage.added.push(new.bounds());
                }
                (Some(old), None) => {
                    state.unindex_entry(id);
                    state.records.take(id);
                    damage.removed.push(old.bounds());
                }
                (Some(old), Some(new)) => {
                    state.planar.update(id, new.planar_box(slicing));
                    state.interval.update(id, new.axis_range(slicing));
                    state.records.put(id, *new);
                    if old.bounds() != new.bounds() {
                        damage.moved.push((old.bounds(), new.bounds()));
                    }
                }
                // Inserted and deleted within this transaction.
                (None, None) => {}
            }
        }
        log::debug!(
            "committed {} edges: {} added, {} removed, {} moved",
            staged.len(),
            damage.added.len(),
            damage.removed.len(),
            damage.moved.len()
        );
        damage
    }
}
