// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `EdgeIndex` API and generic implementation over pluggable sub-indexes.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::config::IndexConfig;
use crate::edge::{EdgeKind, EdgeRecord, EntityId, EntryId};
use crate::error::Result;
use crate::interval::{IntervalBackend, SortedSpans};
use crate::planar::{PlanarBackend, RTree, UniformGrid};
use crate::range::AxisRange;
use crate::store::{EdgeRow, EdgeStore};
use crate::txn::Transaction;
use crate::types::{Aabb2D, Axis, Point3};

/// Record store plus both sub-indexes. Always locked as one unit.
#[derive(Debug)]
pub(crate) struct State<P, I> {
    pub(crate) records: EdgeStore,
    pub(crate) planar: P,
    pub(crate) interval: I,
}

impl<P: PlanarBackend, I: IntervalBackend> State<P, I> {
    pub(crate) fn index_entry(&mut self, id: EntryId, record: &EdgeRecord, slicing: Axis) {
        self.planar.insert(id, record.planar_box(slicing));
        self.interval.insert(id, record.axis_range(slicing));
    }

    pub(crate) fn unindex_entry(&mut self, id: EntryId) {
        self.planar.remove(id);
        self.interval.remove(id);
    }

    /// Whether both sub-indexes hold exactly the entries derived from `record`.
    pub(crate) fn entry_matches(&self, id: EntryId, record: &EdgeRecord, slicing: Axis) -> bool {
        self.planar.get(id) == Some(record.planar_box(slicing))
            && self.interval.get(id) == Some(record.axis_range(slicing))
    }

    fn rebuild(&mut self, slicing: Axis) {
        let boxes: Vec<(EntryId, Aabb2D)> = self
            .records
            .iter()
            .map(|(id, r)| (id, r.planar_box(slicing)))
            .collect();
        let ranges: Vec<(EntryId, AxisRange)> = self
            .records
            .iter()
            .map(|(id, r)| (id, r.axis_range(slicing)))
            .collect();
        self.planar.bulk_load(&boxes);
        self.interval.bulk_load(&ranges);
    }

    fn planar_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.planar.query_rect(EVERYWHERE_2D)
    }

    fn interval_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.interval.query_overlapping(EVERYWHERE_1D)
    }
}

const EVERYWHERE_2D: Aabb2D = Aabb2D::new(
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::INFINITY,
);

const EVERYWHERE_1D: AxisRange = AxisRange::new(f64::NEG_INFINITY, f64::INFINITY);

/// Composite edge index parameterized by its planar and interval backends.
///
/// All methods take `&self`; share the index between worker threads with an `Arc`.
/// Writes go through [`Transaction`]s, one at a time. Queries run concurrently
/// with an open transaction and see the last committed state.
#[derive(Debug)]
pub struct EdgeIndexGeneric<P: PlanarBackend, I: IntervalBackend> {
    pub(crate) config: IndexConfig,
    pub(crate) state: RwLock<State<P, I>>,
    next_id: AtomicU64,
    pub(crate) repairs: Mutex<BTreeSet<EntryId>>,
}

/// Default index: R-tree planar backend and sorted interval backend.
pub type EdgeIndex = EdgeIndexGeneric<RTree, SortedSpans>;

impl<P, I> EdgeIndexGeneric<P, I>
where
    P: PlanarBackend + Default,
    I: IntervalBackend + Default,
{
    /// Create an empty index with the default configuration.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Create an empty index with `config`.
    pub fn with_config(config: IndexConfig) -> Self {
        Self::with_backends(config, P::default(), I::default())
    }

    /// Reconstruct an index from persisted rows.
    ///
    /// Derived entries are always recomputed from `p0`/`p1`; rows whose stored
    /// derived fields disagree are logged and otherwise ignored.
    pub fn from_rows(config: IndexConfig, rows: impl IntoIterator<Item = EdgeRow>) -> Result<Self> {
        let slicing = config.slicing_axis;
        let mut records = EdgeStore::new();
        let mut stale = 0_usize;
        for row in rows {
            let record = row.record()?;
            if !row.derived_matches(slicing) {
                log::warn!(
                    "edge row {} carries stale derived geometry; re-deriving",
                    row.entry_id
                );
                stale += 1;
            }
            records.put(row.entry_id, record);
        }
        let index = Self::with_backends(config, P::default(), I::default());
        {
            let mut state = index.state.write();
            state.records = records;
            state.rebuild(slicing);
            index.bump_next_id(state.records.max_id());
            log::info!(
                "loaded {} edge rows ({} with stale derived geometry)",
                state.records.len(),
                stale
            );
        }
        Ok(index)
    }
}

impl<P, I> Default for EdgeIndexGeneric<P, I>
where
    P: PlanarBackend + Default,
    I: IntervalBackend + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeIndex {
    /// Create an index backed by a uniform grid planar backend.
    pub fn with_uniform_grid(
        config: IndexConfig,
        cell_u: f64,
        cell_v: f64,
        origin_u: f64,
        origin_v: f64,
    ) -> EdgeIndexGeneric<UniformGrid, SortedSpans> {
        EdgeIndexGeneric::with_backends(
            config,
            UniformGrid::new(cell_u, cell_v, origin_u, origin_v),
            SortedSpans::new(),
        )
    }
}

impl<P: PlanarBackend, I: IntervalBackend> EdgeIndexGeneric<P, I> {
    /// Create an empty index with explicit backend instances.
    ///
    /// Both backends must be empty; use [`Self::from_parts`] to adopt existing state.
    pub fn with_backends(config: IndexConfig, planar: P, interval: I) -> Self {
        debug_assert!(
            planar.is_empty() && interval.is_empty(),
            "with_backends expects empty backends"
        );
        Self {
            config,
            state: RwLock::new(State {
                records: EdgeStore::new(),
                planar,
                interval,
            }),
            next_id: AtomicU64::new(1),
            repairs: Mutex::new(BTreeSet::new()),
        }
    }

    /// Assemble an index from separately persisted pieces, taken as they are.
    ///
    /// No consistency check is performed; divergence surfaces through queries,
    /// [`Self::audit`], and is fixed by [`Self::run_repairs`] or [`Self::rebuild`].
    pub fn from_parts(config: IndexConfig, records: EdgeStore, planar: P, interval: I) -> Self {
        let index = Self {
            config,
            state: RwLock::new(State {
                records,
                planar,
                interval,
            }),
            next_id: AtomicU64::new(1),
            repairs: Mutex::new(BTreeSet::new()),
        };
        {
            let state = index.state.read();
            let highest = state
                .records
                .max_id()
                .into_iter()
                .chain(state.planar_ids())
                .chain(state.interval_ids())
                .max();
            index.bump_next_id(highest);
        }
        index
    }

    fn bump_next_id(&self, highest: Option<EntryId>) {
        if let Some(EntryId(h)) = highest {
            self.next_id.fetch_max(h + 1, Ordering::Relaxed);
        }
    }

    pub(crate) fn allocate_id(&self) -> EntryId {
        EntryId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// The configuration this index was built with.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of live edges.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Whether the index holds no edges.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical record for an entry.
    pub fn get_edge(&self, id: EntryId) -> Option<EdgeRecord> {
        self.state.read().records.get(id).copied()
    }

    /// Start a write transaction.
    ///
    /// Blocks while another transaction is open. Do not call the single-operation
    /// write helpers on this index from the thread holding the transaction.
    pub fn begin(&self) -> Transaction<'_, P, I> {
        Transaction::new(self, self.state.upgradable_read())
    }

    /// Insert one edge in its own transaction.
    pub fn insert_edge(
        &self,
        entity_id: EntityId,
        kind: EdgeKind,
        p0: Point3,
        p1: Point3,
    ) -> Result<EntryId> {
        let mut txn = self.begin();
        let id = txn.insert_edge(entity_id, kind, p0, p1)?;
        txn.commit();
        Ok(id)
    }

    /// Move one edge in its own transaction.
    pub fn update_edge_geometry(&self, id: EntryId, p0: Point3, p1: Point3) -> Result<()> {
        let mut txn = self.begin();
        txn.update_edge_geometry(id, p0, p1)?;
        txn.commit();
        Ok(())
    }

    /// Delete one edge in its own transaction.
    pub fn delete_edge(&self, id: EntryId) -> Result<()> {
        let mut txn = self.begin();
        txn.delete_edge(id)?;
        txn.commit();
        Ok(())
    }

    /// Clear both sub-indexes and reload them from the record store.
    pub fn rebuild(&self) {
        let mut state = self.state.write();
        state.rebuild(self.config.slicing_axis);
        self.repairs.lock().clear();
        log::info!("rebuilt sub-indexes from {} edge records", state.records.len());
    }

    /// Entries queued for repair by queries that found them inconsistent.
    pub fn pending_repairs(&self) -> Vec<EntryId> {
        self.repairs.lock().iter().copied().collect()
    }

    /// Re-derive the sub-index rows of every queued entry. Returns how many were repaired.
    ///
    /// Entries without a record are removed from both sub-indexes.
    pub fn run_repairs(&self) -> usize {
        let queued = core::mem::take(&mut *self.repairs.lock());
        if queued.is_empty() {
            return 0;
        }
        let slicing = self.config.slicing_axis;
        let mut state = self.state.write();
        for &id in &queued {
            state.unindex_entry(id);
            if let Some(record) = state.records.get(id).copied() {
                state.index_entry(id, &record, slicing);
            }
        }
        log::info!("repaired {} inconsistent edge entries", queued.len());
        queued.len()
    }

    /// Every entry whose record and sub-index rows disagree, including orphaned rows.
    pub fn audit(&self) -> Vec<EntryId> {
        let slicing = self.config.slicing_axis;
        let state = self.state.read();
        let mut bad: BTreeSet<EntryId> = state
            .records
            .iter()
            .filter(|(id, r)| !state.entry_matches(*id, r, slicing))
            .map(|(id, _)| id)
            .collect();
        bad.extend(
            state
                .planar_ids()
                .chain(state.interval_ids())
                .filter(|id| !state.records.contains(*id)),
        );
        for id in &bad {
            log::warn!("audit: edge entry {id} is inconsistent");
        }
        bad.into_iter().collect()
    }

    /// Persisted rows for every live edge, in entry id order.
    pub fn export_rows(&self) -> Vec<EdgeRow> {
        let slicing = self.config.slicing_axis;
        self.state
            .read()
            .records
            .iter()
            .map(|(id, r)| EdgeRow::derive(id, r, slicing))
            .collect()
    }
}
