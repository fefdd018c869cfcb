// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Index: exact 3D box queries over skeleton edges from two cheaper indexes.
//!
//! Neuron reconstructions are stored as line-segment edges between 3D nodes. The data
//! is anisotropic: sections are far apart along one axis (the slicing axis, usually
//! Z) and densely sampled in the other two. Rather than one volumetric index, each
//! edge is indexed twice:
//!
//! - its bounding box projected onto the slicing plane, in a planar index, and
//! - its span along the slicing axis, an [`AxisRange`], in an interval index.
//!
//! A box query asks both and intersects the two candidate sets by entry id. Because
//! axis-aligned boxes intersect iff they overlap on every axis, the result is exactly
//! the set of edges whose true 3D bounding box intersects the query. All intervals are
//! closed, so touching a query boundary counts.
//!
//! - Insert, move, and delete edges in atomic [`Transaction`]s and receive coarse
//!   [`Damage`] (added/removed/moved boxes).
//! - Query by box, by box and [`EdgeKinds`], or around a point.
//! - Detect and repair divergence between the record store and the sub-indexes.
//!
//! # Example
//!
//! ```rust
//! use arbor_index::{EdgeIndex, EdgeKind, EntityId, Point3};
//!
//! let idx = EdgeIndex::new();
//! let a = EntityId(1);
//! let b = EntityId(2);
//! idx.insert_edge(a, EdgeKind::Treenode, Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 5.0))?;
//! idx.insert_edge(b, EdgeKind::Treenode, Point3::new(20.0, 20.0, 20.0), Point3::new(21.0, 21.0, 21.0))?;
//!
//! let hits = idx.query_box(Point3::new(0.0, 0.0, 0.0), Point3::new(15.0, 5.0, 5.0))?;
//! assert_eq!(hits.entities.into_iter().collect::<Vec<_>>(), vec![a]);
//!
//! // Edge A spans z in [0, 5], which misses [6, 10].
//! let hits = idx.query_box(Point3::new(0.0, 0.0, 6.0), Point3::new(15.0, 5.0, 10.0))?;
//! assert!(hits.entities.is_empty());
//! # Ok::<(), arbor_index::IndexError>(())
//! ```
//!
//! Several edits can be grouped so queries see all of them or none:
//!
//! ```rust
//! use arbor_index::{EdgeIndex, EdgeKind, EntityId, Point3};
//!
//! let idx = EdgeIndex::new();
//! let mut txn = idx.begin();
//! let e = txn.insert_edge(EntityId(7), EdgeKind::Treenode, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0))?;
//! txn.update_edge_geometry(e, Point3::new(0.0, 0.0, 40.0), Point3::new(1.0, 1.0, 80.0))?;
//! let damage = txn.commit();
//! assert_eq!(damage.added.len(), 1);
//! # Ok::<(), arbor_index::IndexError>(())
//! ```
//!
//! ## Choosing backends
//!
//! [`EdgeIndex`] uses an [`RTree`] planar backend and a [`SortedSpans`] interval backend.
//! [`EdgeIndexGeneric`] takes any pair:
//!
//! - [`FlatScan`] / [`FlatSpans`]: linear scans. Tiny sets and testing.
//! - [`UniformGrid`]: hashed cells with origin offsets. Good when edges are short
//!   relative to the cell size; see [`EdgeIndex::with_uniform_grid`].
//! - [`RTree`]: SAH-like splits, STR bulk loading. Good general-purpose default.
//! - [`SortedSpans`]: ordered by lower bound within power-of-two length classes. A few
//!   very long spans only widen the scan of their own class.
//!
//! ### Float semantics
//!
//! Edge coordinates must be finite; [`IndexError::InvalidGeometry`] is returned otherwise.
//! Query bounds may be infinite but not NaN.

pub mod config;
pub mod damage;
pub mod edge;
pub mod error;
pub mod index;
pub mod interval;
pub mod planar;
pub mod query;
pub mod range;
pub mod store;
pub mod txn;
pub mod types;

pub use config::IndexConfig;
pub use damage::Damage;
pub use edge::{EdgeKind, EdgeKinds, EdgeRecord, EntityId, EntryId};
pub use error::{IndexError, Result};
pub use index::{EdgeIndex, EdgeIndexGeneric};
pub use interval::{FlatSpans, IntervalBackend, SortedSpans};
pub use planar::{FlatScan, PlanarBackend, RTree, UniformGrid};
pub use query::{EdgeHits, QueryOutcome};
pub use range::AxisRange;
pub use store::{EdgeRow, EdgeStore};
pub use txn::Transaction;
pub use types::{Aabb2D, Aabb3D, Axis, Point3};
