// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge records and their identities.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::range::AxisRange;
use crate::types::{Aabb2D, Aabb3D, Axis, Point3};

/// Identity of the entity owning an edge: a skeleton segment, a
/// connector link, or a standalone connector geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one indexed edge. Ties the record and both sub-index entries together.
///
/// Ids are handed out by the index in increasing order and never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three edge families stored by the annotation platform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Skeleton node to parent skeleton node.
    Treenode,
    /// Skeleton node to connector.
    TreenodeConnector,
    /// Standalone connector geometry.
    ConnectorGeometry,
}

impl EdgeKind {
    /// The single-kind filter matching this kind.
    pub const fn as_filter(self) -> EdgeKinds {
        match self {
            Self::Treenode => EdgeKinds::TREENODE,
            Self::TreenodeConnector => EdgeKinds::TREENODE_CONNECTOR,
            Self::ConnectorGeometry => EdgeKinds::CONNECTOR_GEOMETRY,
        }
    }
}

bitflags::bitflags! {
    /// Set of edge kinds used to filter queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EdgeKinds: u8 {
        /// Skeleton edges.
        const TREENODE           = 0b0000_0001;
        /// Skeleton-to-connector links.
        const TREENODE_CONNECTOR = 0b0000_0010;
        /// Standalone connector geometry.
        const CONNECTOR_GEOMETRY = 0b0000_0100;
    }
}

impl Default for EdgeKinds {
    fn default() -> Self {
        Self::all()
    }
}

impl EdgeKinds {
    /// Whether `kind` is part of this set.
    pub const fn admits(self, kind: EdgeKind) -> bool {
        self.contains(kind.as_filter())
    }
}

/// Canonical data for one edge.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Owner of the edge.
    pub entity_id: EntityId,
    /// Edge family.
    pub kind: EdgeKind,
    /// First endpoint.
    pub p0: Point3,
    /// Second endpoint.
    pub p1: Point3,
}

impl EdgeRecord {
    /// Create a record, rejecting non-finite endpoints.
    ///
    /// `p0 == p1` is allowed and yields a point edge.
    pub fn new(entity_id: EntityId, kind: EdgeKind, p0: Point3, p1: Point3) -> Result<Self> {
        validate_endpoints(p0, p1)?;
        Ok(Self {
            entity_id,
            kind,
            p0,
            p1,
        })
    }

    /// Copy of this record with new endpoints, validated.
    pub fn with_geometry(&self, p0: Point3, p1: Point3) -> Result<Self> {
        Self::new(self.entity_id, self.kind, p0, p1)
    }

    /// True 3D bounding box of the segment.
    pub fn bounds(&self) -> Aabb3D {
        Aabb3D::from_segment(self.p0, self.p1)
    }

    /// Span along the slicing axis.
    pub fn axis_range(&self, slicing: Axis) -> AxisRange {
        AxisRange::from_endpoints(self.p0.get(slicing), self.p1.get(slicing))
    }

    /// Bounding rectangle of the projection onto the slicing plane.
    pub fn planar_box(&self, slicing: Axis) -> Aabb2D {
        self.bounds().project(slicing).0
    }

    /// Whether both endpoints coincide.
    pub fn is_point(&self) -> bool {
        self.p0 == self.p1
    }
}

pub(crate) fn validate_endpoints(p0: Point3, p1: Point3) -> Result<()> {
    match p0.first_non_finite().or_else(|| p1.first_non_finite()) {
        Some((axis, value)) => Err(IndexError::InvalidGeometry { axis, value }),
        None => Ok(()),
    }
}
