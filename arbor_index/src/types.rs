// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::range::AxisRange;

/// Coordinate axis of the world frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z (section) axis.
    #[default]
    Z,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// The two axes spanning the plane orthogonal to `self`, as `(u, v)`.
    ///
    /// The order is fixed: the lower-numbered axis becomes `u`.
    pub const fn plane(self) -> (Self, Self) {
        match self {
            Self::X => (Self::Y, Self::Z),
            Self::Y => (Self::X, Self::Z),
            Self::Z => (Self::X, Self::Y),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

/// A point in world coordinates (physical units, no conversion applied).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The coordinate along `axis`.
    pub const fn get(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Whether all three coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// The first axis holding a non-finite coordinate, with that coordinate.
    pub(crate) fn first_non_finite(self) -> Option<(Axis, f64)> {
        Axis::ALL
            .into_iter()
            .map(|axis| (axis, self.get(axis)))
            .find(|(_, v)| !v.is_finite())
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Axis-aligned rectangle in the slicing plane.
///
/// `u` and `v` are the two axes returned by [`Axis::plane`] for the index's
/// slicing axis. Zero-width and zero-height rectangles are valid.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb2D {
    /// Minimum u.
    pub min_u: f64,
    /// Minimum v.
    pub min_v: f64,
    /// Maximum u.
    pub max_u: f64,
    /// Maximum v.
    pub max_v: f64,
}

impl Aabb2D {
    /// Create a new rectangle from min/max corners.
    pub const fn new(min_u: f64, min_v: f64, max_u: f64, max_v: f64) -> Self {
        Self {
            min_u,
            min_v,
            max_u,
            max_v,
        }
    }

    /// A zero-sized rectangle at a single point.
    pub const fn from_point(u: f64, v: f64) -> Self {
        Self::new(u, v, u, v)
    }

    /// Whether this rectangle contains the point (boundary included).
    pub fn contains_point(&self, u: f64, v: f64) -> bool {
        le(self.min_u, u) && le(self.min_v, v) && le(u, self.max_u) && le(v, self.max_v)
    }

    /// The intersection of two rectangles. May be empty, see [`Self::is_empty`].
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_u: max_t(self.min_u, other.min_u),
            min_v: max_t(self.min_v, other.min_v),
            max_u: min_t(self.max_u, other.max_u),
            max_v: min_t(self.max_v, other.max_v),
        }
    }

    /// Closed-interval intersection test: shared edges and corners count.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Return true if the rectangle is inverted. Degenerate rectangles are not empty.
    pub fn is_empty(&self) -> bool {
        lt(self.max_u, self.min_u) || lt(self.max_v, self.min_v)
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_u: min_t(self.min_u, other.min_u),
            min_v: min_t(self.min_v, other.min_v),
            max_u: max_t(self.max_u, other.max_u),
            max_v: max_t(self.max_v, other.max_v),
        }
    }

    /// Area, clamped to zero for degenerate rectangles.
    pub fn area(&self) -> f64 {
        (self.max_u - self.min_u).max(0.0) * (self.max_v - self.min_v).max(0.0)
    }

    /// Half perimeter; keeps SAH costs meaningful for zero-area (line-like) boxes.
    pub(crate) fn margin(&self) -> f64 {
        (self.max_u - self.min_u).max(0.0) + (self.max_v - self.min_v).max(0.0)
    }

    pub(crate) fn center_u(&self) -> f64 {
        0.5 * (self.min_u + self.max_u)
    }

    pub(crate) fn center_v(&self) -> f64 {
        0.5 * (self.min_v + self.max_v)
    }
}

/// Axis-aligned box in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb3D {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3D {
    /// Create a box from its corners. No ordering is enforced here.
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Bounding box of the segment `p0`–`p1`.
    pub fn from_segment(p0: Point3, p1: Point3) -> Self {
        Self {
            min: Point3::new(min_t(p0.x, p1.x), min_t(p0.y, p1.y), min_t(p0.z, p1.z)),
            max: Point3::new(max_t(p0.x, p1.x), max_t(p0.y, p1.y), max_t(p0.z, p1.z)),
        }
    }

    /// The bounds of this box along `axis`.
    pub fn range(&self, axis: Axis) -> AxisRange {
        AxisRange::new(self.min.get(axis), self.max.get(axis))
    }

    /// Closed-interval intersection test over all three axes.
    pub fn intersects(&self, other: &Self) -> bool {
        Axis::ALL
            .into_iter()
            .all(|axis| self.range(axis).overlaps(&other.range(axis)))
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                min_t(self.min.x, other.min.x),
                min_t(self.min.y, other.min.y),
                min_t(self.min.z, other.min.z),
            ),
            max: Point3::new(
                max_t(self.max.x, other.max.x),
                max_t(self.max.y, other.max.y),
                max_t(self.max.z, other.max.z),
            ),
        }
    }

    /// Split into the planar rectangle and the range along `slicing`.
    pub fn project(&self, slicing: Axis) -> (Aabb2D, AxisRange) {
        let (u, v) = slicing.plane();
        let rect = Aabb2D::new(
            self.min.get(u),
            self.min.get(v),
            self.max.get(u),
            self.max.get(v),
        );
        (rect, self.range(slicing))
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}
