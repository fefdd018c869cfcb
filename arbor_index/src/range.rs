// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed intervals along a single axis.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{le, max_t, min_t};

/// Closed interval `[lo, hi]` along one axis; both ends are inclusive.
///
/// Ranges built with [`AxisRange::from_endpoints`] always satisfy `lo <= hi`.
/// [`AxisRange::new`] takes the bounds as given, and an inverted range is
/// [empty](AxisRange::is_empty).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound (inclusive).
    pub lo: f64,
    /// Upper bound (inclusive).
    pub hi: f64,
}

impl AxisRange {
    /// Create a range from explicit bounds.
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Create a zero-length range at `v`.
    pub const fn point(v: f64) -> Self {
        Self::new(v, v)
    }

    /// The range spanned by two endpoint coordinates, in either order.
    pub fn from_endpoints(a: f64, b: f64) -> Self {
        Self::new(min_t(a, b), max_t(a, b))
    }

    /// Closed-interval overlap: `self.lo <= other.hi && other.lo <= self.hi`.
    ///
    /// Ranges that merely touch at an endpoint overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && le(self.lo, other.hi) && le(other.lo, self.hi)
    }

    /// Whether `lo <= v <= hi`.
    pub fn contains_point(&self, v: f64) -> bool {
        le(self.lo, v) && le(v, self.hi)
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &Self) -> bool {
        !other.is_empty() && le(self.lo, other.lo) && le(other.hi, self.hi)
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(min_t(self.lo, other.lo), max_t(self.hi, other.hi))
    }

    /// `hi - lo`, zero for degenerate or empty ranges.
    pub fn length(&self) -> f64 {
        (self.hi - self.lo).max(0.0)
    }

    /// Whether `lo == hi`.
    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }

    /// Whether the range is inverted or has a NaN bound.
    pub fn is_empty(&self) -> bool {
        !le(self.lo, self.hi)
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// Convenience free function form of [`AxisRange::overlaps`].
pub fn overlaps(a: &AxisRange, b: &AxisRange) -> bool {
    a.overlaps(b)
}

/// Convenience free function form of [`AxisRange::contains_point`].
pub fn contains_point(a: &AxisRange, v: f64) -> bool {
    a.contains_point(v)
}

/// Convenience free function form of [`AxisRange::from_endpoints`].
pub fn from_endpoints(z0: f64, z1: f64) -> AxisRange {
    AxisRange::from_endpoints(z0, z1)
}
