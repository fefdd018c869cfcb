// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index configuration.

use serde::{Deserialize, Serialize};

use crate::types::Axis;

/// Behavioral settings for an [`EdgeIndexGeneric`](crate::EdgeIndexGeneric).
///
/// Backends are chosen by type; this only covers what the composite layer does.
/// Missing fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Axis handled by the interval index. The other two form the planar index.
    pub slicing_axis: Axis,
    /// Check candidates reported by only one sub-index against the record store.
    pub verify_candidates: bool,
    /// Compare stored planar boxes and axis ranges with values re-derived from records.
    pub verify_derived: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            slicing_axis: Axis::Z,
            verify_candidates: true,
            verify_derived: true,
        }
    }
}

impl IndexConfig {
    /// Default configuration slicing along `axis`.
    pub fn sliced_along(axis: Axis) -> Self {
        Self {
            slicing_axis: axis,
            ..Self::default()
        }
    }

    /// Disable both verification passes; queries then trust the sub-indexes.
    pub fn unverified(mut self) -> Self {
        self.verify_candidates = false;
        self.verify_derived = false;
        self
    }
}
