// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every fallible index operation.

use thiserror::Error;

use crate::edge::EntryId;
use crate::types::Axis;

/// Errors reported by the edge index.
///
/// None of these are fatal: each is recoverable at the boundary of the
/// operation that produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    /// A query box is inverted (or has a NaN bound) on some axis.
    #[error("invalid query: min {min} is not <= max {max} on the {axis} axis")]
    InvalidQuery {
        /// Offending axis.
        axis: Axis,
        /// Minimum bound given for that axis.
        min: f64,
        /// Maximum bound given for that axis.
        max: f64,
    },
    /// An edge endpoint has a non-finite coordinate.
    #[error("invalid geometry: {axis} coordinate {value} is not finite")]
    InvalidGeometry {
        /// Offending axis.
        axis: Axis,
        /// The rejected coordinate.
        value: f64,
    },
    /// The entry id does not name a live edge.
    #[error("edge entry {0} does not exist")]
    EntryNotFound(EntryId),
    /// The record store and the sub-indexes disagree about an entry.
    #[error("edge entry {0} is inconsistent between the record store and its sub-indexes")]
    InconsistentEntry(EntryId),
}

/// Result alias used throughout the crate.
pub type Result<T, E = IndexError> = core::result::Result<T, E>;
