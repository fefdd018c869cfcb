// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched damage returned by [`Transaction::commit`](crate::Transaction::commit).

use crate::types::Aabb3D;

/// World-space boxes touched by one committed transaction.
///
/// Clients use this to invalidate cached views without re-querying everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Bounds of edges inserted by the transaction.
    pub added: Vec<Aabb3D>,
    /// Bounds of edges deleted by the transaction.
    pub removed: Vec<Aabb3D>,
    /// Edges whose bounds changed: (old, new).
    pub moved: Vec<(Aabb3D, Aabb3D)>,
}

impl Damage {
    /// True if no damage entries recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Union of all boxes affected. Returns `None` if empty.
    pub fn union(&self) -> Option<Aabb3D> {
        let mut it = self
            .added
            .iter()
            .copied()
            .chain(self.removed.iter().copied())
            .chain(self.moved.iter().flat_map(|(a, b)| [*a, *b]));
        let first = it.next()?;
        Some(it.fold(first, |acc, b| acc.union(&b)))
    }
}
