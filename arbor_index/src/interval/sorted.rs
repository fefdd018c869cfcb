// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interval backend ordered by lower bound, bucketed by span length.
//!
//! A span `[lo, hi]` overlaps a query `[a, b]` iff `lo <= b` and `hi >= a`. Spans
//! are grouped into power-of-two length classes. Within a class `hi <= lo + max_len`,
//! so every overlapping span of that class has `lo` in `[a - max_len, b]`. A query is
//! one ordered range scan per non-empty class followed by a filter on `hi`. A single
//! long span only widens the window of its own class.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, btree_map};
use std::fmt::Debug;
use std::ops::Bound;

use super::IntervalBackend;
use crate::edge::EntryId;
use crate::range::AxisRange;

/// Totally ordered coordinate key. `-0.0` is folded into `0.0`.
#[derive(Copy, Clone, Debug)]
struct Coord(f64);

impl Coord {
    fn new(v: f64) -> Self {
        Self(v + 0.0)
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// `floor(log2(len))`; zero-length spans share the lowest class and unbounded
/// ones the highest.
#[allow(
    clippy::cast_possible_truncation,
    reason = "log2 of a positive finite f64 lies well inside i32."
)]
fn length_class(len: f64) -> i32 {
    if len.is_nan() || len <= 0.0 {
        i32::MIN
    } else if len.is_infinite() {
        i32::MAX
    } else {
        len.log2().floor() as i32
    }
}

/// Spans of one length class.
#[derive(Default)]
struct LengthClass {
    by_lo: BTreeMap<(Coord, EntryId), f64>,
    lengths: BTreeMap<Coord, usize>,
}

impl LengthClass {
    fn max_len(&self) -> f64 {
        self.lengths.last_key_value().map_or(0.0, |(len, _)| len.0)
    }

    fn is_empty(&self) -> bool {
        self.by_lo.is_empty()
    }

    fn insert(&mut self, id: EntryId, range: &AxisRange) {
        self.by_lo.insert((Coord::new(range.lo), id), range.hi);
        *self.lengths.entry(Coord::new(range.length())).or_insert(0) += 1;
    }

    fn remove(&mut self, id: EntryId, range: &AxisRange) {
        self.by_lo.remove(&(Coord::new(range.lo), id));
        let key = Coord::new(range.length());
        if let Some(count) = self.lengths.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.lengths.remove(&key);
            }
        }
    }

    /// Entries whose `lo` can belong to a span overlapping `query`.
    fn window(&self, query: AxisRange) -> btree_map::Range<'_, (Coord, EntryId), f64> {
        let max = self.max_len();
        // Widened so rounding in `hi - lo` never hides a span; the caller's filter is exact.
        let mut start = query.lo - max - (query.lo.abs() + max) * 1e-12;
        if start.is_nan() {
            start = f64::NEG_INFINITY;
        }
        let lower = Bound::Included((Coord::new(start), EntryId(u64::MIN)));
        let upper = Bound::Included((Coord::new(query.hi), EntryId(u64::MAX)));
        self.by_lo.range((lower, upper))
    }
}

/// Ordered interval backend.
#[derive(Default)]
pub struct SortedSpans {
    classes: BTreeMap<i32, LengthClass>,
    spans: HashMap<EntryId, AxisRange>,
}

impl SortedSpans {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Longest stored span, or zero when empty.
    pub fn max_span(&self) -> f64 {
        self.classes
            .last_key_value()
            .map_or(0.0, |(_, class)| class.max_len())
    }

    #[cfg(test)]
    fn scanned(&self, query: AxisRange) -> usize {
        self.classes.values().map(|c| c.window(query).count()).sum()
    }
}

impl Debug for SortedSpans {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedSpans")
            .field("alive", &self.spans.len())
            .field("classes", &self.classes.len())
            .field("max_span", &self.max_span())
            .finish_non_exhaustive()
    }
}

impl IntervalBackend for SortedSpans {
    fn insert(&mut self, id: EntryId, range: AxisRange) {
        self.remove(id);
        self.classes
            .entry(length_class(range.length()))
            .or_default()
            .insert(id, &range);
        self.spans.insert(id, range);
    }

    fn update(&mut self, id: EntryId, range: AxisRange) {
        self.insert(id, range);
    }

    fn remove(&mut self, id: EntryId) {
        let Some(old) = self.spans.remove(&id) else {
            return;
        };
        let key = length_class(old.length());
        if let Some(class) = self.classes.get_mut(&key) {
            class.remove(id, &old);
            if class.is_empty() {
                self.classes.remove(&key);
            }
        }
    }

    fn clear(&mut self) {
        self.classes.clear();
        self.spans.clear();
    }

    fn get(&self, id: EntryId) -> Option<AxisRange> {
        self.spans.get(&id).copied()
    }

    fn len(&self) -> usize {
        self.spans.len()
    }

    fn query_overlapping<'a>(
        &'a self,
        query: AxisRange,
    ) -> Box<dyn Iterator<Item = EntryId> + 'a> {
        if query.is_empty() || self.spans.is_empty() {
            return Box::new(core::iter::empty());
        }
        Box::new(self.classes.values().flat_map(move |class| {
            class
                .window(query)
                .filter(move |((lo, _), hi)| query.lo <= **hi && lo.0 <= **hi)
                .map(|((_, id), _)| *id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::FlatSpans;
    use crate::interval::tests::exercise_backend;
    use std::collections::BTreeSet;

    #[test]
    fn sorted_spans_contract() {
        exercise_backend(SortedSpans::new());
    }

    #[test]
    fn max_span_tracks_removals() {
        let mut b = SortedSpans::new();
        b.insert(EntryId(1), AxisRange::new(0.0, 50.0));
        b.insert(EntryId(2), AxisRange::new(0.0, 2.0));
        b.insert(EntryId(3), AxisRange::new(10.0, 12.0));
        assert_eq!(b.max_span(), 50.0);
        b.remove(EntryId(1));
        assert_eq!(b.max_span(), 2.0);
        b.remove(EntryId(2));
        assert_eq!(b.max_span(), 2.0);
        b.remove(EntryId(3));
        assert_eq!(b.max_span(), 0.0);
        assert!(b.classes.is_empty());
    }

    #[test]
    fn length_classes_are_powers_of_two() {
        assert_eq!(length_class(0.0), i32::MIN);
        assert_eq!(length_class(1.0), 0);
        assert_eq!(length_class(40.0), 5);
        assert_eq!(length_class(100.0), 6);
        assert_eq!(length_class(0.3), -2);
        assert_eq!(length_class(f64::INFINITY), i32::MAX);
    }

    #[test]
    fn one_long_span_does_not_widen_other_queries() {
        let mut sorted = SortedSpans::new();
        let mut flat = FlatSpans::new();
        for i in 0..20_000_u32 {
            let lo = f64::from(i) * 40.0;
            let r = AxisRange::new(lo, lo + 40.0);
            sorted.insert(EntryId(u64::from(i)), r);
            flat.insert(EntryId(u64::from(i)), r);
        }
        let trunk = AxisRange::new(0.0, 800_000.0);
        sorted.insert(EntryId(1_000_000), trunk);
        flat.insert(EntryId(1_000_000), trunk);
        assert_eq!(sorted.max_span(), 800_000.0);

        let q = AxisRange::new(799_000.0, 799_040.0);
        let a: BTreeSet<_> = sorted.query_overlapping(q).collect();
        let b: BTreeSet<_> = flat.query_overlapping(q).collect();
        assert_eq!(a, b);
        assert_eq!(
            a,
            BTreeSet::from([
                EntryId(19_974),
                EntryId(19_975),
                EntryId(19_976),
                EntryId(1_000_000)
            ])
        );
        assert!(sorted.scanned(q) < 16, "scanned {}", sorted.scanned(q));

        sorted.remove(EntryId(1_000_000));
        assert_eq!(sorted.max_span(), 40.0);
        assert_eq!(sorted.classes.len(), 1);
    }

    #[test]
    fn matches_flat_scan_on_section_data() {
        let mut sorted = SortedSpans::new();
        let mut flat = FlatSpans::new();
        for i in 0..400_u64 {
            // Sections 40 units apart; most edges stay in a section or cross one.
            let z0 = ((i * 7) % 50) as f64 * 40.0;
            let z1 = z0 + ((i % 3) as f64) * 40.0;
            let r = AxisRange::from_endpoints(z1, z0);
            sorted.insert(EntryId(i), r);
            flat.insert(EntryId(i), r);
        }
        for i in (0..400_u64).step_by(3) {
            sorted.remove(EntryId(i));
            flat.remove(EntryId(i));
        }
        for q in [
            AxisRange::point(400.0),
            AxisRange::new(390.0, 410.0),
            AxisRange::new(-5.0, 0.0),
            AxisRange::new(1999.0, 2100.0),
            AxisRange::new(f64::NEG_INFINITY, 100.0),
        ] {
            let a: BTreeSet<_> = sorted.query_overlapping(q).collect();
            let b: BTreeSet<_> = flat.query_overlapping(q).collect();
            assert_eq!(a, b, "query {q}");
        }
    }
}
