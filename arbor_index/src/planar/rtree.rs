// Copyright 2025 the Arbor Index Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend with SAH-like splits and STR-packed bulk loading.

use std::collections::HashMap;
use std::fmt::Debug;

use super::PlanarBackend;
use crate::edge::EntryId;
use crate::types::Aabb2D;

/// R-tree over planar rectangles.
///
/// Nodes live in an arena. Removal leaves dead nodes behind; once the arena is
/// mostly dead the tree is repacked from its live entries.
pub struct RTree {
    max_children: usize,
    min_children: usize,
    root: Option<NodeIdx>,
    arena: Vec<RNode>,
    slots: HashMap<EntryId, Aabb2D>,
}

#[derive(Clone, Debug)]
struct RNode {
    bbox: Aabb2D,
    leaf: bool,
    children: Vec<RChild>,
}

#[derive(Copy, Clone, Debug)]
enum RChild {
    Node(NodeIdx),
    Item { id: EntryId, bbox: Aabb2D },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

impl Default for RTree {
    fn default() -> Self {
        Self::with_fanout(8)
    }
}

impl RTree {
    /// Create an empty tree with the default fanout of 8.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree whose nodes hold at most `max_children` children.
    ///
    /// # Panics
    ///
    /// Panics if `max_children < 4`.
    pub fn with_fanout(max_children: usize) -> Self {
        assert!(max_children >= 4, "R-tree fanout must be at least 4");
        Self {
            max_children,
            min_children: max_children / 2,
            root: None,
            arena: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Build a packed tree from `(id, rect)` pairs. Later duplicates of an id win.
    pub fn bulk_build(items: &[(EntryId, Aabb2D)]) -> Self {
        let mut tree = Self::default();
        tree.bulk_load(items);
        tree
    }

    fn child_bbox(arena: &[RNode], c: &RChild) -> Aabb2D {
        match c {
            RChild::Node(i) => arena[i.get()].bbox,
            RChild::Item { bbox, .. } => *bbox,
        }
    }

    fn node_bbox(arena: &[RNode], children: &[RChild]) -> Aabb2D {
        let mut it = children.iter();
        let first = match it.next() {
            Some(c) => Self::child_bbox(arena, c),
            None => Aabb2D::from_point(0.0, 0.0),
        };
        it.fold(first, |acc, c| acc.union(&Self::child_bbox(arena, c)))
    }

    fn cost(b: &Aabb2D) -> f64 {
        b.area() + b.margin()
    }

    fn enlarge_cost(a: &Aabb2D, b: &Aabb2D) -> f64 {
        Self::cost(&a.union(b)) - Self::cost(a)
    }

    fn choose_child(arena: &[RNode], children: &[RChild], bbox: &Aabb2D) -> usize {
        let mut best_idx = 0_usize;
        let mut best_cost = f64::INFINITY;
        for (i, c) in children.iter().enumerate() {
            let cost = Self::enlarge_cost(&Self::child_bbox(arena, c), bbox);
            if cost < best_cost {
                best_cost = cost;
                best_idx = i;
            }
        }
        best_idx
    }

    /// SAH-like split: sort along each axis by centroid, precompute prefix/suffix
    /// boxes, and keep the `k` with the lowest cost.
    fn split_children<F>(
        children: Vec<RChild>,
        min_children: usize,
        bbox_of: F,
    ) -> (Vec<RChild>, Vec<RChild>)
    where
        F: Fn(&RChild) -> Aabb2D,
    {
        let n = children.len();
        let mut best: Option<(f64, Vec<RChild>, Vec<RChild>)> = None;
        for axis in 0..2 {
            let mut v = children.clone();
            v.sort_by(|a, b| {
                let (ba, bb) = (bbox_of(a), bbox_of(b));
                if axis == 0 {
                    ba.center_u().total_cmp(&bb.center_u())
                } else {
                    ba.center_v().total_cmp(&bb.center_v())
                }
            });

            let mut prefix: Vec<Aabb2D> = Vec::with_capacity(n);
            for c in &v {
                let bb = bbox_of(c);
                let next = prefix.last().map_or(bb, |prev| prev.union(&bb));
                prefix.push(next);
            }
            let mut suffix: Vec<Aabb2D> = Vec::with_capacity(n);
            for c in v.iter().rev() {
                let bb = bbox_of(c);
                let next = suffix.last().map_or(bb, |prev| bb.union(prev));
                suffix.push(next);
            }
            suffix.reverse();

            for k in min_children..=(n - min_children) {
                let c = Self::cost(&prefix[k - 1]) * k as f64
                    + Self::cost(&suffix[k]) * (n - k) as f64;
                if best.as_ref().is_none_or(|(bc, _, _)| c < *bc) {
                    best = Some((c, v[..k].to_vec(), v[k..].to_vec()));
                }
            }
        }
        match best {
            Some((_, l, r)) => (l, r),
            None => {
                let mut l = children;
                let r = l.split_off(n / 2);
                (l, r)
            }
        }
    }

    /// Insert below `node_idx`. Returns the index of a new right sibling if the node split.
    fn insert_node(
        arena: &mut Vec<RNode>,
        node_idx: usize,
        id: EntryId,
        bbox: Aabb2D,
        max_children: usize,
        min_children: usize,
    ) -> Option<usize> {
        if arena[node_idx].leaf {
            let node = &mut arena[node_idx];
            node.bbox = if node.children.is_empty() {
                bbox
            } else {
                node.bbox.union(&bbox)
            };
            node.children.push(RChild::Item { id, bbox });
            if node.children.len() <= max_children {
                return None;
            }
        } else {
            let idx = Self::choose_child(arena, &arena[node_idx].children, &bbox);
            let split = match arena[node_idx].children[idx] {
                RChild::Node(child) => {
                    Self::insert_node(arena, child.get(), id, bbox, max_children, min_children)
                }
                RChild::Item { .. } => None,
            };
            let grown = arena[node_idx].bbox.union(&bbox);
            arena[node_idx].bbox = grown;
            let right = split?;
            arena[node_idx]
                .children
                .insert(idx + 1, RChild::Node(NodeIdx(right)));
            if arena[node_idx].children.len() <= max_children {
                return None;
            }
        }

        // Overflow: split this node in two and hand the right half to the parent.
        let leaf = arena[node_idx].leaf;
        let children = core::mem::take(&mut arena[node_idx].children);
        let (left, right) =
            Self::split_children(children, min_children, |c| Self::child_bbox(arena, c));
        let l_bbox = Self::node_bbox(arena, &left);
        let r_bbox = Self::node_bbox(arena, &right);
        arena[node_idx].children = left;
        arena[node_idx].bbox = l_bbox;
        let r_idx = arena.len();
        arena.push(RNode {
            bbox: r_bbox,
            leaf,
            children: right,
        });
        Some(r_idx)
    }

    fn search_remove(arena: &mut Vec<RNode>, node_idx: usize, id: EntryId, old: &Aabb2D) -> bool {
        if arena[node_idx].children.is_empty() || !arena[node_idx].bbox.intersects(old) {
            return false;
        }
        if arena[node_idx].leaf {
            let before = arena[node_idx].children.len();
            arena[node_idx]
                .children
                .retain(|c| !matches!(c, RChild::Item { id: s, .. } if *s == id));
            if arena[node_idx].children.len() == before {
                return false;
            }
        } else {
            let child_indices: Vec<NodeIdx> = arena[node_idx]
                .children
                .iter()
                .filter_map(|c| match c {
                    RChild::Node(i) => Some(*i),
                    RChild::Item { .. } => None,
                })
                .collect();
            // Each id lives in exactly one leaf.
            if !child_indices
                .into_iter()
                .any(|ci| Self::search_remove(arena, ci.get(), id, old))
            {
                return false;
            }
            let new_children = {
                let old_children = core::mem::take(&mut arena[node_idx].children);
                old_children
                    .into_iter()
                    .filter(|c| match c {
                        RChild::Node(i) => !arena[i.get()].children.is_empty(),
                        RChild::Item { .. } => true,
                    })
                    .collect::<Vec<_>>()
            };
            arena[node_idx].children = new_children;
        }
        if !arena[node_idx].children.is_empty() {
            let bb = Self::node_bbox(arena, &arena[node_idx].children);
            arena[node_idx].bbox = bb;
        }
        true
    }

    /// STR-like bulk builder: packs leaves by centroid slices, then promotes levels.
    fn bulk_build_nodes(
        arena: &mut Vec<RNode>,
        items: &mut [(EntryId, Aabb2D)],
        max_children: usize,
    ) -> Option<NodeIdx> {
        if items.is_empty() {
            return None;
        }

        let n = items.len();
        let num_leaves = n.div_ceil(max_children);
        let mut gx = 1_usize;
        while gx * gx < num_leaves {
            gx += 1;
        }
        items.sort_by(|a, b| a.1.center_u().total_cmp(&b.1.center_u()));
        let mut level: Vec<usize> = Vec::new();
        for slice in items.chunks_mut(n.div_ceil(gx)) {
            slice.sort_by(|a, b| a.1.center_v().total_cmp(&b.1.center_v()));
            for chunk in slice.chunks(max_children) {
                let children: Vec<RChild> = chunk
                    .iter()
                    .map(|&(id, bbox)| RChild::Item { id, bbox })
                    .collect();
                let bbox = Self::node_bbox(arena, &children);
                level.push(arena.len());
                arena.push(RNode {
                    bbox,
                    leaf: true,
                    children,
                });
            }
        }

        while level.len() > 1 {
            let n_nodes = level.len();
            let num_parents = n_nodes.div_ceil(max_children);
            let mut gx = 1_usize;
            while gx * gx < num_parents {
                gx += 1;
            }
            level.sort_by(|&a, &b| arena[a].bbox.center_u().total_cmp(&arena[b].bbox.center_u()));
            let mut next: Vec<usize> = Vec::new();
            for slice in level.chunks_mut(n_nodes.div_ceil(gx)) {
                slice.sort_by(|&a, &b| {
                    arena[a].bbox.center_v().total_cmp(&arena[b].bbox.center_v())
                });
                for chunk in slice.chunks(max_children) {
                    let children: Vec<RChild> =
                        chunk.iter().map(|&i| RChild::Node(NodeIdx(i))).collect();
                    let bbox = Self::node_bbox(arena, &children);
                    next.push(arena.len());
                    arena.push(RNode {
                        bbox,
                        leaf: false,
                        children,
                    });
                }
            }
            level = next;
        }
        level.first().map(|&i| NodeIdx(i))
    }

    /// Drop empty roots and single-child internal roots.
    fn condense_root(&mut self) {
        while let Some(root) = self.root {
            let node = &self.arena[root.get()];
            match node.children.as_slice() {
                [] => self.root = None,
                [RChild::Node(only)] if !node.leaf => self.root = Some(*only),
                _ => break,
            }
        }
    }

    fn repack_if_sparse(&mut self) {
        let live_estimate = 2 * (self.slots.len() / self.min_children + 1);
        if self.arena.len() > 64 && self.arena.len() > 4 * live_estimate {
            let items: Vec<_> = self.slots.iter().map(|(id, b)| (*id, *b)).collect();
            self.bulk_load(&items);
        }
    }
}

impl PlanarBackend for RTree {
    fn insert(&mut self, id: EntryId, rect: Aabb2D) {
        if self.slots.contains_key(&id) {
            self.remove(id);
        }
        self.slots.insert(id, rect);
        let Some(root) = self.root else {
            self.root = Some(NodeIdx(self.arena.len()));
            self.arena.push(RNode {
                bbox: rect,
                leaf: true,
                children: vec![RChild::Item { id, bbox: rect }],
            });
            return;
        };
        let split = Self::insert_node(
            &mut self.arena,
            root.get(),
            id,
            rect,
            self.max_children,
            self.min_children,
        );
        if let Some(right) = split {
            let bbox = self.arena[root.get()].bbox.union(&self.arena[right].bbox);
            self.root = Some(NodeIdx(self.arena.len()));
            self.arena.push(RNode {
                bbox,
                leaf: false,
                children: vec![RChild::Node(root), RChild::Node(NodeIdx(right))],
            });
        }
    }

    fn update(&mut self, id: EntryId, rect: Aabb2D) {
        self.insert(id, rect);
    }

    fn remove(&mut self, id: EntryId) {
        let Some(old) = self.slots.remove(&id) else {
            return;
        };
        if let Some(root) = self.root {
            let _ = Self::search_remove(&mut self.arena, root.get(), id, &old);
        }
        self.condense_root();
        self.repack_if_sparse();
    }

    fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.slots.clear();
    }

    fn get(&self, id: EntryId) -> Option<Aabb2D> {
        self.slots.get(&id).copied()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D) -> Box<dyn Iterator<Item = EntryId> + 'a> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return Box::new(out.into_iter());
        };
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.bbox.intersects(&rect) {
                continue;
            }
            for c in &n.children {
                match c {
                    RChild::Node(ci) => stack.push(*ci),
                    RChild::Item { id, bbox } if bbox.intersects(&rect) => out.push(*id),
                    RChild::Item { .. } => {}
                }
            }
        }
        Box::new(out.into_iter())
    }

    fn bulk_load(&mut self, items: &[(EntryId, Aabb2D)]) {
        self.clear();
        for &(id, rect) in items {
            self.slots.insert(id, rect);
        }
        let mut unique: Vec<(EntryId, Aabb2D)> =
            self.slots.iter().map(|(id, b)| (*id, *b)).collect();
        self.root = Self::bulk_build_nodes(&mut self.arena, &mut unique, self.max_children);
    }
}

impl Debug for RTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RTree")
            .field("max_children", &self.max_children)
            .field("min_children", &self.min_children)
            .field("arena_nodes", &self.arena.len())
            .field("alive", &self.slots.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
