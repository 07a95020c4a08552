//! Broad phase: an arena-allocated octree of body references.
//!
//! A body is referenced from every leaf its AABB touches, so a body that
//! straddles a split plane appears in several leaves and may be reported
//! more than once by [`SpatialIndex::query`].

use crate::aabb::Aabb;
use crate::config::OctreeConfig;
use impact_common::EntityId;
use std::collections::BTreeMap;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
struct Entry {
    body: EntityId,
    aabb: Aabb,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(Vec<Entry>),
    Internal([NodeId; 8]),
}

#[derive(Debug, Clone)]
struct OctreeNode {
    bounds: Aabb,
    depth: u32,
    kind: NodeKind,
}

/// Shape of the tree, for inspection and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth_reached: u32,
    /// Sum of references over all leaves; exceeds the body count when
    /// bodies straddle leaf boundaries.
    pub placements: usize,
}

/// Octree over body AABBs.
///
/// Node 0 is the root once anything has been inserted. The root bounds are
/// fixed at the first insertion and survive [`SpatialIndex::clear`].
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<OctreeNode>,
    configured_bounds: Aabb,
    root_bounds: Option<Aabb>,
    max_depth: u32,
    leaf_capacity: usize,
    epsilon: f32,
    locations: BTreeMap<EntityId, Vec<NodeId>>,
}

impl SpatialIndex {
    pub fn new(config: &OctreeConfig, epsilon: f32) -> Self {
        Self {
            nodes: Vec::new(),
            configured_bounds: config.bounds(),
            root_bounds: None,
            max_depth: config.max_depth,
            leaf_capacity: config.leaf_capacity,
            epsilon,
            locations: BTreeMap::new(),
        }
    }

    /// Root bounds, once the first insertion has fixed them.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root_bounds
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, body: EntityId) -> bool {
        self.locations.contains_key(&body)
    }

    /// Number of leaves referencing `body`.
    pub fn leaf_count_of(&self, body: EntityId) -> usize {
        self.locations.get(&body).map_or(0, Vec::len)
    }

    /// Drop every node and reference. Root bounds are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.locations.clear();
    }

    /// Clear, then insert every `(body, aabb)` pair.
    pub fn rebuild<I>(&mut self, bodies: I)
    where
        I: IntoIterator<Item = (EntityId, Aabb)>,
    {
        let _span = tracing::info_span!("octree_rebuild").entered();
        self.clear();
        for (body, aabb) in bodies {
            self.insert(body, aabb);
        }
        tracing::trace!(nodes = self.nodes.len(), bodies = self.locations.len(), "octree rebuilt");
    }

    /// Insert `body` into every leaf whose bounds its `aabb` touches.
    ///
    /// Returns false when the AABB lies entirely outside the root bounds, in
    /// which case the body is not indexed.
    pub fn insert(&mut self, body: EntityId, aabb: Aabb) -> bool {
        let root = self.root();
        if !self.nodes[root.0].bounds.intersects(&aabb, self.epsilon) {
            tracing::warn!(body = %body.short(), ?aabb, "body lies outside octree bounds");
            return false;
        }
        self.insert_at(root, Entry { body, aabb });
        true
    }

    /// Broad-phase candidates for `body`.
    ///
    /// Every other reference sharing a leaf with `body` is reported when its
    /// current AABB intersects `body`'s current AABB. `current_aabb` supplies
    /// fresh bounds; references it returns `None` for are skipped. Duplicates
    /// across leaves are kept.
    pub fn query<F>(&self, body: EntityId, current_aabb: F) -> Vec<EntityId>
    where
        F: Fn(EntityId) -> Option<Aabb>,
    {
        let mut out = Vec::new();
        let (Some(leaves), Some(own)) = (self.locations.get(&body), current_aabb(body)) else {
            return out;
        };
        for leaf in leaves {
            let NodeKind::Leaf(entries) = &self.nodes[leaf.0].kind else {
                continue;
            };
            for entry in entries.iter().filter(|e| e.body != body) {
                if let Some(other) = current_aabb(entry.body) {
                    if own.intersects(&other, self.epsilon) {
                        out.push(entry.body);
                    }
                }
            }
        }
        out
    }

    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            nodes: self.nodes.len(),
            ..OctreeStats::default()
        };
        for node in &self.nodes {
            stats.max_depth_reached = stats.max_depth_reached.max(node.depth);
            if let NodeKind::Leaf(entries) = &node.kind {
                stats.leaves += 1;
                stats.placements += entries.len();
            }
        }
        stats
    }

    fn root(&mut self) -> NodeId {
        if self.nodes.is_empty() {
            let bounds = *self.root_bounds.get_or_insert(self.configured_bounds);
            self.nodes.push(OctreeNode {
                bounds,
                depth: 0,
                kind: NodeKind::Leaf(Vec::new()),
            });
        }
        NodeId(0)
    }

    /// Caller guarantees `entry.aabb` touches the node's bounds.
    fn insert_at(&mut self, id: NodeId, entry: Entry) {
        let node = &mut self.nodes[id.0];
        match &mut node.kind {
            NodeKind::Internal(children) => {
                let children = *children;
                for child in children {
                    if self.nodes[child.0].bounds.intersects(&entry.aabb, self.epsilon) {
                        self.insert_at(child, entry);
                    }
                }
            }
            NodeKind::Leaf(entries) => {
                entries.push(entry);
                let should_split = entries.len() > self.leaf_capacity && node.depth < self.max_depth;
                self.locations.entry(entry.body).or_default().push(id);
                if should_split {
                    self.split(id);
                }
            }
        }
    }

    /// Replace a leaf with eight octant children and re-insert its entries.
    fn split(&mut self, id: NodeId) {
        let (bounds, depth, entries) = {
            let node = &mut self.nodes[id.0];
            let entries = match &mut node.kind {
                NodeKind::Leaf(entries) => std::mem::take(entries),
                NodeKind::Internal(_) => return,
            };
            (node.bounds, node.depth, entries)
        };

        let first = self.nodes.len();
        let children: [NodeId; 8] = std::array::from_fn(|i| NodeId(first + i));
        for i in 0..8 {
            self.nodes.push(OctreeNode {
                bounds: bounds.octant(i),
                depth: depth + 1,
                kind: NodeKind::Leaf(Vec::new()),
            });
        }
        self.nodes[id.0].kind = NodeKind::Internal(children);

        for entry in entries {
            if let Some(leaves) = self.locations.get_mut(&entry.body) {
                leaves.retain(|leaf| *leaf != id);
            }
            for child in children {
                if self.nodes[child.0].bounds.intersects(&entry.aabb, self.epsilon) {
                    self.insert_at(child, entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::{BTreeSet, HashMap};

    fn index(max_depth: u32, half_extent: f32) -> SpatialIndex {
        let config = OctreeConfig {
            max_depth,
            half_extent,
            ..OctreeConfig::default()
        };
        SpatialIndex::new(&config, 1e-4)
    }

    fn cube(center: Vec3, half: f32) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(half))
    }

    #[test]
    fn leaf_splits_after_capacity() {
        let mut idx = index(4, 8.0);
        idx.insert(EntityId::new(), cube(Vec3::splat(-4.0), 0.5));
        idx.insert(EntityId::new(), cube(Vec3::splat(4.0), 0.5));
        assert_eq!(idx.stats().nodes, 1);

        idx.insert(EntityId::new(), cube(Vec3::new(4.0, -4.0, 4.0), 0.5));
        let stats = idx.stats();
        assert_eq!(stats.nodes, 9);
        assert_eq!(stats.leaves, 8);
        assert_eq!(stats.placements, 3);
    }

    #[test]
    fn straddling_body_is_referenced_from_several_leaves() {
        let mut idx = index(1, 8.0);
        let straddler = EntityId::new();
        idx.insert(straddler, cube(Vec3::ZERO, 1.0));
        idx.insert(EntityId::new(), cube(Vec3::splat(4.0), 0.5));
        idx.insert(EntityId::new(), cube(Vec3::splat(-4.0), 0.5));
        assert_eq!(idx.leaf_count_of(straddler), 8);
    }

    #[test]
    fn split_stops_at_max_depth() {
        let mut idx = index(3, 8.0);
        for _ in 0..10 {
            idx.insert(EntityId::new(), cube(Vec3::splat(5.0), 0.1));
        }
        let stats = idx.stats();
        assert_eq!(stats.max_depth_reached, 3);
        assert_eq!(stats.placements, 10);
    }

    #[test]
    fn out_of_bounds_body_is_rejected_and_bounds_stay_fixed() {
        let mut idx = index(4, 8.0);
        assert!(idx.bounds().is_none());
        assert!(!idx.insert(EntityId::new(), cube(Vec3::splat(100.0), 1.0)));
        let bounds = idx.bounds().unwrap();
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.bounds(), Some(bounds));
    }

    #[test]
    fn query_reports_overlapping_neighbours_only() {
        let mut idx = index(4, 8.0);
        let a = EntityId::new();
        let b = EntityId::new();
        let c = EntityId::new();
        let boxes: HashMap<EntityId, Aabb> = [
            (a, cube(Vec3::ZERO, 0.5)),
            (b, cube(Vec3::new(0.9, 0.0, 0.0), 0.5)),
            (c, cube(Vec3::new(3.0, 0.0, 0.0), 0.5)),
        ]
        .into_iter()
        .collect();
        idx.rebuild(boxes.iter().map(|(k, v)| (*k, *v)));

        let found: BTreeSet<EntityId> = idx.query(a, |e| boxes.get(&e).copied()).into_iter().collect();
        assert!(found.contains(&b));
        assert!(!found.contains(&c));
        assert!(!found.contains(&a));
    }

    #[test]
    fn query_has_no_false_negatives() {
        // Deterministic scatter of boxes, many straddling split planes.
        let mut state: u32 = 0x1234_5678;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32
        };
        let mut boxes = BTreeMap::new();
        for _ in 0..200 {
            let center = Vec3::new(next(), next(), next()) * 30.0 - Vec3::splat(15.0);
            let half = Vec3::new(next(), next(), next()) * 1.5 + Vec3::splat(0.1);
            boxes.insert(EntityId::new(), Aabb::from_center_half_extents(center, half));
        }
        let mut idx = index(5, 16.0);
        idx.rebuild(boxes.iter().map(|(k, v)| (*k, *v)));

        for (id, aabb) in &boxes {
            let found: BTreeSet<EntityId> =
                idx.query(*id, |e| boxes.get(&e).copied()).into_iter().collect();
            for (other, other_aabb) in &boxes {
                if other != id && aabb.intersects(other_aabb, 1e-4) {
                    assert!(found.contains(other), "missed overlapping pair");
                }
            }
            for f in &found {
                assert!(aabb.intersects(&boxes[f], 1e-4));
            }
        }
    }

    #[test]
    fn duplicates_are_kept_for_pairs_sharing_several_leaves() {
        let mut idx = index(1, 8.0);
        let a = EntityId::new();
        let b = EntityId::new();
        let boxes: HashMap<EntityId, Aabb> = [
            (a, cube(Vec3::ZERO, 1.0)),
            (b, cube(Vec3::ZERO, 1.0)),
            (EntityId::new(), cube(Vec3::splat(5.0), 0.5)),
        ]
        .into_iter()
        .collect();
        idx.rebuild(boxes.iter().map(|(k, v)| (*k, *v)));
        let hits = idx.query(a, |e| boxes.get(&e).copied());
        assert_eq!(hits.iter().filter(|e| **e == b).count(), 8);
    }

    #[test]
    fn query_uses_current_bounds() {
        let mut idx = index(4, 8.0);
        let a = EntityId::new();
        let b = EntityId::new();
        idx.insert(a, cube(Vec3::ZERO, 0.5));
        idx.insert(b, cube(Vec3::new(0.5, 0.0, 0.0), 0.5));
        // b has since moved away
        let moved = |e: EntityId| {
            Some(if e == b {
                cube(Vec3::new(6.0, 0.0, 0.0), 0.5)
            } else {
                cube(Vec3::ZERO, 0.5)
            })
        };
        assert!(idx.query(a, moved).is_empty());
    }
}
