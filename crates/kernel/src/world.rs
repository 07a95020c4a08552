use glam::{Mat4, Quat, Vec3};
use impact_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hasher;

/// Scene-graph collaborator: every entity's transform and the step counter.
///
/// Physics reads world matrices from here and writes motion back through
/// [`World::translate`], [`World::rotate`] or [`World::transform_mut`].
/// Each write bumps the node's revision so the renderer can tell which
/// instance matrices to re-upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    nodes: BTreeMap<EntityId, Node>,
    tick: u64,
}

/// One entity's place in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub transform: Transform,
    /// Number of transform writes since spawn.
    pub revision: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed steps completed.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn step(&mut self) {
        self.tick += 1;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Entity ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn nodes(&self) -> &BTreeMap<EntityId, Node> {
        &self.nodes
    }

    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.insert(id, transform);
        id
    }

    /// Place `id` with `transform`, replacing any existing node.
    pub fn insert(&mut self, id: EntityId, transform: Transform) {
        self.nodes.insert(
            id,
            Node {
                transform,
                revision: 0,
            },
        );
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn transform(&self, id: EntityId) -> Option<&Transform> {
        self.nodes.get(&id).map(|n| &n.transform)
    }

    /// Mutable access for in-place integration. Counts as a write.
    pub fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.nodes.get_mut(&id).map(|n| {
            n.revision += 1;
            &mut n.transform
        })
    }

    /// Local-to-world matrix.
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.transform(id).map(Transform::matrix)
    }

    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        self.transform_mut(id).map(|t| *t = transform).is_some()
    }

    /// Move by `delta`. False when `id` is unknown.
    pub fn translate(&mut self, id: EntityId, delta: Vec3) -> bool {
        self.transform_mut(id).map(|t| t.translate(delta)).is_some()
    }

    /// Rotate by `delta` in world space. False when `id` is unknown.
    pub fn rotate(&mut self, id: EntityId, delta: Quat) -> bool {
        self.transform_mut(id).map(|t| t.rotate(delta)).is_some()
    }

    /// Hash of the tick and every transform, bit-exact, in id order.
    /// Revisions are not included.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1a::default();
        hasher.write_u64(self.tick);
        for (id, node) in &self.nodes {
            hasher.write(id.0.as_bytes());
            let t = &node.transform;
            let floats = t
                .position
                .to_array()
                .into_iter()
                .chain(t.rotation.to_array())
                .chain(t.scale.to_array());
            for f in floats {
                hasher.write_u32(f.to_bits());
            }
        }
        hasher.finish()
    }
}

/// 64-bit FNV-1a. Stable across runs and platforms, unlike `DefaultHasher`.
struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.write(&n.to_le_bytes());
    }

    fn write_u64(&mut self, n: u64) {
        self.write(&n.to_le_bytes());
    }
}
