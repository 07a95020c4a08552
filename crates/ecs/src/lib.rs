//! Per-entity capability table.
//!
//! Each component kind has its own BTreeMap storage keyed by EntityId. Lookups
//! return `Option<&T>`; callers decide whether an absent component is an error.
//!
//! # Invariants
//! - Iteration order is deterministic (BTreeMap).
//! - Component storage is independent of entity creation order.

use impact_common::{EntityId, MeshHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Discriminant for every component kind the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Name,
    MeshRenderer,
    RigidBody,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Name => "Name",
            ComponentKind::MeshRenderer => "MeshRenderer",
            ComponentKind::RigidBody => "RigidBody",
        };
        f.write_str(s)
    }
}

/// Human-readable name component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

/// Draws a mesh; also the geometry source for the entity's rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
}

/// Request for a simulated rigid body. Per-body overrides of physics defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidBodyDesc {
    /// Uniform density; `None` uses the simulation default.
    pub density: Option<f32>,
}

/// Deterministic component storage for all component kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStore {
    names: BTreeMap<EntityId, Name>,
    mesh_renderers: BTreeMap<EntityId, MeshRenderer>,
    rigid_bodies: BTreeMap<EntityId, RigidBodyDesc>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `entity` carries a component of `kind`.
    pub fn has(&self, entity: EntityId, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Name => self.names.contains_key(&entity),
            ComponentKind::MeshRenderer => self.mesh_renderers.contains_key(&entity),
            ComponentKind::RigidBody => self.rigid_bodies.contains_key(&entity),
        }
    }

    /// All component kinds attached to `entity`, in kind order.
    pub fn kinds(&self, entity: EntityId) -> Vec<ComponentKind> {
        [
            ComponentKind::Name,
            ComponentKind::MeshRenderer,
            ComponentKind::RigidBody,
        ]
        .into_iter()
        .filter(|k| self.has(entity, *k))
        .collect()
    }

    // --- Name ---
    pub fn set_name(&mut self, entity: EntityId, name: impl Into<String>) {
        self.names.insert(entity, Name(name.into()));
    }

    pub fn remove_name(&mut self, entity: EntityId) -> Option<Name> {
        self.names.remove(&entity)
    }

    pub fn name(&self, entity: EntityId) -> Option<&Name> {
        self.names.get(&entity)
    }

    pub fn names(&self) -> &BTreeMap<EntityId, Name> {
        &self.names
    }

    // --- MeshRenderer ---
    pub fn set_mesh_renderer(&mut self, entity: EntityId, renderer: MeshRenderer) {
        self.mesh_renderers.insert(entity, renderer);
    }

    pub fn remove_mesh_renderer(&mut self, entity: EntityId) -> Option<MeshRenderer> {
        self.mesh_renderers.remove(&entity)
    }

    pub fn mesh_renderer(&self, entity: EntityId) -> Option<&MeshRenderer> {
        self.mesh_renderers.get(&entity)
    }

    pub fn mesh_renderers(&self) -> &BTreeMap<EntityId, MeshRenderer> {
        &self.mesh_renderers
    }

    // --- RigidBody ---
    pub fn set_rigid_body(&mut self, entity: EntityId, desc: RigidBodyDesc) {
        self.rigid_bodies.insert(entity, desc);
    }

    pub fn remove_rigid_body(&mut self, entity: EntityId) -> Option<RigidBodyDesc> {
        self.rigid_bodies.remove(&entity)
    }

    pub fn rigid_body(&self, entity: EntityId) -> Option<&RigidBodyDesc> {
        self.rigid_bodies.get(&entity)
    }

    pub fn rigid_bodies(&self) -> &BTreeMap<EntityId, RigidBodyDesc> {
        &self.rigid_bodies
    }

    /// Remove all components for an entity.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.remove_name(entity);
        self.remove_mesh_renderer(entity);
        self.remove_rigid_body(entity);
    }
}
