use glam::Vec3;
use impact_assets::MeshStore;
use impact_common::{EntityId, MeshHandle, Transform};
use impact_ecs::{ComponentStore, MeshRenderer, RigidBodyDesc};
use impact_kernel::World;

/// The collaborators physics reads from and writes back to: transforms,
/// components and mesh resources.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub world: World,
    pub components: ComponentStore,
    pub meshes: MeshStore,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an entity that renders `mesh` and requests a rigid body with
    /// default settings.
    pub fn spawn_mesh_body(&mut self, transform: Transform, mesh: MeshHandle) -> EntityId {
        let id = self.world.spawn(transform);
        self.components.set_mesh_renderer(id, MeshRenderer { mesh });
        self.components.set_rigid_body(id, RigidBodyDesc::default());
        id
    }

    /// Convenience for an axis-aligned cube body of the given edge length.
    pub fn spawn_cube(&mut self, position: Vec3, edge: f32) -> EntityId {
        let mesh = self.meshes.register_cuboid(Vec3::splat(edge * 0.5));
        self.spawn_mesh_body(Transform::from_position(position), mesh)
    }

    /// Despawn an entity and drop its components.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.components.remove_entity(id);
        self.world.despawn(id).is_some()
    }
}
