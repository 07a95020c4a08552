use glam::Vec3;
use impact_common::EntityId;
use impact_kernel::World;
use impact_physics::{Aabb, PhysicsWorld};

/// Physics inspector for developer tooling.
///
/// Read-only views over the simulation for debug overlays and logs.
pub struct PhysicsInspector;

impl PhysicsInspector {
    pub fn summary(physics: &PhysicsWorld) -> PhysicsSummary {
        let stats = physics.octree_stats();
        let moving = physics
            .bodies()
            .values()
            .filter(|b| b.speed() >= physics.config().rest_velocity_threshold)
            .count();
        let (last_candidates, last_contacts, last_impulses) = physics
            .last_report()
            .map(|r| (r.candidates, r.contacts.len(), r.impulses()))
            .unwrap_or_default();
        PhysicsSummary {
            tick: physics.tick(),
            bodies: physics.body_count(),
            moving,
            cached_meshes: physics.cached_meshes(),
            octree_nodes: stats.nodes,
            octree_leaves: stats.leaves,
            octree_depth: stats.max_depth_reached,
            last_candidates,
            last_contacts,
            last_impulses,
        }
    }

    /// Accessor snapshot for one body, or `None` if it has no rigid body or
    /// no transform.
    pub fn body_info(physics: &PhysicsWorld, world: &World, id: EntityId) -> Option<BodyInfo> {
        let body = physics.body(id)?;
        let transform = world.transform(id)?;
        let inv = body.inverse_inertia();
        Some(BodyInfo {
            id,
            mass_center: body.mass_center(transform),
            aabb: body.world_aabb(transform),
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            inverse_mass: body.inverse_mass(),
            inverse_inertia_diagonal: Vec3::new(inv.x_axis.x, inv.y_axis.y, inv.z_axis.z),
        })
    }

    /// Every entity with a rigid body, in id order.
    pub fn list_bodies(physics: &PhysicsWorld) -> Vec<EntityId> {
        physics.bodies().keys().copied().collect()
    }
}

/// Summary of simulation state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsSummary {
    pub tick: u64,
    pub bodies: usize,
    pub moving: usize,
    pub cached_meshes: usize,
    pub octree_nodes: usize,
    pub octree_leaves: usize,
    pub octree_depth: u32,
    pub last_candidates: usize,
    pub last_contacts: usize,
    pub last_impulses: usize,
}

impl std::fmt::Display for PhysicsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Physics: tick={} bodies={} moving={} meshes={} octree={}n/{}l/d{} candidates={} contacts={} impulses={}",
            self.tick,
            self.bodies,
            self.moving,
            self.cached_meshes,
            self.octree_nodes,
            self.octree_leaves,
            self.octree_depth,
            self.last_candidates,
            self.last_contacts,
            self.last_impulses,
        )
    }
}

/// Detailed state of a single body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInfo {
    pub id: EntityId,
    pub mass_center: Vec3,
    pub aabb: Aabb,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inverse_mass: f32,
    pub inverse_inertia_diagonal: Vec3,
}

impl std::fmt::Display for BodyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.mass_center;
        let v = self.velocity;
        let w = self.angular_velocity;
        write!(
            f,
            "Body [{}] com=({:.3}, {:.3}, {:.3}) v=({:.3}, {:.3}, {:.3}) w=({:.3}, {:.3}, {:.3}) inv_mass={:.3}",
            self.id.short(),
            c.x,
            c.y,
            c.z,
            v.x,
            v.y,
            v.z,
            w.x,
            w.y,
            w.z,
            self.inverse_mass,
        )
    }
}
