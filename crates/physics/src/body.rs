use crate::aabb::Aabb;
use crate::error::PhysicsError;
use crate::mass::MassProperties;
use glam::{Mat3, Quat, Vec3};
use impact_common::{EntityId, MeshHandle, Transform};

/// Simulation state of one object.
///
/// The owning entity's transform lives in the kernel world; the body keeps
/// only what the transform does not: velocities, inverse mass and the
/// inverse inertia tensor in body and world frames.
#[derive(Debug, Clone)]
pub struct RigidBody {
    entity: EntityId,
    mesh: MeshHandle,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    mass: f32,
    inverse_mass: f32,
    inverse_inertia_tensor0: Mat3,
    inverse_inertia_world: Mat3,
    local_mass_center: Vec3,
    local_aabb: Aabb,
}

impl RigidBody {
    /// Build a body for a mesh already recentered on its mass center.
    pub fn new(
        entity: EntityId,
        mesh: MeshHandle,
        props: &MassProperties,
        rotation: Quat,
    ) -> Result<Self, PhysicsError> {
        let det = props.inertia.determinant();
        if !(props.mass > 0.0 && det.is_finite() && det > 0.0) {
            return Err(PhysicsError::DegenerateGeometry {
                volume: props.volume,
            });
        }
        let inverse_inertia_tensor0 = props.inverse_inertia();
        let r = Mat3::from_quat(rotation);
        Ok(Self {
            entity,
            mesh,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: props.mass,
            inverse_mass: props.inverse_mass(),
            inverse_inertia_tensor0,
            inverse_inertia_world: r * inverse_inertia_tensor0 * r.transpose(),
            local_mass_center: Vec3::ZERO,
            local_aabb: props.local_aabb,
        })
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Inverse inertia in body axes, fixed at creation.
    pub fn inverse_inertia_tensor0(&self) -> Mat3 {
        self.inverse_inertia_tensor0
    }

    /// Inverse inertia in world axes, tracked through integration.
    pub fn inverse_inertia(&self) -> Mat3 {
        self.inverse_inertia_world
    }

    pub fn local_mass_center(&self) -> Vec3 {
        self.local_mass_center
    }

    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    /// Current world bounds. Always derived from `transform`, never cached.
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        self.local_aabb.transformed(&transform.matrix())
    }

    pub fn mass_center(&self, transform: &Transform) -> Vec3 {
        transform.transform_point(self.local_mass_center)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Apply an impulse `impulse` at offset `r` from the mass center.
    pub fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        self.velocity += self.inverse_mass * impulse;
        self.angular_velocity += self.inverse_inertia_world * r.cross(impulse);
    }

    /// Advance one fixed step: gravity, translation, rotation and the world
    /// inertia update `I' = R I Rᵗ` with the step's incremental rotation.
    pub fn integrate(&mut self, transform: &mut Transform, dt: f32, gravity: Vec3) {
        if self.inverse_mass > 0.0 {
            self.velocity += gravity * dt;
        }
        transform.translate(self.velocity * dt);

        let spin = self.angular_velocity * dt;
        if spin != Vec3::ZERO {
            let delta = Quat::from_scaled_axis(spin);
            transform.rotate(delta);
            let r = Mat3::from_quat(delta);
            self.inverse_inertia_world = r * self.inverse_inertia_world * r.transpose();
        }
    }

    /// Rebuild the world inverse inertia from the body-frame tensor,
    /// discarding drift accumulated by incremental updates.
    pub fn resync_inertia(&mut self, rotation: Quat) {
        let r = Mat3::from_quat(rotation);
        self.inverse_inertia_world = r * self.inverse_inertia_tensor0 * r.transpose();
    }
}
