use crate::aabb::Aabb;
use crate::body::RigidBody;
use crate::config::PhysicsConfig;
use crate::error::{ConfigError, PhysicsError};
use crate::mass::{MassProperties, MassPropertiesCalculator};
use crate::narrow::{BodyGeometry, Contact, NarrowPhaseDetector};
use crate::octree::{OctreeStats, SpatialIndex};
use crate::resolve::CollisionResolver;
use crate::scene::Scene;
use glam::Vec3;
use impact_common::{EntityId, MeshHandle};
use impact_kernel::FixedTimestep;
use std::collections::{BTreeMap, BTreeSet};

/// One narrow-phase contact found during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// Body whose motion triggered the test.
    pub a: EntityId,
    pub b: EntityId,
    pub point: Vec3,
    pub hits: usize,
    /// Impulse applied to `a`; `None` when resolution was skipped.
    pub impulse: Option<Vec3>,
}

/// What one fixed step did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub tick: u64,
    /// Distinct broad-phase candidate pairs tested by the narrow phase.
    pub candidates: usize,
    pub contacts: Vec<ContactRecord>,
}

impl StepReport {
    /// Number of contacts that produced an impulse.
    pub fn impulses(&self) -> usize {
        self.contacts.iter().filter(|c| c.impulse.is_some()).count()
    }
}

/// Owns every rigid body, the broad-phase octree and the mass cache.
///
/// Each fixed step runs in three passes:
/// 1. detect: rebuild the octree from current bounds, then query and run the
///    narrow phase for every moving body without mutating anything;
/// 2. resolve: apply impulses for the detected contacts in order;
/// 3. integrate: advance every body and write its transform back.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: BTreeMap<EntityId, RigidBody>,
    index: SpatialIndex,
    mass_cache: BTreeMap<MeshHandle, MassProperties>,
    clock: FixedTimestep,
    detector: NarrowPhaseDetector,
    resolver: CollisionResolver,
    tick: u64,
    last_report: Option<StepReport>,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            index: SpatialIndex::new(&config.octree, config.epsilon),
            clock: FixedTimestep::new(f64::from(config.fixed_dt), config.max_substeps),
            detector: NarrowPhaseDetector::new(config.epsilon),
            resolver: CollisionResolver::from_config(&config),
            bodies: BTreeMap::new(),
            mass_cache: BTreeMap::new(),
            tick: 0,
            last_report: None,
            config,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Fixed steps taken so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }

    pub fn body(&self, entity: EntityId) -> Option<&RigidBody> {
        self.bodies.get(&entity)
    }

    pub fn body_mut(&mut self, entity: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&entity)
    }

    pub fn bodies(&self) -> &BTreeMap<EntityId, RigidBody> {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Distinct meshes whose mass properties have been computed.
    pub fn cached_meshes(&self) -> usize {
        self.mass_cache.len()
    }

    pub fn octree_stats(&self) -> OctreeStats {
        self.index.stats()
    }

    pub fn octree_bounds(&self) -> Option<Aabb> {
        self.index.bounds()
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last_report.as_ref()
    }

    /// Create the rigid body for `entity`.
    ///
    /// The entity must carry a mesh renderer and a transform. The first body
    /// using a mesh computes its mass properties and recenters the mesh on its
    /// mass center; every entity rendering that mesh is shifted so nothing
    /// moves on screen. Later bodies reuse the cached result. The entity's
    /// scale at load time is folded into its mass and inertia; later scale
    /// changes are not tracked.
    pub fn load(&mut self, entity: EntityId, scene: &mut Scene) -> Result<&RigidBody, PhysicsError> {
        if self.bodies.contains_key(&entity) {
            return Err(PhysicsError::AlreadyLoaded(entity));
        }
        let handle = scene
            .components
            .mesh_renderer(entity)
            .ok_or_else(|| PhysicsError::missing(entity, "MeshRenderer"))?
            .mesh;
        let density = scene
            .components
            .rigid_body(entity)
            .and_then(|desc| desc.density)
            .unwrap_or(self.config.density);
        if !(density.is_finite() && density > 0.0) {
            return Err(PhysicsError::InvalidDensity(density));
        }
        if scene.world.transform(entity).is_none() {
            return Err(PhysicsError::missing(entity, "Transform"));
        }

        let base = match self.mass_cache.get(&handle) {
            Some(props) => *props,
            None => {
                let props = self.compute_and_recenter(handle, scene)?;
                self.mass_cache.insert(handle, props);
                props
            }
        };
        let transform = *scene
            .world
            .transform(entity)
            .ok_or_else(|| PhysicsError::missing(entity, "Transform"))?;
        let mut props = base.with_density(1.0, density);
        if transform.scale != Vec3::ONE {
            props = props.with_scale(transform.scale);
            tracing::debug!(
                entity = %entity.short(),
                scale = ?transform.scale,
                "mass properties scaled"
            );
        }
        let body = RigidBody::new(entity, handle, &props, transform.rotation)?;
        tracing::info!(
            entity = %entity.short(),
            mass = props.mass,
            volume = props.volume,
            "rigid body loaded"
        );
        Ok(self.bodies.entry(entity).or_insert(body))
    }

    /// Load every entity that requests a rigid body and has none yet.
    /// Returns the number of bodies created.
    pub fn load_all(&mut self, scene: &mut Scene) -> Result<usize, PhysicsError> {
        let pending: Vec<EntityId> = scene
            .components
            .rigid_bodies()
            .keys()
            .filter(|id| !self.bodies.contains_key(id))
            .copied()
            .collect();
        for id in &pending {
            self.load(*id, scene)?;
        }
        Ok(pending.len())
    }

    /// Remove a body. The entity itself stays in the scene.
    pub fn unload(&mut self, entity: EntityId) -> Option<RigidBody> {
        self.bodies.remove(&entity)
    }

    /// Feed a variable frame delta and run as many fixed steps as it covers.
    /// Returns the number of steps run.
    pub fn update(&mut self, scene: &mut Scene, frame_dt: f64) -> Result<u32, PhysicsError> {
        let steps = self.clock.advance(frame_dt);
        for _ in 0..steps {
            self.fixed_update(scene)?;
        }
        Ok(steps)
    }

    /// Run exactly one fixed step.
    pub fn fixed_update(&mut self, scene: &mut Scene) -> Result<StepReport, PhysicsError> {
        let tick = self.tick + 1;
        let _span = tracing::info_span!("physics_step", tick).entered();

        let aabbs = self.rebuild_index(scene)?;
        let (pending, candidates) = self.detect(scene, &aabbs)?;
        let contacts = self.resolve(scene, pending)?;
        self.integrate(scene, tick)?;

        scene.world.step();
        self.tick = tick;
        let report = StepReport {
            tick,
            candidates,
            contacts,
        };
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn compute_and_recenter(
        &self,
        handle: MeshHandle,
        scene: &mut Scene,
    ) -> Result<MassProperties, PhysicsError> {
        let mesh = scene
            .meshes
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownMesh(handle))?;
        let props = MassPropertiesCalculator::new(1.0)?.apply(mesh)?;

        let com = props.center_of_mass;
        if com != Vec3::ZERO {
            let users: Vec<EntityId> = scene
                .components
                .mesh_renderers()
                .iter()
                .filter(|(_, r)| r.mesh == handle)
                .map(|(id, _)| *id)
                .collect();
            for id in users {
                if let Some(transform) = scene.world.transform_mut(id) {
                    let shift = transform.transform_vector(com);
                    transform.translate(shift);
                }
            }
        }
        Ok(props)
    }

    fn rebuild_index(&mut self, scene: &Scene) -> Result<BTreeMap<EntityId, Aabb>, PhysicsError> {
        let mut aabbs = BTreeMap::new();
        for (id, body) in &self.bodies {
            let transform = scene
                .world
                .transform(*id)
                .ok_or_else(|| PhysicsError::missing(*id, "Transform"))?;
            aabbs.insert(*id, body.world_aabb(transform));
        }
        self.index.rebuild(aabbs.iter().map(|(id, aabb)| (*id, *aabb)));
        Ok(aabbs)
    }

    fn geometry<'a>(
        &'a self,
        entity: EntityId,
        scene: &'a Scene,
    ) -> Result<BodyGeometry<'a>, PhysicsError> {
        let body = self
            .bodies
            .get(&entity)
            .ok_or_else(|| PhysicsError::missing(entity, "RigidBody"))?;
        let transform = scene
            .world
            .transform(entity)
            .ok_or_else(|| PhysicsError::missing(entity, "Transform"))?;
        let mesh = scene
            .meshes
            .get(body.mesh())
            .ok_or(PhysicsError::UnknownMesh(body.mesh()))?;
        Ok(BodyGeometry {
            body,
            transform,
            mesh,
        })
    }

    /// Read-only pass: candidate pairs and their contacts.
    fn detect(
        &self,
        scene: &Scene,
        aabbs: &BTreeMap<EntityId, Aabb>,
    ) -> Result<(Vec<(EntityId, EntityId, Contact)>, usize), PhysicsError> {
        let threshold = self.config.rest_velocity_threshold;
        let mut pending = Vec::new();
        let mut candidates = 0;
        for (id, body) in &self.bodies {
            if body.speed() < threshold {
                continue;
            }
            let partners: BTreeSet<EntityId> = self
                .index
                .query(*id, |e| aabbs.get(&e).copied())
                .into_iter()
                .collect();
            if partners.is_empty() {
                continue;
            }
            tracing::trace!(body = %id.short(), candidates = partners.len(), "broad phase");
            candidates += partners.len();

            let a = self.geometry(*id, scene)?;
            for other in partners {
                let b = self.geometry(other, scene)?;
                if let Some(contact) = self.detector.detect(&a, &b) {
                    tracing::debug!(
                        a = %id.short(),
                        b = %other.short(),
                        point = ?contact.point,
                        hits = contact.hits,
                        "contact"
                    );
                    pending.push((*id, other, contact));
                }
            }
        }
        Ok((pending, candidates))
    }

    /// Serialized pass: impulses against the velocities left by earlier
    /// contacts in the same step.
    fn resolve(
        &mut self,
        scene: &Scene,
        pending: Vec<(EntityId, EntityId, Contact)>,
    ) -> Result<Vec<ContactRecord>, PhysicsError> {
        let mut records = Vec::with_capacity(pending.len());
        for (a, b, contact) in pending {
            let mass_center_a = self.mass_center(a, scene)?;
            let mass_center_b = self.mass_center(b, scene)?;
            let mut body_a = self
                .bodies
                .remove(&a)
                .ok_or_else(|| PhysicsError::missing(a, "RigidBody"))?;
            let resolved = match self.bodies.get_mut(&b) {
                Some(body_b) => self.resolver.resolve(
                    contact.point,
                    &mut body_a,
                    mass_center_a,
                    body_b,
                    mass_center_b,
                ),
                None => None,
            };
            let partner_missing = !self.bodies.contains_key(&b);
            self.bodies.insert(a, body_a);
            if partner_missing {
                return Err(PhysicsError::missing(b, "RigidBody"));
            }
            records.push(ContactRecord {
                a,
                b,
                point: contact.point,
                hits: contact.hits,
                impulse: resolved.map(|r| r.impulse),
            });
        }
        Ok(records)
    }

    fn integrate(&mut self, scene: &mut Scene, tick: u64) -> Result<(), PhysicsError> {
        let dt = self.config.fixed_dt;
        let gravity = self.config.gravity;
        let interval = u64::from(self.config.inertia_resync_interval);
        let resync = interval > 0 && tick % interval == 0;
        for (id, body) in &mut self.bodies {
            let transform = scene
                .world
                .transform_mut(*id)
                .ok_or_else(|| PhysicsError::missing(*id, "Transform"))?;
            body.integrate(transform, dt, gravity);
            if resync {
                body.resync_inertia(transform.rotation);
            }
        }
        Ok(())
    }

    fn mass_center(&self, entity: EntityId, scene: &Scene) -> Result<Vec3, PhysicsError> {
        let body = self
            .bodies
            .get(&entity)
            .ok_or_else(|| PhysicsError::missing(entity, "RigidBody"))?;
        let transform = scene
            .world
            .transform(entity)
            .ok_or_else(|| PhysicsError::missing(entity, "Transform"))?;
        Ok(body.mass_center(transform))
    }
}
