//! Rigid-body physics for triangle meshes.
//!
//! Pipeline per fixed step: rebuild the octree from current world bounds,
//! query broad-phase candidates for every moving body, cast rays from its mass
//! center through its vertices against the candidate's triangles, then turn
//! the averaged contact point into equal and opposite impulses. Bodies are
//! integrated last.
//!
//! # Invariants
//! - Mass properties are computed once per mesh, and only for meshes with a
//!   non-degenerate volume.
//! - World AABBs are derived from the current transform on every use.
//! - The octree root bounds never change once set.
//! - Detection never mutates bodies; impulses are applied in a separate,
//!   ordered pass.

pub mod aabb;
pub mod body;
pub mod config;
pub mod error;
pub mod mass;
pub mod narrow;
pub mod octree;
pub mod resolve;
pub mod scene;
pub mod world;

pub use aabb::Aabb;
pub use body::RigidBody;
pub use config::{OctreeConfig, PhysicsConfig};
pub use error::{ConfigError, PhysicsError};
pub use mass::{MassProperties, MassPropertiesCalculator};
pub use narrow::{BodyGeometry, Contact, NarrowPhaseDetector, Ray, Triangle, ray_triangle};
pub use octree::{OctreeStats, SpatialIndex};
pub use resolve::{CollisionResolver, ResolvedImpulse, skew};
pub use scene::Scene;
pub use world::{ContactRecord, PhysicsWorld, StepReport};
