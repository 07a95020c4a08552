use impact_common::{EntityId, MeshHandle};

/// Errors raised by physics operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// A required companion component is absent. Fatal for the caller.
    #[error("entity {} is missing required component {component}", .entity.short())]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
    /// Mass and inertia are undefined for (near) zero-volume meshes.
    #[error("degenerate geometry: signed volume {volume} is too close to zero")]
    DegenerateGeometry { volume: f32 },
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    #[error("density must be positive and finite, got {0}")]
    InvalidDensity(f32),
    #[error("mesh not found: {0:?}")]
    UnknownMesh(MeshHandle),
    #[error("entity {} already has a rigid body", .0.short())]
    AlreadyLoaded(EntityId),
}

impl PhysicsError {
    pub(crate) fn missing(entity: EntityId, component: &'static str) -> Self {
        Self::MissingComponent { entity, component }
    }
}

/// Errors from loading or validating a [`crate::PhysicsConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
