use crate::aabb::Aabb;
use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the simulation. Every field has a default, so a config file
/// only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed simulation interval in seconds.
    pub fixed_dt: f32,
    /// Maximum fixed steps run per frame; older backlog is dropped.
    pub max_substeps: u32,
    /// Uniform density used when a body does not override it.
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Geometric tolerance for AABB tests, vertex filtering and ray casts.
    pub epsilon: f32,
    /// Bodies slower than this never trigger collision resolution.
    pub rest_velocity_threshold: f32,
    pub gravity: Vec3,
    pub octree: OctreeConfig,
    /// When non-zero, rebuild each body's world inverse inertia from its
    /// body-frame tensor every N ticks. Zero keeps the incremental update only.
    pub inertia_resync_interval: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_substeps: 8,
            density: 1.0,
            restitution: 0.5,
            friction: 0.3,
            epsilon: 1e-4,
            rest_velocity_threshold: 1e-3,
            gravity: Vec3::ZERO,
            octree: OctreeConfig::default(),
            inertia_resync_interval: 0,
        }
    }
}

/// Broad-phase octree settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    pub max_depth: u32,
    /// A leaf splits once it holds more references than this.
    pub leaf_capacity: usize,
    pub center: Vec3,
    pub half_extent: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            leaf_capacity: 2,
            center: Vec3::ZERO,
            half_extent: 512.0,
        }
    }
}

impl OctreeConfig {
    /// Root bounds described by this config.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vec3::splat(self.half_extent))
    }
}

impl PhysicsConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return invalid("fixed_dt must be positive");
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return invalid("density must be positive");
        }
        if !(self.restitution >= 0.0) {
            return invalid("restitution must be non-negative");
        }
        if !(self.friction >= 0.0) {
            return invalid("friction must be non-negative");
        }
        if !(self.epsilon > 0.0) {
            return invalid("epsilon must be positive");
        }
        if !(self.rest_velocity_threshold >= 0.0) {
            return invalid("rest_velocity_threshold must be non-negative");
        }
        if !self.gravity.is_finite() {
            return invalid("gravity must be finite");
        }
        if self.octree.max_depth == 0 {
            return invalid("octree.max_depth must be at least 1");
        }
        if !(self.octree.half_extent.is_finite() && self.octree.half_extent > 0.0) {
            return invalid("octree.half_extent must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.octree.max_depth, 6);
        assert_eq!(config.octree.leaf_capacity, 2);
    }

    #[test]
    fn yaml_overrides_only_named_keys() {
        let config = PhysicsConfig::from_yaml_str(
            "restitution: 0.8\ngravity: [0.0, -9.81, 0.0]\noctree:\n  max_depth: 3\n",
        )
        .unwrap();
        assert_eq!(config.restitution, 0.8);
        assert_eq!(config.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(config.octree.max_depth, 3);
        assert_eq!(config.octree.leaf_capacity, 2);
        assert_eq!(config.friction, PhysicsConfig::default().friction);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            PhysicsConfig::from_yaml_str("fixed_dt: 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(PhysicsConfig::from_yaml_str("friction: -1.0").is_err());
        assert!(PhysicsConfig::from_yaml_str("octree:\n  max_depth: 0").is_err());
        assert!(matches!(
            PhysicsConfig::from_yaml_str("restitution: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "density: 2.5").unwrap();
        let config = PhysicsConfig::load(tmp.path()).unwrap();
        assert_eq!(config.density, 2.5);
    }
}
