//! Impulse response for a single contact point.

use crate::body::RigidBody;
use crate::config::PhysicsConfig;
use glam::{Mat3, Vec3};

/// Cross-product matrix: `skew(r) * v == r.cross(v)`.
pub fn skew(r: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, r.z, -r.y),
        Vec3::new(-r.z, 0.0, r.x),
        Vec3::new(r.y, -r.x, 0.0),
    )
}

/// Impulse computed for the triggering body. The partner receives `-impulse`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedImpulse {
    pub impulse: Vec3,
    pub normal: Vec3,
    pub point: Vec3,
}

/// Converts a contact point into equal and opposite impulses.
///
/// Restitution and friction shape only the triggering body's target
/// velocity; the partner takes the opposite impulse at its own offset.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    restitution: f32,
    friction: f32,
    rest_velocity_threshold: f32,
    epsilon: f32,
}

impl CollisionResolver {
    pub fn new(restitution: f32, friction: f32, rest_velocity_threshold: f32, epsilon: f32) -> Self {
        Self {
            restitution,
            friction,
            rest_velocity_threshold,
            epsilon,
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(
            config.restitution,
            config.friction,
            config.rest_velocity_threshold,
            config.epsilon,
        )
    }

    /// Impulse on `a` for a contact at `point`, with `mass_center` the
    /// world mass center of `a`.
    ///
    /// `None` when `a` is at rest, already separating, the contact sits on
    /// the mass center, or the effective-mass matrix is singular.
    pub fn compute(&self, point: Vec3, a: &RigidBody, mass_center: Vec3) -> Option<ResolvedImpulse> {
        let v = a.velocity;
        if v.length() < self.rest_velocity_threshold {
            return None;
        }
        let r = point - mass_center;
        let n = r.try_normalize()?;

        let vn_mag = v.dot(n);
        if vn_mag <= 0.0 {
            return None;
        }
        let vn = n * vn_mag;
        let vt = v - vn;

        let vt_mag = vt.length();
        let a_factor = if vt_mag < self.epsilon {
            0.0
        } else {
            (1.0 - self.friction * (1.0 + self.restitution) * vn.length() / vt_mag).max(0.0)
        };
        let target = -self.restitution * vn + a_factor * vt;

        let rx = skew(r);
        let k = Mat3::from_diagonal(Vec3::splat(a.inverse_mass())) - rx * a.inverse_inertia() * rx;
        if !self.invertible(&k) {
            return None;
        }
        let impulse = k.inverse() * (target - v);
        if !impulse.is_finite() {
            return None;
        }
        Some(ResolvedImpulse {
            impulse,
            normal: n,
            point,
        })
    }

    /// `K` scales with `1/mass`, so its determinant is compared against the
    /// cube of its mean diagonal rather than an absolute threshold.
    fn invertible(&self, k: &Mat3) -> bool {
        let scale = (k.x_axis.x + k.y_axis.y + k.z_axis.z) / 3.0;
        let det = k.determinant();
        scale.is_finite() && scale > 0.0 && det.is_finite() && det.abs() > self.epsilon * scale.powi(3)
    }

    /// Compute and apply: `impulse` to `a` at its offset, `-impulse` to `b`
    /// at its own.
    pub fn resolve(
        &self,
        point: Vec3,
        a: &mut RigidBody,
        mass_center_a: Vec3,
        b: &mut RigidBody,
        mass_center_b: Vec3,
    ) -> Option<ResolvedImpulse> {
        let resolved = self.compute(point, a, mass_center_a)?;
        a.apply_impulse(resolved.impulse, point - mass_center_a);
        b.apply_impulse(-resolved.impulse, point - mass_center_b);
        tracing::debug!(
            a = %a.entity().short(),
            b = %b.entity().short(),
            impulse = ?resolved.impulse,
            "impulse applied"
        );
        Some(resolved)
    }
}
