//! Narrow phase: ray casts from one body's mass center through its vertices
//! against the other body's triangles, averaged into a single contact point.

use crate::aabb::Aabb;
use crate::body::RigidBody;
use glam::{Mat4, Vec3};
use impact_assets::Mesh;
use impact_common::Transform;

/// World-space triangle with its face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub normal: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            a,
            b,
            c,
            normal: (b - a).cross(c - a).normalize_or_zero(),
        }
    }

    pub fn transformed(&self, mat: &Mat4) -> Self {
        Self::new(
            mat.transform_point3(self.a),
            mat.transform_point3(self.b),
            mat.transform_point3(self.c),
        )
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.a.min(self.b).min(self.c), self.a.max(self.b).max(self.c))
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }
}

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray from `origin` through `through`, or `None` when the points coincide.
    pub fn through(origin: Vec3, through: Vec3) -> Option<Self> {
        let direction = (through - origin).try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Möller–Trumbore intersection.
///
/// Returns the hit point for hits strictly in front of the origin and
/// strictly inside the triangle. Rays parallel to the plane and hits within
/// `epsilon` of an edge are misses.
pub fn ray_triangle(ray: &Ray, tri: &Triangle, epsilon: f32) -> Option<Vec3> {
    let edge1 = tri.b - tri.a;
    let edge2 = tri.c - tri.a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < epsilon {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - tri.a;
    let u = s.dot(p) * inv_det;
    if u < epsilon || u > 1.0 - epsilon {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < epsilon || u + v > 1.0 - epsilon {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > epsilon).then(|| ray.at(t))
}

/// Single averaged contact between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Vec3,
    /// Number of ray hits averaged into `point`.
    pub hits: usize,
}

/// A body together with the collaborators it is tested through.
#[derive(Debug, Clone, Copy)]
pub struct BodyGeometry<'a> {
    pub body: &'a RigidBody,
    pub transform: &'a Transform,
    pub mesh: &'a Mesh,
}

impl BodyGeometry<'_> {
    pub fn world_aabb(&self) -> Aabb {
        self.body.world_aabb(self.transform)
    }

    pub fn mass_center(&self) -> Vec3 {
        self.body.mass_center(self.transform)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NarrowPhaseDetector {
    epsilon: f32,
}

impl NarrowPhaseDetector {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// Contact of `a` against `b`, where `a` is the body whose step
    /// triggered the test.
    pub fn detect(&self, a: &BodyGeometry<'_>, b: &BodyGeometry<'_>) -> Option<Contact> {
        let aabb_a = a.world_aabb();
        let aabb_b = b.world_aabb();
        if !aabb_a.intersects(&aabb_b, self.epsilon) {
            return None;
        }
        let overlap = aabb_a.overlap(&aabb_b);

        let matrix_a = a.transform.matrix();
        let vertices: Vec<Vec3> = a
            .mesh
            .positions()
            .iter()
            .map(|p| matrix_a.transform_point3(*p))
            .filter(|p| overlap.contains_point(*p, self.epsilon))
            .collect();
        if vertices.is_empty() {
            return None;
        }

        let matrix_b = b.transform.matrix();
        let triangles: Vec<Triangle> = b
            .mesh
            .triangles()
            .map(|[p0, p1, p2]| Triangle::new(p0, p1, p2).transformed(&matrix_b))
            .filter(|tri| tri.aabb().intersects(&overlap, self.epsilon))
            .collect();
        if triangles.is_empty() {
            return None;
        }

        let origin = a.mass_center();
        let mut sum = Vec3::ZERO;
        let mut hits = 0usize;
        for vertex in &vertices {
            let Some(ray) = Ray::through(origin, *vertex) else {
                continue;
            };
            for tri in &triangles {
                if let Some(hit) = ray_triangle(&ray, tri, self.epsilon) {
                    sum += hit;
                    hits += 1;
                }
            }
        }

        tracing::trace!(
            vertices = vertices.len(),
            triangles = triangles.len(),
            hits,
            "narrow phase"
        );
        (hits > 0).then(|| Contact {
            point: sum / hits as f32,
            hits,
        })
    }
}
