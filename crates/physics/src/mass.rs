//! Mass, center of mass and inertia tensor of a closed triangle mesh.
//!
//! The mesh is split into signed tetrahedra, one per triangle, each sharing
//! the local origin as apex. Their volume, first moment and second moments
//! are summed in f64 and assembled into a symmetric inertia tensor, which is
//! then shifted to the center of mass with the parallel axis theorem.

use crate::aabb::Aabb;
use crate::error::PhysicsError;
use glam::{DMat3, DVec3, Mat3, Vec3};
use impact_assets::Mesh;

/// Relative volume below which a mesh counts as flat.
const MIN_RELATIVE_VOLUME: f64 = 1e-6;

/// Result of [`MassPropertiesCalculator::compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f32,
    pub volume: f32,
    /// Center of mass in the mesh's local frame before recentering.
    pub center_of_mass: Vec3,
    /// Inertia tensor about the center of mass, body axes.
    pub inertia: Mat3,
    /// Local bounds after moving the origin to the center of mass.
    pub local_aabb: Aabb,
}

impl MassProperties {
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    pub fn inverse_inertia(&self) -> Mat3 {
        self.inertia.inverse()
    }

    /// Same geometry at a different uniform density.
    pub fn with_density(&self, from: f32, to: f32) -> Self {
        let k = to / from;
        Self {
            mass: self.mass * k,
            inertia: self.inertia * k,
            ..*self
        }
    }

    /// Same body stretched by a local `scale` applied before rotation.
    ///
    /// Mass and volume grow with `|sx·sy·sz|`. The second moment
    /// `C = tr(I)/2 − I` maps to `|det S|·S·C·S` and the tensor is rebuilt
    /// from it. Center of mass and local bounds stay in the unscaled frame.
    pub fn with_scale(&self, scale: Vec3) -> Self {
        let factor = (scale.x * scale.y * scale.z).abs();
        let s = Mat3::from_diagonal(scale);
        let half_trace = trace(self.inertia) * 0.5;
        let second = Mat3::from_diagonal(Vec3::splat(half_trace)) - self.inertia;
        let scaled = s * second * s * factor;
        Self {
            mass: self.mass * factor,
            volume: self.volume * factor,
            inertia: Mat3::from_diagonal(Vec3::splat(trace(scaled))) - scaled,
            ..*self
        }
    }
}

fn trace(m: Mat3) -> f32 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// One-shot mass property extraction for a triangle mesh of uniform density.
#[derive(Debug, Clone, Copy)]
pub struct MassPropertiesCalculator {
    density: f32,
}

impl MassPropertiesCalculator {
    pub fn new(density: f32) -> Result<Self, PhysicsError> {
        if !(density.is_finite() && density > 0.0) {
            return Err(PhysicsError::InvalidDensity(density));
        }
        Ok(Self { density })
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Compute mass properties without touching the mesh.
    ///
    /// The mesh must be closed and consistently wound. A mesh wound inside
    /// out yields a negative signed volume and is accepted with its moments
    /// negated.
    pub fn compute(&self, mesh: &Mesh) -> Result<MassProperties, PhysicsError> {
        validate(mesh)?;

        let mut det_sum = 0.0f64;
        let mut first = DVec3::ZERO;
        // Integrals of x², y², z² and of xy, yz, zx over the solid.
        let mut diag = DVec3::ZERO;
        let mut prod = DVec3::ZERO;

        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (a.as_dvec3(), b.as_dvec3(), c.as_dvec3());
            let det = a.dot(b.cross(c));
            det_sum += det;
            first += det * (a + b + c);
            diag += det / 60.0 * square_terms(a, b, c);
            prod += det / 120.0 * product_terms(a, b, c);
        }

        let mut volume = det_sum / 6.0;
        if volume < 0.0 {
            volume = -volume;
            diag = -diag;
            prod = -prod;
        }

        let bounds = Aabb::from_points(mesh.positions().iter().copied())
            .ok_or_else(|| PhysicsError::InvalidMesh("mesh has no vertices".into()))?;
        let extent = bounds.size().max_element() as f64;
        if !(volume > MIN_RELATIVE_VOLUME * extent * extent * extent) {
            return Err(PhysicsError::DegenerateGeometry {
                volume: volume as f32,
            });
        }

        let center = first / (4.0 * det_sum);
        let density = self.density as f64;
        let mass = density * volume;

        let about_origin = DMat3::from_cols(
            DVec3::new(diag.y + diag.z, -prod.x, -prod.z),
            DVec3::new(-prod.x, diag.x + diag.z, -prod.y),
            DVec3::new(-prod.z, -prod.y, diag.x + diag.y),
        ) * density;
        let shift = DMat3::from_diagonal(DVec3::splat(center.length_squared()))
            - outer(center, center);
        let inertia = about_origin - shift * mass;

        let com = center.as_vec3();
        let local_aabb = Aabb {
            min: bounds.min - com,
            max: bounds.max - com,
        };

        Ok(MassProperties {
            mass: mass as f32,
            volume: volume as f32,
            center_of_mass: com,
            inertia: inertia.as_mat3(),
            local_aabb,
        })
    }

    /// Compute mass properties and move the mesh origin to the center of
    /// mass. Vertices are rewritten in place and a vertex-buffer refresh is
    /// requested. Run once per mesh.
    pub fn apply(&self, mesh: &mut Mesh) -> Result<MassProperties, PhysicsError> {
        let props = self.compute(mesh)?;
        mesh.recenter(props.center_of_mass);
        tracing::debug!(
            mesh = %mesh.name(),
            mass = props.mass,
            com = ?props.center_of_mass,
            "mesh recentered on its mass center"
        );
        Ok(props)
    }
}

fn validate(mesh: &Mesh) -> Result<(), PhysicsError> {
    if mesh.vertex_count() < 4 {
        return Err(PhysicsError::InvalidMesh(format!(
            "{} has {} vertices, need at least 4",
            mesh.name(),
            mesh.vertex_count()
        )));
    }
    if mesh.indices().len() % 3 != 0 {
        return Err(PhysicsError::InvalidMesh(format!(
            "{} index count {} is not a multiple of 3",
            mesh.name(),
            mesh.indices().len()
        )));
    }
    if let Some(bad) = mesh
        .indices()
        .iter()
        .find(|i| **i as usize >= mesh.vertex_count())
    {
        return Err(PhysicsError::InvalidMesh(format!(
            "{} index {bad} out of range",
            mesh.name()
        )));
    }
    Ok(())
}

fn square_terms(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    a * a + b * b + c * c + a * b + a * c + b * c
}

/// Components are the xy, yz and zx polynomials, in that order.
fn product_terms(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let term = |j: usize, k: usize| {
        2.0 * (a[j] * a[k] + b[j] * b[k] + c[j] * c[k])
            + a[j] * b[k]
            + a[k] * b[j]
            + a[j] * c[k]
            + a[k] * c[j]
            + b[j] * c[k]
            + b[k] * c[j]
    };
    DVec3::new(term(0, 1), term(1, 2), term(2, 0))
}

fn outer(u: DVec3, v: DVec3) -> DMat3 {
    DMat3::from_cols(u * v.x, u * v.y, u * v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn assert_mat_close(m: Mat3, expected: Mat3) {
        for (x, y) in m.to_cols_array().iter().zip(expected.to_cols_array()) {
            assert!(close(*x, y), "{m:?} != {expected:?}");
        }
    }

    #[test]
    fn unit_cube_mass_and_inertia() {
        let calc = MassPropertiesCalculator::new(1.0).unwrap();
        let props = calc.compute(&Mesh::unit_cube()).unwrap();
        assert!(close(props.mass, 1.0));
        assert!(close(props.volume, 1.0));
        assert!(props.center_of_mass.length() < 1e-6);
        assert_mat_close(props.inertia, Mat3::from_diagonal(Vec3::splat(1.0 / 6.0)));
    }

    #[test]
    fn density_scales_mass_and_inertia() {
        let calc = MassPropertiesCalculator::new(3.0).unwrap();
        let props = calc.compute(&Mesh::cuboid("box", Vec3::new(1.0, 0.5, 0.5))).unwrap();
        // 2 x 1 x 1 box
        assert!(close(props.mass, 6.0));
        let m = props.mass;
        let expected = Vec3::new(m * (1.0 + 1.0) / 12.0, m * (4.0 + 1.0) / 12.0, m * (4.0 + 1.0) / 12.0);
        assert_mat_close(props.inertia, Mat3::from_diagonal(expected));

        let rescaled = props.with_density(3.0, 1.0);
        assert!(close(rescaled.mass, 2.0));
    }

    #[test]
    fn scale_stretches_mass_and_inertia() {
        let calc = MassPropertiesCalculator::new(1.0).unwrap();
        let cube = calc.compute(&Mesh::unit_cube()).unwrap();

        let uniform = cube.with_scale(Vec3::splat(2.0));
        assert!(close(uniform.mass, 8.0));
        assert!(close(uniform.volume, 8.0));
        assert_mat_close(uniform.inertia, Mat3::from_diagonal(Vec3::splat(8.0 * 8.0 / 12.0)));

        // Stretching the unit cube along x matches a directly built 2 x 1 x 1 box.
        let stretched = cube.with_scale(Vec3::new(2.0, 1.0, 1.0));
        let direct = calc.compute(&Mesh::cuboid("box", Vec3::new(1.0, 0.5, 0.5))).unwrap();
        assert!(close(stretched.mass, direct.mass));
        assert_mat_close(stretched.inertia, direct.inertia);

        let mirrored = cube.with_scale(Vec3::new(-1.0, 1.0, 1.0));
        assert!(close(mirrored.mass, 1.0));
        assert_mat_close(mirrored.inertia, cube.inertia);
    }

    #[test]
    fn offset_mesh_is_shifted_to_its_center() {
        let mut mesh = Mesh::unit_cube();
        mesh.recenter(Vec3::new(-2.0, -1.0, 0.5));
        let calc = MassPropertiesCalculator::new(1.0).unwrap();
        let props = calc.compute(&mesh).unwrap();
        assert!((props.center_of_mass - Vec3::new(2.0, 1.0, -0.5)).length() < 1e-5);
        assert_mat_close(props.inertia, Mat3::from_diagonal(Vec3::splat(1.0 / 6.0)));
        assert!((props.local_aabb.min - Vec3::splat(-0.5)).length() < 1e-5);
        assert!((props.local_aabb.max - Vec3::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn tetrahedron_products_of_inertia() {
        let calc = MassPropertiesCalculator::new(1.0).unwrap();
        let props = calc.compute(&Mesh::corner_tetrahedron()).unwrap();
        assert!(close(props.volume, 1.0 / 6.0));
        assert!((props.center_of_mass - Vec3::splat(0.25)).length() < 1e-6);
        let d = 1.0 / 80.0;
        let p = 1.0 / 480.0;
        let expected = Mat3::from_cols(
            Vec3::new(d, p, p),
            Vec3::new(p, d, p),
            Vec3::new(p, p, d),
        );
        assert_mat_close(props.inertia, expected);
    }

    #[test]
    fn inverted_winding_is_accepted() {
        let cube = Mesh::unit_cube();
        let flipped: Vec<u32> = cube
            .indices()
            .chunks_exact(3)
            .flat_map(|t| [t[0], t[2], t[1]])
            .collect();
        let mesh = Mesh::new("inside_out", cube.positions().to_vec(), flipped);
        let props = MassPropertiesCalculator::new(1.0).unwrap().compute(&mesh).unwrap();
        assert!(close(props.mass, 1.0));
        assert!(close(props.inertia.x_axis.x, 1.0 / 6.0));
    }

    #[test]
    fn flat_mesh_is_degenerate() {
        let mesh = Mesh::new(
            "quad",
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![0, 1, 2, 0, 2, 3, 0, 2, 1, 0, 3, 2],
        );
        let err = MassPropertiesCalculator::new(1.0).unwrap().compute(&mesh);
        assert!(matches!(err, Err(PhysicsError::DegenerateGeometry { .. })));
    }

    #[test]
    fn malformed_meshes_are_rejected() {
        let calc = MassPropertiesCalculator::new(1.0).unwrap();
        let tri = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        assert!(matches!(calc.compute(&tri), Err(PhysicsError::InvalidMesh(_))));

        let cube = Mesh::unit_cube();
        let mut indices = cube.indices().to_vec();
        indices.push(0);
        let ragged = Mesh::new("ragged", cube.positions().to_vec(), indices);
        assert!(matches!(calc.compute(&ragged), Err(PhysicsError::InvalidMesh(_))));

        let mut indices = cube.indices().to_vec();
        indices[4] = 42;
        let out_of_range = Mesh::new("oor", cube.positions().to_vec(), indices);
        assert!(matches!(calc.compute(&out_of_range), Err(PhysicsError::InvalidMesh(_))));
    }

    #[test]
    fn non_positive_density_is_rejected() {
        assert!(MassPropertiesCalculator::new(0.0).is_err());
        assert!(MassPropertiesCalculator::new(f32::NAN).is_err());
    }

    #[test]
    fn apply_recenters_and_requests_refresh() {
        let mut mesh = Mesh::corner_tetrahedron();
        let props = MassPropertiesCalculator::new(1.0).unwrap().apply(&mut mesh).unwrap();
        assert_eq!(mesh.vertex_revision(), 1);
        let again = MassPropertiesCalculator::new(1.0).unwrap().compute(&mesh).unwrap();
        assert!(again.center_of_mass.length() < 1e-6);
        assert_mat_close(again.inertia, props.inertia);
    }
}
