use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Triangle mesh: vertex positions plus a flat triangle index list.
///
/// Triangles are expected to be wound counter-clockwise when seen from
/// outside. `vertex_revision` increments on every vertex mutation; renderers
/// compare it against the revision they uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    name: String,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    #[serde(default)]
    vertex_revision: u64,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            vertex_revision: 0,
        }
    }

    /// Axis-aligned box centered at the origin, 8 shared corners, 12 triangles.
    pub fn cuboid(name: impl Into<String>, half_extents: Vec3) -> Self {
        let h = half_extents;
        // Corner i has x = bit 0, y = bit 1, z = bit 2 (set bit = positive side).
        let positions = (0..8u32)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { h.x } else { -h.x },
                    if i & 2 != 0 { h.y } else { -h.y },
                    if i & 4 != 0 { h.z } else { -h.z },
                )
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1,  1, 2, 3, // -Z
            4, 5, 6,  5, 7, 6, // +Z
            0, 4, 2,  2, 4, 6, // -X
            1, 3, 5,  3, 7, 5, // +X
            0, 1, 4,  1, 5, 4, // -Y
            2, 6, 3,  3, 6, 7, // +Y
        ];
        Self::new(name, positions, indices)
    }

    pub fn unit_cube() -> Self {
        Self::cuboid("unit_cube", Vec3::splat(0.5))
    }

    /// Right-angle tetrahedron spanning the origin and the three unit axes.
    pub fn corner_tetrahedron() -> Self {
        Self::new(
            "corner_tetrahedron",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions of every complete triangle. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = self.positions.get(tri[0] as usize)?;
            let b = self.positions.get(tri[1] as usize)?;
            let c = self.positions.get(tri[2] as usize)?;
            Some([*a, *b, *c])
        })
    }

    pub fn vertex_revision(&self) -> u64 {
        self.vertex_revision
    }

    /// Mark the vertex buffer dirty so the renderer re-uploads it.
    pub fn refresh_vertex_buffer(&mut self) {
        self.vertex_revision += 1;
        tracing::debug!(
            name = %self.name,
            revision = self.vertex_revision,
            "vertex buffer refresh requested"
        );
    }

    /// Shift every vertex by `-origin` so `origin` becomes the local origin,
    /// then request a vertex-buffer refresh.
    pub fn recenter(&mut self, origin: Vec3) {
        for p in &mut self.positions {
            *p -= origin;
        }
        self.refresh_vertex_buffer();
    }
}
