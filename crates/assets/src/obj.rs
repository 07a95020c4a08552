//! Wavefront OBJ import through `tobj`.
//!
//! Polygons are triangulated on load and every object/group in the file is
//! merged into one mesh. Materials, normals and texture coordinates are
//! ignored; collision only needs positions and triangles.

use crate::{AssetError, Mesh};
use glam::Vec3;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Parse OBJ source text into a mesh called `name`.
pub(crate) fn parse(name: &str, source: &str) -> Result<Mesh, AssetError> {
    let mut reader = source.as_bytes();
    // Material libraries are never resolved.
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))?;

    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        if mesh.positions.len() % 3 != 0 {
            return Err(AssetError::InvalidObj(format!(
                "object '{}' has a truncated position buffer",
                model.name
            )));
        }
        let base = positions.len() as u32;
        let count = (mesh.positions.len() / 3) as u32;
        for &index in &mesh.indices {
            if index >= count {
                return Err(AssetError::InvalidObj(format!(
                    "object '{}' references vertex {} of {}",
                    model.name,
                    index + 1,
                    count
                )));
            }
            indices.push(base + index);
        }
        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
    }

    if indices.is_empty() {
        return Err(AssetError::InvalidObj(format!("'{name}' has no faces")));
    }
    if indices.len() % 3 != 0 {
        return Err(AssetError::InvalidObj(format!(
            "'{name}' has {} indices, not a triangle list",
            indices.len()
        )));
    }
    tracing::debug!(name, objects = models.len(), "OBJ objects merged");
    Ok(Mesh::new(name, positions, indices))
}
