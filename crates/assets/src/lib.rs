//! Mesh resources: content-addressed registry, primitive builders, OBJ import.
//!
//! Meshes are identified by a hash of their content at registration time.
//! Consumers hold `MeshHandle`s, never raw vertex buffers.
//!
//! # Invariants
//! - Every vertex mutation bumps the mesh's vertex revision so the renderer
//!   re-uploads the buffer.

mod mesh;
mod obj;

pub use mesh::Mesh;

use glam::Vec3;
use impact_common::MeshHandle;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh not found: {0:?}")]
    NotFound(MeshHandle),
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("invalid OBJ mesh: {0}")]
    InvalidObj(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Content-addressed mesh registry.
///
/// Registering identical content twice yields the same handle and keeps a
/// single copy. The registry can be persisted to disk as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshStore {
    meshes: BTreeMap<MeshHandle, Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its handle.
    pub fn register(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = content_hash(&mesh);
        if self.meshes.contains_key(&handle) {
            tracing::debug!(?handle, name = %mesh.name(), "mesh already registered");
        } else {
            self.meshes.insert(handle, mesh);
        }
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(&handle)
    }

    /// Like `get`, but an absent handle is an error.
    pub fn require(&self, handle: MeshHandle) -> Result<&Mesh, AssetError> {
        self.get(handle).ok_or(AssetError::NotFound(handle))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = MeshHandle> + '_ {
        self.meshes.keys().copied()
    }

    /// Register an axis-aligned box centered at the origin.
    pub fn register_cuboid(&mut self, half_extents: Vec3) -> MeshHandle {
        self.register(Mesh::cuboid("cuboid", half_extents))
    }

    /// Register the unit cube (side 1, centered at the origin).
    pub fn register_unit_cube(&mut self) -> MeshHandle {
        self.register(Mesh::unit_cube())
    }

    /// Import a Wavefront OBJ file as a single mesh named after the file stem.
    pub fn import_obj(&mut self, path: impl AsRef<Path>) -> Result<MeshHandle, AssetError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("obj")
            .to_string();
        let mesh = obj::parse(&name, &source)?;
        tracing::info!(
            name = %name,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "imported OBJ mesh"
        );
        Ok(self.register(mesh))
    }

    /// Save the mesh registry to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a mesh registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let store: Self = serde_json::from_reader(file)?;
        Ok(store)
    }
}

fn content_hash(mesh: &Mesh) -> MeshHandle {
    let mut hasher = Sha256::new();
    hasher.update(mesh.name().as_bytes());
    for p in mesh.positions() {
        for c in p.to_array() {
            hasher.update(c.to_le_bytes());
        }
    }
    for i in mesh.indices() {
        hasher.update(i.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    MeshHandle(u64::from_le_bytes(bytes))
}
