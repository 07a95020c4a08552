//! Shared identifiers and the spatial transform used across the engine.

mod types;

pub use types::{EntityId, MeshHandle, Transform};
