//! Developer tooling: read-only physics inspection for overlays and the CLI.
//!
//! # Invariants
//! - Inspectors never mutate simulation state.

mod inspector;

pub use inspector::{BodyInfo, PhysicsInspector, PhysicsSummary};
