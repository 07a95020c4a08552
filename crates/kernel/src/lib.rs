//! World Kernel: authoritative entity transforms and the fixed-step clock.
//!
//! # Invariants
//! - All transform mutations flow through explicit operations.
//! - Iteration order over entities is deterministic.

pub mod clock;
pub mod world;

pub use clock::FixedTimestep;
pub use world::{Node, World};
