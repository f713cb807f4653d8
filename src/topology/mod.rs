//! Structured-mesh topology.
//!
//! This module provides the value types everything else is built on:
//! - [`MultiIndex`]: dyadic entity coordinates
//! - [`Direction`]: orientation bitmasks of axis-aligned entities
//! - [`Mesh`]: half-open boxes of cells
//! - [`Refinement`]: per-level refinement factors and father/child arithmetic

pub mod direction;
pub mod mesh;
pub mod multi_index;
pub mod refinement;

pub use direction::Direction;
pub use mesh::Mesh;
pub use multi_index::MultiIndex;
pub use refinement::{Refinement, RefinementPolicy};
