//! Geometry of axis-aligned entities.
//!
//! This module provides the per-direction [`GeometryCache`] used by every
//! level of a grid.

pub mod cache;

pub use cache::{GeometryCache, JacobianInverseTransposed, JacobianTransposed};
