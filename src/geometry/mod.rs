//! Geometry for mimetic-sieve.
//!
//! - [`point`]: 2D/3D points and vectors
//! - [`cell_geometry`]: elementary kernels (lengths, tets, hexes, quads)
//! - [`metrics`]: general polygon and polyhedron measures
//! - [`region`]: named regions and the shared geometric model

pub mod cell_geometry;
pub mod metrics;
pub mod point;
pub mod region;

pub use point::Point;
pub use region::{GeometricModel, Region, RegionKind};
