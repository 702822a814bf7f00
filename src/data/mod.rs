//! Field data attached to mesh regions.

pub mod coefficients;

pub use coefficients::{CoefficientMap, DiffusionModel};
