//! Mesh-wide algorithms: reductions and ghost exchange, flux upwinding.

pub mod communicator;
pub mod upwind;

pub use communicator::{Communicator, LocalGhostComm, NoComm};
pub use upwind::{BcModel, UpwindMfd, UpwindModel, UpwindOptions};
