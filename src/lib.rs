#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mimetic-sieve
//!
//! mimetic-sieve is the mesh and local-discretization core of a subsurface-flow
//! code. It provides a polymorphic mesh query layer, geometry kernels, Taylor
//! polynomial algebra with exact cell and face quadrature, and the local
//! matrix builders of the discontinuous Galerkin (modal) and mimetic finite
//! difference methods, plus a flux-based upwind selector.
//!
//! ## Features
//! - One [`Mesh`](crate::mesh::Mesh) type over unstructured, structured and
//!   surface-cell backends, with consistent face orientation and named sets
//! - Geometry kernels for triangles, quadrilaterals, tetrahedra and hexahedra
//! - Taylor polynomials, per-cell integral caches and normalized bases
//! - `DgModal` mass, stiffness, advection, flux, jump and penalty matrices
//! - `Mfd3dDiffusion` consistency/stability mass and stiffness matrices
//! - `UpwindMfd` face upwinding over a pluggable [`Communicator`]
//!
//! ## Logging
//!
//! Components take a [`VerboseObject`](crate::verbose::VerboseObject) in their
//! constructors and forward to the `log` facade; install any `log` backend to
//! see the output.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mimetic-sieve = "0.3"
//! # features = ["rayon"]
//! ```
//!
//! Local matrix builders return `Result<DenseMatrix, MeshError>`; callers
//! that work with integer status codes use
//! [`status_of`](crate::mesh_error::status_of).
//!
//! [`Communicator`]: crate::algs::communicator::Communicator

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod discretization;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod topology;
pub mod verbose;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm};
    pub use crate::algs::upwind::{BcModel, UpwindMfd, UpwindModel, UpwindOptions};
    pub use crate::data::coefficients::{CoefficientMap, DiffusionModel};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::discretization::{
        Basis, BasisKind, DenseMatrix, DenseVector, DgModal, DgOptions, Mfd3dDiffusion, MfdOptions,
        NumericalIntegration, Polynomial, StabilityMethod, Tensor, VectorPolynomial,
    };
    pub use crate::geometry::{GeometricModel, Point, Region, RegionKind};
    pub use crate::mesh::{
        Mesh, MeshBackend, MeshFramework, StructuredMesh, StructuredMeshOptions, SurfaceCellMesh,
        UnstructuredMesh,
    };
    pub use crate::mesh_error::{MeshError, status_of};
    pub use crate::topology::{CellType, EntityId, EntityKind, ParallelType};
    pub use crate::verbose::{VerboseObject, Verbosity};
}
