//! Local discretization: dense algebra, Taylor polynomials, quadrature,
//! cell bases and the DG / MFD local matrix builders.

pub mod basis;
pub mod dense;
pub mod dg_modal;
pub mod integrals;
pub mod mfd3d;
pub mod numerical_integration;
pub mod options;
pub mod polynomial;
pub mod quadrature;
pub mod tensor;
pub mod vector_polynomial;

pub use basis::{Basis, BasisKind};
pub use dense::{DenseMatrix, DenseVector};
pub use dg_modal::DgModal;
pub use integrals::{CellIntegrals, IntegralCache};
pub use mfd3d::Mfd3dDiffusion;
pub use numerical_integration::NumericalIntegration;
pub use options::{DgOptions, MfdOptions, StabilityMethod};
pub use polynomial::{monomial_set_position, monomial_set_size, polynomial_space_size, Polynomial};
pub use tensor::Tensor;
pub use vector_polynomial::VectorPolynomial;
