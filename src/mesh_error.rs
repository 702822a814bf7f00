//! MeshError: Unified error type for mimetic-sieve public APIs
//!
//! Every fallible query or local-matrix builder returns this error. The
//! surrounding global assembler works with integer status codes, so each
//! variant also maps onto one via [`MeshError::status_code`].

use crate::topology::entity::EntityKind;
use thiserror::Error;

/// Status returned for a successfully assembled elemental matrix.
pub const ELEMENTAL_MATRIX_OK: i32 = 0;
/// Status for a violated precondition (wrong size, uninitialized basis).
pub const ELEMENTAL_MATRIX_PRECONDITION: i32 = 1;
/// Status for any other failure (degenerate geometry, singular tensor, ...).
pub const ELEMENTAL_MATRIX_FAILED: i32 = 2;

/// Unified error type for mesh and discretization operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// Entity id is outside the range of the requested kind.
    #[error("invalid {kind:?} id {id} (mesh has {count})")]
    InvalidEntityId {
        kind: EntityKind,
        id: usize,
        count: usize,
    },
    /// The backend does not implement the requested capability.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// Adjacency tables are inconsistent.
    #[error("topology error: {0}")]
    InvalidTopology(String),
    /// Geometry could not be evaluated (bad vertex count, zero normal, ...).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A cell has zero or negative measure.
    #[error("degenerate cell {cell}: volume {volume}")]
    DegenerateCell { cell: usize, volume: f64 },
    /// Matrix or tensor inversion failed.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),
    /// Caller supplied an array with the wrong shape.
    #[error("size mismatch for {what}: expected {expected}, found {found}")]
    MatrixSizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Basis was requested for a cell it was never built for.
    #[error("basis is not initialized for cell {0}")]
    BasisNotInitialized(usize),
    /// Generic precondition violation.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
    /// Region definition is internally inconsistent.
    #[error("malformed region `{name}`: {reason}")]
    MalformedRegion { name: String, reason: String },
    /// Region name is not part of the geometric model.
    #[error("unknown region `{0}`")]
    UnknownRegion(String),
    /// A required physical coefficient was not supplied for a cell.
    #[error("missing coefficient `{field}` for cell {cell}")]
    MissingCoefficient { field: String, cell: usize },
    /// Invalid option values.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MeshError {
    /// Integer status reported to callers that work with status codes.
    pub fn status_code(&self) -> i32 {
        match self {
            MeshError::MatrixSizeMismatch { .. }
            | MeshError::BasisNotInitialized(_)
            | MeshError::PreconditionViolated(_) => ELEMENTAL_MATRIX_PRECONDITION,
            _ => ELEMENTAL_MATRIX_FAILED,
        }
    }

    /// True for configuration errors that must abort the run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MeshError::MissingCoefficient { .. }
                | MeshError::MalformedRegion { .. }
                | MeshError::UnknownRegion(_)
                | MeshError::Configuration(_)
        )
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        MeshError::UnsupportedOperation(what.into())
    }
}

/// Convert a builder result into the integer status expected by assemblers.
pub fn status_of<T>(result: &Result<T, MeshError>) -> i32 {
    match result {
        Ok(_) => ELEMENTAL_MATRIX_OK,
        Err(e) => e.status_code(),
    }
}
