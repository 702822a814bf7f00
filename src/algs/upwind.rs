//! Flux-based upwinding of a cell field onto faces.
//!
//! [`UpwindMfd::compute`] takes a face flux (sign relative to each face's
//! natural normal) and a cell-centered field and returns one value per used
//! face. Faces whose flux magnitude is at most the relative tolerance are
//! centered; otherwise the upwind cell's value is taken, or a boundary value
//! on inflow Dirichlet faces.

use crate::algs::communicator::Communicator;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use crate::verbose::{VerboseObject, Verbosity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default relative flux tolerance.
pub const OPERATOR_UPWIND_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Boundary condition type attached to a face.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BcModel {
    /// Interior face, or no condition.
    #[default]
    None,
    Dirichlet,
    Neumann,
    Mixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpwindOptions {
    /// Relative to the largest flux magnitude on the mesh.
    pub tolerance: f64,
    pub order: usize,
    pub verbosity: Verbosity,
}

impl Default for UpwindOptions {
    fn default() -> Self {
        Self {
            tolerance: OPERATOR_UPWIND_RELATIVE_TOLERANCE,
            order: 1,
            verbosity: Verbosity::Low,
        }
    }
}

/// Evaluates the upwinded quantity from a boundary datum.
pub trait UpwindModel: Send + Sync {
    fn value(&self, c: EntityId, bc_value: f64) -> f64;
}

impl<F> UpwindModel for F
where
    F: Fn(EntityId, f64) -> f64 + Send + Sync,
{
    fn value(&self, c: EntityId, bc_value: f64) -> f64 {
        self(c, bc_value)
    }
}

pub struct UpwindMfd<M: UpwindModel> {
    mesh: Arc<Mesh>,
    model: M,
    tolerance: f64,
    order: usize,
    vo: VerboseObject,
}

impl<M: UpwindModel> UpwindMfd<M> {
    pub fn new(mesh: Arc<Mesh>, model: M, options: UpwindOptions, vo: VerboseObject) -> Result<Self, MeshError> {
        if !(options.tolerance >= 0.0 && options.tolerance.is_finite()) {
            return Err(MeshError::Configuration(format!(
                "upwind tolerance must be a non-negative number, got {}",
                options.tolerance
            )));
        }
        if options.order != 1 {
            return Err(MeshError::Configuration(format!(
                "upwind order {} is not available, only first order is",
                options.order
            )));
        }
        Ok(Self {
            mesh,
            model,
            tolerance: options.tolerance,
            order: options.order,
            vo,
        })
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Upwind `field` (one value per used cell) onto the used faces.
    ///
    /// `flux`, `bc_model` and `bc_value` hold one entry per used face. Ghost
    /// entries of `field` and `flux` are refreshed through `comm` before the
    /// sweep. Inflow faces without a boundary condition on the mesh
    /// boundary are left at zero.
    pub fn compute<C: Communicator + ?Sized>(
        &self,
        flux: &[f64],
        bc_model: &[BcModel],
        bc_value: &[f64],
        field: &[f64],
        comm: &C,
    ) -> Result<Vec<f64>, MeshError> {
        let nfaces = self.mesh.num_entities(EntityKind::Face, ParallelType::Used);
        let ncells = self.mesh.num_entities(EntityKind::Cell, ParallelType::Used);
        check_len("flux", nfaces, flux.len())?;
        check_len("bc_model", nfaces, bc_model.len())?;
        check_len("bc_value", nfaces, bc_value.len())?;
        check_len("field", ncells, field.len())?;

        let mut u = flux.to_vec();
        let mut fcells = field.to_vec();
        comm.scatter_to_ghosts(EntityKind::Cell, &mut fcells);
        comm.scatter_to_ghosts(EntityKind::Face, &mut u);

        let local_max = self
            .mesh
            .entity_ids(EntityKind::Face, ParallelType::Owned)
            .map(|f| u[f].abs())
            .fold(0.0, f64::max);
        let tol = self.tolerance * comm.max_all(local_max);
        self.vo.debug(format_args!("upwind: {nfaces} faces, flux tolerance {tol:e}"));

        let mut upw = vec![0.0; nfaces];
        for c in 0..ncells {
            let (faces, dirs) = self.mesh.cell_get_faces_and_dirs(c)?;
            let kc = fcells[c];
            for (&f, &dir) in faces.iter().zip(dirs) {
                let inflow = u[f] * f64::from(dir) <= -tol;
                match bc_model[f] {
                    BcModel::None if u[f].abs() <= tol => {
                        let cells = self.mesh.face_get_cells(f, ParallelType::Used)?;
                        let sum: f64 = cells.iter().map(|&c2| fcells[c2]).sum();
                        upw[f] = sum / cells.len() as f64;
                    }
                    BcModel::Dirichlet if inflow => {
                        upw[f] = self.model.value(c, bc_value[f]);
                    }
                    BcModel::Neumann | BcModel::Mixed if inflow => {
                        upw[f] = kc;
                    }
                    _ if !inflow => {
                        upw[f] = kc;
                    }
                    _ => {}
                }
            }
        }
        Ok(upw)
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), MeshError> {
    if expected != found {
        return Err(MeshError::MatrixSizeMismatch { what, expected, found });
    }
    Ok(())
}
