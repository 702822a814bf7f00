//! Physical coefficients keyed by mesh regions.
//!
//! A [`CoefficientMap`] holds an ordered list of `(region, tensor)`
//! assignments for one named field. Resolving it on a mesh produces one
//! tensor per used cell; when regions overlap the assignment added last
//! wins. A cell that no region covers is a configuration error, never a
//! silent default.
//!
//! [`DiffusionModel`] is the named-value table for molecular diffusion,
//! where a zero default for unlisted components is the documented behavior.

use crate::discretization::tensor::Tensor;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityKind, ParallelType};
use serde::{Deserialize, Serialize};

/// Region-keyed tensor field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientMap {
    field: String,
    assignments: Vec<(String, Tensor)>,
}

impl CoefficientMap {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            assignments: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Assign `tensor` on `region`. Later assignments override earlier ones
    /// on cells both regions contain.
    pub fn set(&mut self, region: impl Into<String>, tensor: Tensor) -> &mut Self {
        self.assignments.push((region.into(), tensor));
        self
    }

    pub fn with(mut self, region: impl Into<String>, tensor: Tensor) -> Self {
        self.set(region, tensor);
        self
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(r, _)| r.as_str())
    }

    /// One tensor per used cell of `mesh`.
    pub fn cell_tensors(&self, mesh: &Mesh) -> Result<Vec<Tensor>, MeshError> {
        let ncells = mesh.num_entities(EntityKind::Cell, ParallelType::Used);
        let d = mesh.space_dimension();
        let mut out: Vec<Option<Tensor>> = vec![None; ncells];
        for (region, tensor) in &self.assignments {
            if tensor.dimension() != d {
                return Err(MeshError::Configuration(format!(
                    "`{}` on region `{region}`: {}D tensor on a {d}D mesh",
                    self.field,
                    tensor.dimension()
                )));
            }
            for c in mesh.get_set_entities(region, EntityKind::Cell, ParallelType::Used)? {
                out[c] = Some(tensor.clone());
            }
        }
        out.into_iter()
            .enumerate()
            .map(|(cell, t)| {
                t.ok_or_else(|| MeshError::MissingCoefficient {
                    field: self.field.clone(),
                    cell,
                })
            })
            .collect()
    }
}

/// Molecular diffusion coefficients by component name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusionModel {
    names: Vec<String>,
    values: Vec<f64>,
}

impl DiffusionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.names.iter().position(|n| *n == name) {
            Some(i) => self.values[i] = value,
            None => {
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn find_diffusion_value(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Value for `name`, zero if the component is not listed.
    pub fn diffusion_or_zero(&self, name: &str) -> f64 {
        self.find_diffusion_value(name).unwrap_or_else(|| {
            log::debug!("no molecular diffusion for `{name}`, using 0");
            0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffusion_lookup() {
        let mut dm = DiffusionModel::new();
        dm.insert("tracer", 1e-9);
        dm.insert("salt", 2e-9);
        dm.insert("tracer", 3e-9);
        assert_eq!(dm.names().len(), 2);
        assert_eq!(dm.find_diffusion_value("tracer"), Some(3e-9));
        assert_eq!(dm.find_diffusion_value("oxygen"), None);
        assert_eq!(dm.diffusion_or_zero("oxygen"), 0.0);
    }

    #[test]
    fn builder_keeps_order() {
        let map = CoefficientMap::new("permeability")
            .with("all", Tensor::scalar(2, 1.0))
            .with("lens", Tensor::scalar(2, 0.1));
        assert_eq!(map.regions().collect::<Vec<_>>(), vec!["all", "lens"]);
        assert_eq!(map.field(), "permeability");
    }
}
