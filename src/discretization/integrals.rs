//! Per-cell integrals of natural monomials.
//!
//! The cache is an arena indexed by cell id. Each entry only ever grows: a
//! request for a lower order than already computed is a no-op.

use crate::discretization::numerical_integration::NumericalIntegration;
use crate::discretization::polynomial::Polynomial;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use parking_lot::{RwLock, RwLockReadGuard};

/// Integrals over one cell of the natural monomials of degree `<= order`.
#[derive(Clone, Debug, PartialEq)]
pub struct CellIntegrals {
    poly: Polynomial,
}

impl CellIntegrals {
    /// Order 0 only: the cell volume.
    pub fn new(mesh: &Mesh, c: EntityId) -> Result<Self, MeshError> {
        let mut poly = Polynomial::new(mesh.space_dimension(), 0);
        poly[(0, 0)] = mesh.cell_volume(c)?;
        Ok(Self { poly })
    }

    pub fn order(&self) -> usize {
        self.poly.order()
    }

    pub fn volume(&self) -> f64 {
        self.poly[(0, 0)]
    }

    /// Integral of the monomial at `pos` in the degree-`degree` block.
    #[inline]
    pub fn get(&self, degree: usize, pos: usize) -> f64 {
        self.poly[(degree, pos)]
    }

    pub fn poly(&self) -> &Polynomial {
        &self.poly
    }

    /// Extend to `order`, computing only the missing degrees.
    pub fn update(&mut self, numi: &NumericalIntegration, c: EntityId, order: usize) -> Result<(), MeshError> {
        let k0 = self.poly.order();
        if k0 >= order {
            return Ok(());
        }
        self.poly.reshape(order);
        for k in k0 + 1..=order {
            numi.integrate_monomials_cell(c, k, &mut self.poly)?;
        }
        Ok(())
    }
}

/// Arena of [`CellIntegrals`], one lock per cell.
#[derive(Debug)]
pub struct IntegralCache {
    cells: Vec<RwLock<CellIntegrals>>,
}

impl IntegralCache {
    pub fn new(mesh: &Mesh) -> Result<Self, MeshError> {
        let cells = mesh
            .entity_ids(EntityKind::Cell, ParallelType::Used)
            .map(|c| CellIntegrals::new(mesh, c).map(RwLock::new))
            .collect::<Result<_, _>>()?;
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn slot(&self, c: EntityId) -> Result<&RwLock<CellIntegrals>, MeshError> {
        self.cells.get(c).ok_or(MeshError::InvalidEntityId {
            kind: EntityKind::Cell,
            id: c,
            count: self.cells.len(),
        })
    }

    /// Make sure the integrals of cell `c` reach at least `order`.
    pub fn ensure(&self, numi: &NumericalIntegration, c: EntityId, order: usize) -> Result<(), MeshError> {
        let slot = self.slot(c)?;
        if slot.read().order() >= order {
            return Ok(());
        }
        let mut guard = slot.write();
        // another writer may have extended it meanwhile
        guard.update(numi, c, order)
    }

    /// Extend to `order` and return a read guard.
    pub fn get(
        &self,
        numi: &NumericalIntegration,
        c: EntityId,
        order: usize,
    ) -> Result<RwLockReadGuard<'_, CellIntegrals>, MeshError> {
        self.ensure(numi, c, order)?;
        Ok(self.slot(c)?.read())
    }

    /// Order computed so far for cell `c`.
    pub fn order(&self, c: EntityId) -> Result<usize, MeshError> {
        Ok(self.slot(c)?.read().order())
    }

    pub fn snapshot(&self, c: EntityId) -> Result<CellIntegrals, MeshError> {
        Ok(self.slot(c)?.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::region::GeometricModel;
    use crate::mesh::{StructuredMesh, StructuredMeshOptions};
    use crate::verbose::VerboseObject;
    use std::sync::Arc;

    #[test]
    fn cache_grows_monotonically() {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 2, 2);
        let mesh = Arc::new(
            Mesh::new(
                StructuredMesh::new(&opts).unwrap(),
                Arc::new(GeometricModel::default()),
                VerboseObject::silent("test"),
            )
            .unwrap(),
        );
        let numi = NumericalIntegration::new(Arc::clone(&mesh));
        let cache = IntegralCache::new(&mesh).unwrap();
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.order(1).unwrap(), 0);
        assert!((cache.snapshot(1).unwrap().volume() - 0.25).abs() < 1e-15);

        cache.ensure(&numi, 1, 4).unwrap();
        let at4 = cache.snapshot(1).unwrap();
        cache.ensure(&numi, 1, 2).unwrap();
        assert_eq!(cache.snapshot(1).unwrap(), at4);
        assert_eq!(cache.order(0).unwrap(), 0);
        assert!(cache.ensure(&numi, 9, 1).is_err());
    }
}
