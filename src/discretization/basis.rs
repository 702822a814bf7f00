//! Taylor bases of a cell.
//!
//! Local matrices are first assembled in the natural monomials
//! `m_a = ((x - x_c)/h)^a`, `h = |c|^(1/d)`. A basis function is
//! `phi_a = s_a (m_a - t_a)` with a scale `s_a` and a shift `t_a` (nonzero
//! only for the orthogonalised variant), so a matrix or functional moves to
//! the basis by `R^T A R` with
//!
//! ```text
//! R[a][a] = s_a,   R[0][a] = -s_a t_a   (a > 0)
//! ```
//!
//! The constant monomial always has `s = 1, t = 0`.

use crate::discretization::dense::{DenseMatrix, DenseVector};
use crate::discretization::integrals::CellIntegrals;
use crate::discretization::numerical_integration::NumericalIntegration;
use crate::discretization::polynomial::{monomial_set_position, polynomial_space_size, MonomialIter, Polynomial};
use crate::geometry::point::Point;
use crate::mesh_error::MeshError;
use crate::topology::entity::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisKind {
    /// Plain monomials `(x - x_c)^a`.
    #[serde(rename = "regular")]
    Regular,
    /// Monomials scaled to `||phi||^2 = |c|`.
    #[default]
    #[serde(rename = "normalized")]
    Normalized,
    /// Normalized and orthogonal to constants.
    #[serde(rename = "orthonormalized")]
    NormalizedOrtho,
}

impl BasisKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "regular" => Some(Self::Regular),
            "normalized" => Some(Self::Normalized),
            "orthonormalized" => Some(Self::NormalizedOrtho),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Normalized => "normalized",
            Self::NormalizedOrtho => "orthonormalized",
        }
    }
}

/// Basis of one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Basis {
    kind: BasisKind,
    cell: EntityId,
    d: usize,
    order: usize,
    centroid: Point,
    /// Natural scale `h^(-k)` per degree `k`.
    natural: Vec<f64>,
    /// `s_a`, by global monomial position.
    scale: Vec<f64>,
    /// `t_a`, by global monomial position.
    shift: Vec<f64>,
}

impl Basis {
    /// Build the basis of cell `c`. `integrals` must reach order `2 * order`.
    pub fn init(
        kind: BasisKind,
        numi: &NumericalIntegration,
        integrals: &CellIntegrals,
        c: EntityId,
        order: usize,
    ) -> Result<Self, MeshError> {
        if integrals.order() < 2 * order {
            return Err(MeshError::PreconditionViolated(format!(
                "basis of order {order} for cell {c} needs integrals of order {}, have {}",
                2 * order,
                integrals.order()
            )));
        }
        let mesh = numi.mesh();
        let d = mesh.space_dimension();
        let natural = (0..=order)
            .map(|k| numi.monomial_natural_scales(c, k))
            .collect::<Result<Vec<_>, _>>()?;
        let mut basis = Self {
            kind,
            cell: c,
            d,
            order,
            centroid: mesh.cell_centroid(c)?,
            natural,
            scale: vec![1.0; polynomial_space_size(d, order)],
            shift: vec![0.0; polynomial_space_size(d, order)],
        };
        basis.update_scales(integrals)?;
        Ok(basis)
    }

    fn update_scales(&mut self, integrals: &CellIntegrals) -> Result<(), MeshError> {
        let volume = integrals.volume();
        for m in MonomialIter::new(self.d, self.order) {
            if m.degree == 0 {
                continue;
            }
            let (a, b) = match self.kind {
                BasisKind::Regular => (1.0 / self.natural[m.degree], 0.0),
                BasisKind::Normalized | BasisKind::NormalizedOrtho => {
                    let b = if self.kind == BasisKind::NormalizedOrtho {
                        integrals.get(m.degree, m.position) / volume
                    } else {
                        0.0
                    };
                    let sq = m.multi_index.map(|i| 2 * i);
                    let norm = integrals.get(2 * m.degree, monomial_set_position(self.d, &sq)) - b * b * volume;
                    if !(norm > 0.0) {
                        return Err(MeshError::DegenerateCell {
                            cell: self.cell,
                            volume,
                        });
                    }
                    ((volume / norm).sqrt(), b)
                }
            };
            self.scale[m.global] = a;
            self.shift[m.global] = b;
        }
        Ok(())
    }

    pub fn kind(&self) -> BasisKind {
        self.kind
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cell(&self) -> EntityId {
        self.cell
    }

    /// Number of basis functions.
    pub fn size(&self) -> usize {
        self.scale.len()
    }

    pub fn scales(&self) -> &[f64] {
        &self.scale
    }

    pub fn shifts(&self) -> &[f64] {
        &self.shift
    }

    fn check_size(&self, what: &'static str, found: usize, expected: usize) -> Result<(), MeshError> {
        if found != expected {
            return Err(MeshError::MatrixSizeMismatch { what, expected, found });
        }
        Ok(())
    }

    /// `A <- R^T A R`.
    pub fn change_basis_matrix(&self, a: &mut DenseMatrix) -> Result<(), MeshError> {
        let n = self.size();
        self.check_size("basis change rows", a.nrows(), n)?;
        self.check_size("basis change columns", a.ncols(), n)?;
        transform_blocks(&[self], a);
        Ok(())
    }

    /// `v <- R^T v` for a functional (right-hand side) vector.
    pub fn change_basis_vector(&self, v: &mut DenseVector) -> Result<(), MeshError> {
        self.check_size("basis change vector", v.len(), self.size())?;
        let v0 = v[0];
        for j in 1..self.size() {
            v[j] = self.scale[j] * (v[j] - self.shift[j] * v0);
        }
        Ok(())
    }

    /// Two-cell face matrix: rows and columns `0..n` belong to `left`,
    /// `n..2n` to `right`.
    pub fn change_basis_matrix_pair(left: &Basis, right: &Basis, a: &mut DenseMatrix) -> Result<(), MeshError> {
        let n = left.size() + right.size();
        left.check_size("paired basis change rows", a.nrows(), n)?;
        left.check_size("paired basis change columns", a.ncols(), n)?;
        transform_blocks(&[left, right], a);
        Ok(())
    }

    /// Polynomial (about the cell centroid, regular monomials) with the
    /// given coefficients in this basis.
    pub fn calculate_polynomial(&self, coefs: &[f64]) -> Result<Polynomial, MeshError> {
        self.check_size("basis coefficients", coefs.len(), self.size())?;
        let mut p = Polynomial::new(self.d, self.order);
        p.set_origin(self.centroid);
        let mut constant = 0.0;
        for m in MonomialIter::new(self.d, self.order) {
            let c = coefs[m.global] * self.scale[m.global];
            p[(m.degree, m.position)] += c * self.natural[m.degree];
            constant -= c * self.shift[m.global];
        }
        p[(0, 0)] += constant;
        Ok(p)
    }
}

/// `A <- diag(R_0, R_1, ..)^T A diag(R_0, R_1, ..)`.
fn transform_blocks(bases: &[&Basis], a: &mut DenseMatrix) {
    let (nr, nc) = a.shape();
    let mut offset = 0;
    for b in bases {
        for j in 1..b.size() {
            let (s, t) = (b.scale[j], b.shift[j]);
            for i in 0..nr {
                let v = a[(i, offset + j)] - t * a[(i, offset)];
                a[(i, offset + j)] = s * v;
            }
        }
        offset += b.size();
    }
    let mut offset = 0;
    for b in bases {
        for i in 1..b.size() {
            let (s, t) = (b.scale[i], b.shift[i]);
            for j in 0..nc {
                let v = a[(offset + i, j)] - t * a[(offset, j)];
                a[(offset + i, j)] = s * v;
            }
        }
        offset += b.size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::integrals::IntegralCache;
    use crate::geometry::region::GeometricModel;
    use crate::mesh::{Mesh, StructuredMesh, StructuredMeshOptions};
    use crate::verbose::VerboseObject;
    use std::sync::Arc;

    fn setup() -> (NumericalIntegration, IntegralCache) {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [2.0, 1.0], 1, 1);
        let mesh = Arc::new(
            Mesh::new(
                StructuredMesh::new(&opts).unwrap(),
                Arc::new(GeometricModel::default()),
                VerboseObject::silent("test"),
            )
            .unwrap(),
        );
        let cache = IntegralCache::new(&mesh).unwrap();
        (NumericalIntegration::new(mesh), cache)
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!(BasisKind::from_name("orthonormalized"), Some(BasisKind::NormalizedOrtho));
        assert_eq!(BasisKind::from_name("taylor"), None);
        let k: BasisKind = serde_json::from_str("\"regular\"").unwrap();
        assert_eq!(k, BasisKind::Regular);
    }

    #[test]
    fn init_requires_enough_integrals() {
        let (numi, cache) = setup();
        let ints = cache.snapshot(0).unwrap();
        assert!(matches!(
            Basis::init(BasisKind::Normalized, &numi, &ints, 0, 1),
            Err(MeshError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn calculate_polynomial_inverts_the_scaling() {
        let (numi, cache) = setup();
        for kind in [BasisKind::Regular, BasisKind::Normalized, BasisKind::NormalizedOrtho] {
            let ints = cache.get(&numi, 0, 4).unwrap();
            let basis = Basis::init(kind, &numi, &ints, 0, 2).unwrap();
            let coefs = [0.5, 1.0, -2.0, 0.25, 0.0, 3.0];
            let p = basis.calculate_polynomial(&coefs).unwrap();

            // phi_a = s_a (m_a - t_a) evaluated directly
            let x = Point::new2(0.3, 0.9);
            let xc = Point::new2(1.0, 0.5);
            let h = 2.0_f64.sqrt();
            let expected: f64 = MonomialIter::new(2, 2)
                .map(|m| {
                    let mono = ((x[0] - xc[0]) / h).powi(m.multi_index[0] as i32)
                        * ((x[1] - xc[1]) / h).powi(m.multi_index[1] as i32);
                    coefs[m.global] * basis.scales()[m.global] * (mono - basis.shifts()[m.global])
                })
                .sum();
            assert!((p.value(&x) - expected).abs() < 1e-12, "{kind:?}");
        }
    }

    #[test]
    fn regular_basis_undoes_natural_scaling() {
        let (numi, cache) = setup();
        let ints = cache.get(&numi, 0, 2).unwrap();
        let basis = Basis::init(BasisKind::Regular, &numi, &ints, 0, 1).unwrap();
        let mut a = DenseMatrix::identity(3);
        basis.change_basis_matrix(&mut a).unwrap();
        assert!((a[(1, 1)] - 2.0).abs() < 1e-14);
        assert_eq!(a[(0, 0)], 1.0);
        let mut bad = DenseMatrix::identity(2);
        assert!(basis.change_basis_matrix(&mut bad).is_err());
    }
}
