//! Local matrices of the modal discontinuous Galerkin method.
//!
//! Every builder assembles in the natural monomials of the cell(s) involved
//! and finishes with the basis change of [`Basis`]: a single one for cell
//! matrices and one-cell faces, a paired one for interior faces. Face
//! matrices of interior faces are `2n x 2n` with the block of the first
//! cell of [`Mesh::face_get_cells`] first.

use crate::discretization::basis::Basis;
use crate::discretization::dense::DenseMatrix;
use crate::discretization::integrals::{CellIntegrals, IntegralCache};
use crate::discretization::numerical_integration::{integrate_polynomials_triangle, NumericalIntegration};
use crate::discretization::options::DgOptions;
use crate::discretization::polynomial::{monomial_set_position, polynomial_space_size, MonomialIndex, MonomialIter, Polynomial};
use crate::discretization::tensor::Tensor;
use crate::discretization::vector_polynomial::VectorPolynomial;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use crate::verbose::VerboseObject;
use std::sync::Arc;

#[derive(Debug)]
pub struct DgModal {
    mesh: Arc<Mesh>,
    numi: NumericalIntegration,
    order: usize,
    d: usize,
    basis: Vec<Basis>,
    integrals: IntegralCache,
    vo: VerboseObject,
}

static_assertions::assert_impl_all!(DgModal: Send, Sync);

#[inline]
fn sum_index(a: &[usize; 3], b: &[usize; 3]) -> [usize; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

impl DgModal {
    /// Build the bases of all used cells.
    pub fn new(mesh: Arc<Mesh>, options: &DgOptions, vo: VerboseObject) -> Result<Self, MeshError> {
        let numi = NumericalIntegration::new(Arc::clone(&mesh));
        let integrals = IntegralCache::new(&mesh)?;
        let order = options.order;

        let mut basis = Vec::with_capacity(integrals.len());
        for c in mesh.entity_ids(EntityKind::Cell, ParallelType::Used) {
            let ints = integrals.get(&numi, c, 2 * order)?;
            basis.push(Basis::init(options.basis, &numi, &ints, c, order)?);
        }
        vo.info(format_args!(
            "dg: order {order}, {} basis, {} cells",
            options.basis.name(),
            basis.len()
        ));
        Ok(Self {
            d: mesh.space_dimension(),
            mesh,
            numi,
            order,
            basis,
            integrals,
            vo,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn numerical_integration(&self) -> &NumericalIntegration {
        &self.numi
    }

    /// Number of basis functions per cell.
    pub fn basis_size(&self) -> usize {
        polynomial_space_size(self.d, self.order)
    }

    pub fn cell_basis(&self, c: EntityId) -> Result<&Basis, MeshError> {
        self.basis.get(c).ok_or(MeshError::BasisNotInitialized(c))
    }

    /// Extend the cached monomial integrals of `c` to at least `order`.
    pub fn update_integrals(&self, c: EntityId, order: usize) -> Result<(), MeshError> {
        self.integrals.ensure(&self.numi, c, order)
    }

    /// Copy of the cached integrals of `c`.
    pub fn cell_integrals(&self, c: EntityId) -> Result<CellIntegrals, MeshError> {
        self.integrals.snapshot(c)
    }

    fn monomials(&self) -> Vec<MonomialIndex> {
        MonomialIter::new(self.d, self.order).collect()
    }

    /// Natural monomials of cell `c` written as regular polynomials about
    /// its centroid.
    fn natural_monomials(&self, c: EntityId) -> Result<Vec<Polynomial>, MeshError> {
        let xc = self.mesh.cell_centroid(c)?;
        self.monomials()
            .into_iter()
            .map(|m| {
                let s = self.numi.monomial_natural_scales(c, m.degree)?;
                let mut p = Polynomial::monomial(self.d, &m.multi_index, s);
                p.set_origin(xc);
                Ok(p)
            })
            .collect()
    }

    fn check_dimension(&self, what: &'static str, found: usize) -> Result<(), MeshError> {
        if found != self.d {
            return Err(MeshError::MatrixSizeMismatch {
                what,
                expected: self.d,
                found,
            });
        }
        Ok(())
    }

    fn check_tensor(&self, k: &Tensor) -> Result<(), MeshError> {
        self.check_dimension("tensor dimension", k.dimension())
    }

    fn fill_mass(&self, k00: f64, ints: &CellIntegrals) -> DenseMatrix {
        let mons = self.monomials();
        let mut m = DenseMatrix::zeros(mons.len(), mons.len());
        for (i, p) in mons.iter().enumerate() {
            for q in &mons[i..] {
                let idx = sum_index(&p.multi_index, &q.multi_index);
                let v = k00 * ints.get(p.degree + q.degree, monomial_set_position(self.d, &idx));
                m[(p.global, q.global)] = v;
                m[(q.global, p.global)] = v;
            }
        }
        m
    }

    /// Mass matrix with a constant coefficient `K(0, 0)`.
    pub fn mass_matrix(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        self.check_tensor(k)?;
        let mut m = {
            let ints = self.integrals.get(&self.numi, c, 2 * self.order)?;
            self.fill_mass(k[(0, 0)], &ints)
        };
        self.cell_basis(c)?.change_basis_matrix(&mut m)?;
        Ok(m)
    }

    /// Same as [`DgModal::mass_matrix`] with caller-owned integrals, which
    /// are extended as needed.
    pub fn mass_matrix_with_integrals(
        &self,
        c: EntityId,
        k: &Tensor,
        integrals: &mut CellIntegrals,
    ) -> Result<DenseMatrix, MeshError> {
        self.check_tensor(k)?;
        integrals.update(&self.numi, c, 2 * self.order)?;
        let mut m = self.fill_mass(k[(0, 0)], integrals);
        self.cell_basis(c)?.change_basis_matrix(&mut m)?;
        Ok(m)
    }

    /// Mass matrix with a polynomial coefficient.
    pub fn mass_matrix_poly(&self, c: EntityId, k: &Polynomial) -> Result<DenseMatrix, MeshError> {
        self.check_dimension("coefficient polynomial dimension", k.dimension())?;
        let mut kc = k.clone();
        kc.change_origin(&self.mesh.cell_centroid(c)?);
        self.numi.change_basis_regular_to_natural(c, &mut kc)?;

        let mons = self.monomials();
        let kmons: Vec<(MonomialIndex, f64)> = kc
            .iter_monomials()
            .zip(kc.coefficients())
            .filter(|(_, v)| **v != 0.0)
            .map(|(m, v)| (m, *v))
            .collect();
        let mut m = DenseMatrix::zeros(mons.len(), mons.len());
        {
            let ints = self.integrals.get(&self.numi, c, 2 * self.order + kc.order())?;
            for (i, p) in mons.iter().enumerate() {
                for (km, factor) in &kmons {
                    for q in &mons[i..] {
                        let idx = sum_index(&sum_index(&p.multi_index, &q.multi_index), &km.multi_index);
                        let n = p.degree + q.degree + km.degree;
                        m[(p.global, q.global)] += factor * ints.get(n, monomial_set_position(self.d, &idx));
                    }
                }
            }
        }
        m.symmetrize_from_upper();
        self.cell_basis(c)?.change_basis_matrix(&mut m)?;
        Ok(m)
    }

    /// Triangles `(x_c, n0, n1)` of a 2D cell, one per face, in face order.
    fn cell_triangles(&self, c: EntityId) -> Result<Vec<[Point; 3]>, MeshError> {
        if self.d != 2 || self.mesh.manifold_dimension() != 2 {
            return Err(MeshError::unsupported(
                "piecewise polynomial coefficients are only available in 2D",
            ));
        }
        let xc = self.mesh.cell_centroid(c)?;
        self.mesh
            .cell_get_faces(c)?
            .iter()
            .map(|&f| {
                let nodes = self.mesh.face_get_nodes(f)?;
                Ok([
                    xc,
                    self.mesh.node_get_coordinates(nodes[0])?,
                    self.mesh.node_get_coordinates(nodes[1])?,
                ])
            })
            .collect()
    }

    /// Mass matrix with a coefficient given by one polynomial per face
    /// triangle of a 2D cell.
    pub fn mass_matrix_piecewise_poly(&self, c: EntityId, k: &VectorPolynomial) -> Result<DenseMatrix, MeshError> {
        let tris = self.cell_triangles(c)?;
        if k.len() != tris.len() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "piecewise coefficient pieces",
                expected: tris.len(),
                found: k.len(),
            });
        }
        let mons = self.natural_monomials(c)?;
        let n = mons.len();
        let mut m = DenseMatrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                m[(i, j)] = tris
                    .iter()
                    .zip(k.iter())
                    .map(|(t, kn)| integrate_polynomials_triangle(t, &[&mons[i], &mons[j], kn]))
                    .sum();
            }
        }
        m.symmetrize_from_upper();
        self.cell_basis(c)?.change_basis_matrix(&mut m)?;
        Ok(m)
    }

    /// Stiffness matrix `int K grad phi . grad psi`; a scalar `K` acts as
    /// `K I`.
    pub fn stiffness_matrix(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        self.check_tensor(k)?;
        let kf = k.to_full();
        let scale = self.numi.monomial_natural_scales(c, 1)?;
        let mons = self.monomials();
        let mut a = DenseMatrix::zeros(mons.len(), mons.len());
        {
            let ints = self.integrals.get(&self.numi, c, (2 * self.order).saturating_sub(2))?;
            for (ii, p) in mons.iter().enumerate() {
                for q in &mons[ii..] {
                    let mut idx = sum_index(&p.multi_index, &q.multi_index);
                    let n = p.degree + q.degree;
                    let mut sum = 0.0;
                    for i in 0..self.d {
                        for j in 0..self.d {
                            if p.multi_index[i] == 0 || q.multi_index[j] == 0 {
                                continue;
                            }
                            idx[i] -= 1;
                            idx[j] -= 1;
                            let v = ints.get(n - 2, monomial_set_position(self.d, &idx));
                            sum += kf[(i, j)] * v * (p.multi_index[i] * q.multi_index[j]) as f64;
                            idx[i] += 1;
                            idx[j] += 1;
                        }
                    }
                    a[(p.global, q.global)] = sum * scale * scale;
                    a[(q.global, p.global)] = sum * scale * scale;
                }
            }
        }
        self.cell_basis(c)?.change_basis_matrix(&mut a)?;
        Ok(a)
    }

    /// Advection matrix `int (u . grad phi) psi` (gradient on the test
    /// function when `grad_on_test`, on the solution otherwise). `u` is
    /// either one velocity polynomial per space direction or, in 2D, one per
    /// direction and face triangle.
    pub fn advection_matrix(
        &self,
        c: EntityId,
        u: &VectorPolynomial,
        grad_on_test: bool,
    ) -> Result<DenseMatrix, MeshError> {
        let nfaces = self.mesh.cell_get_faces(c)?.len();
        if u.len() == self.d {
            self.advection_matrix_poly(c, u, grad_on_test)
        } else if u.len() == nfaces * self.d {
            self.advection_matrix_piecewise_poly(c, u, grad_on_test)
        } else {
            Err(MeshError::MatrixSizeMismatch {
                what: "velocity components",
                expected: self.d,
                found: u.len(),
            })
        }
    }

    pub fn advection_matrix_poly(
        &self,
        c: EntityId,
        u: &VectorPolynomial,
        grad_on_test: bool,
    ) -> Result<DenseMatrix, MeshError> {
        self.check_dimension("velocity components", u.len())?;
        let xc = self.mesh.cell_centroid(c)?;
        let mut uc = u.clone();
        for p in uc.iter_mut() {
            p.change_origin(&xc);
            self.numi.change_basis_regular_to_natural(c, p)?;
        }
        let scale = self.numi.monomial_natural_scales(c, 1)?;
        let order = self.order + self.order.saturating_sub(1) + uc.order();

        let mons = self.monomials();
        let mut a = DenseMatrix::zeros(mons.len(), mons.len());
        {
            let ints = self.integrals.get(&self.numi, c, order)?;
            for p in &mons {
                // gradient of a natural monomial, in natural monomials
                let mut pp = Polynomial::monomial(self.d, &p.multi_index, scale);
                pp.set_origin(xc);
                let tmp = VectorPolynomial::gradient(&pp).dot(&uc);

                for (km, factor) in tmp.iter_monomials().zip(tmp.coefficients()) {
                    if *factor == 0.0 {
                        continue;
                    }
                    for q in &mons {
                        let idx = sum_index(&q.multi_index, &km.multi_index);
                        let n = q.degree + km.degree;
                        a[(p.global, q.global)] += factor * ints.get(n, monomial_set_position(self.d, &idx));
                    }
                }
            }
        }
        if !grad_on_test {
            a = a.transpose();
        }
        self.cell_basis(c)?.change_basis_matrix(&mut a)?;
        Ok(a)
    }

    pub fn advection_matrix_piecewise_poly(
        &self,
        c: EntityId,
        u: &VectorPolynomial,
        grad_on_test: bool,
    ) -> Result<DenseMatrix, MeshError> {
        let tris = self.cell_triangles(c)?;
        if u.len() != tris.len() * self.d {
            return Err(MeshError::MatrixSizeMismatch {
                what: "piecewise velocity components",
                expected: tris.len() * self.d,
                found: u.len(),
            });
        }
        let xc = self.mesh.cell_centroid(c)?;
        let mut uc = u.clone();
        uc.change_origin(&xc);

        let mons = self.natural_monomials(c)?;
        let n = mons.len();
        let mut a = DenseMatrix::zeros(n, n);
        for k in 0..n {
            let grad = VectorPolynomial::gradient(&mons[k]);
            // u . grad phi_k on each triangle
            let flux: Vec<Polynomial> = (0..tris.len())
                .map(|t| {
                    let mut acc = Polynomial::new(self.d, 0);
                    acc.set_origin(xc);
                    for i in 0..self.d {
                        acc += &(&grad[i] * &uc[t * self.d + i]);
                    }
                    acc
                })
                .collect();
            for l in 0..n {
                a[(k, l)] = tris
                    .iter()
                    .zip(&flux)
                    .map(|(tri, fl)| integrate_polynomials_triangle(tri, &[&mons[l], fl]))
                    .sum();
            }
        }
        if !grad_on_test {
            a = a.transpose();
        }
        self.cell_basis(c)?.change_basis_matrix(&mut a)?;
        Ok(a)
    }

    /// Finish a face matrix with the single or paired basis change.
    fn face_basis_change(&self, cells: &[EntityId], a: &mut DenseMatrix) -> Result<(), MeshError> {
        match cells {
            [c] => self.cell_basis(*c)?.change_basis_matrix(a),
            [c1, c2] => Basis::change_basis_matrix_pair(self.cell_basis(*c1)?, self.cell_basis(*c2)?, a),
            _ => Err(MeshError::InvalidTopology(format!(
                "face with {} cells",
                cells.len()
            ))),
        }
    }

    /// Upwind (or downwind) flux matrix for the normal velocity `un`, given
    /// relative to the natural normal of face `f`:
    ///
    /// * `jump_on_test`: `int (u.n) rho* [psi]`
    /// * otherwise: `int (u.n) psi* [rho]`
    ///
    /// where the star is the downwind trace (upwind trace when `upwind`).
    pub fn flux_matrix(
        &self,
        f: EntityId,
        un: &Polynomial,
        upwind: bool,
        jump_on_test: bool,
    ) -> Result<DenseMatrix, MeshError> {
        let cells = self.mesh.face_get_cells(f, ParallelType::Used)?;
        let ncells = cells.len();
        let size = self.basis_size();
        let mut a = DenseMatrix::zeros(ncells * size, ncells * size);

        let (_, dir) = self.mesh.face_normal_oriented(f, cells[0])?;
        let mut dir = f64::from(dir);
        let xf = self.mesh.face_centroid(f)?;

        let mut id = 0;
        if ncells > 1 {
            let mut vel = un.value(&xf) * dir;
            if upwind {
                vel = -vel;
            }
            if vel > 0.0 {
                id = 1;
            } else {
                dir = -dir;
            }
        }
        let col = id * size;
        let row = size - col;

        let c1 = cells[id];
        let c2 = if ncells == 1 { c1 } else { cells[1 - id] };
        self.update_integrals(c1, 2 * self.order)?;
        self.update_integrals(c2, 2 * self.order)?;

        let mons1 = self.natural_monomials(c1)?;
        let mons2 = self.natural_monomials(c2)?;
        let area = self.mesh.face_area(f)?;

        for k in 0..size {
            for l in 0..size {
                let q = &mons1[l];
                let vel1 = self.numi.integrate_polynomials_face(f, &[un, &mons1[k], q])? / area * dir;
                if ncells == 1 {
                    a[(k, l)] = vel1;
                } else {
                    let vel0 = self.numi.integrate_polynomials_face(f, &[un, &mons2[k], q])? / area * dir;
                    a[(row + k, col + l)] = vel0;
                    a[(col + k, col + l)] = -vel1;
                }
            }
        }
        if !jump_on_test {
            a = a.transpose();
        }
        self.face_basis_change(&cells, &mut a)?;
        Ok(a)
    }

    /// Rusanov flux matrix `int (u.n rho)* [psi]` from the cell velocities
    /// `uc1`, `uc2` of the two cells of face `f`. `_uf`, the face velocity,
    /// is accepted for interface compatibility and not used.
    ///
    /// Boundary faces are not supported yet and give a zero matrix.
    pub fn flux_matrix_rusanov(
        &self,
        f: EntityId,
        uc1: &VectorPolynomial,
        uc2: &VectorPolynomial,
        _uf: &Polynomial,
    ) -> Result<DenseMatrix, MeshError> {
        let cells = self.mesh.face_get_cells(f, ParallelType::Used)?;
        let ncells = cells.len();
        let size = self.basis_size();
        let mut a = DenseMatrix::zeros(ncells * size, ncells * size);
        if ncells == 1 {
            self.vo.debug(format_args!("rusanov flux on boundary face {f}: zero matrix"));
            return Ok(a);
        }
        self.check_dimension("velocity components", uc1.len())?;
        self.check_dimension("velocity components", uc2.len())?;

        let (c1, c2) = (cells[0], cells[1]);
        self.update_integrals(c1, 2 * self.order)?;
        self.update_integrals(c2, 2 * self.order)?;

        let (normal, _) = self.mesh.face_normal_oriented(f, c1)?;
        let normal = -normal;
        let mut uf1 = uc1 * &normal;
        let mut uf2 = uc2 * &normal;
        uf2.change_origin(uf1.origin());
        let ufn = (&uf1 + &uf2) * 0.5;

        let tmp = 0.5 * self.numi.polynomial_max_value(f, &ufn)?;
        uf1[(0, 0)] -= tmp;
        uf2[(0, 0)] += tmp;

        let mons1 = self.natural_monomials(c1)?;
        let mons2 = self.natural_monomials(c2)?;
        let scale = 2.0 * self.mesh.face_area(f)?;
        let face = |polys: &[&Polynomial]| self.numi.integrate_polynomials_face(f, polys);

        for k in 0..size {
            let (p0, p1) = (&mons1[k], &mons2[k]);
            for l in 0..size {
                let (q0, q1) = (&mons1[l], &mons2[l]);
                let coef00 = face(&[&uf1, p0, q0])?;
                let coef01 = face(&[&uf1, p0, q1])?;
                let coef11 = face(&[&uf2, p1, q1])?;
                let coef10 = face(&[&uf2, p1, q0])?;

                a[(l, k)] = coef00 / scale;
                a[(size + l, k)] = -coef01 / scale;
                a[(l, size + k)] = coef10 / scale;
                a[(size + l, size + k)] = -coef11 / scale;
            }
        }
        self.face_basis_change(&cells, &mut a)?;
        Ok(a)
    }

    /// Jump matrix `int_f {K grad rho} [psi]`.
    pub fn face_matrix_jump(&self, f: EntityId, k1: &Tensor, k2: &Tensor) -> Result<DenseMatrix, MeshError> {
        self.check_tensor(k1)?;
        self.check_tensor(k2)?;
        let cells = self.mesh.face_get_cells(f, ParallelType::Used)?;
        let ncells = cells.len();
        let size = self.basis_size();
        let mut a = DenseMatrix::zeros(ncells * size, ncells * size);

        let c1 = cells[0];
        let c2 = cells.get(1).copied();
        let order = (2 * self.order).saturating_sub(1);
        self.update_integrals(c1, order)?;
        if let Some(c2) = c2 {
            self.update_integrals(c2, order)?;
        }

        let (normal, _) = self.mesh.face_normal_oriented(f, c1)?;
        let normal = normal / normal.norm();
        let conormal1 = k1 * &normal;
        let conormal2 = k2 * &normal;

        let mons1 = self.natural_monomials(c1)?;
        let mons2 = match c2 {
            Some(c2) => self.natural_monomials(c2)?,
            None => Vec::new(),
        };
        let nc = ncells as f64;
        let face = |polys: &[&Polynomial]| self.numi.integrate_polynomials_face(f, polys);

        for k in 0..size {
            let p0 = VectorPolynomial::gradient(&mons1[k]).dot_point(&conormal1);
            let p1 = c2.map(|_| VectorPolynomial::gradient(&mons2[k]).dot_point(&conormal2));
            for l in 0..size {
                let q0 = &mons1[l];
                a[(k, l)] = face(&[&p0, q0])? / nc;

                if let Some(p1) = &p1 {
                    let q1 = &mons2[l];
                    let coef01 = face(&[&p0, q1])?;
                    let coef11 = face(&[p1, q1])?;
                    let coef10 = face(&[p1, q0])?;
                    a[(k, size + l)] = -coef01 / nc;
                    a[(size + k, size + l)] = -coef11 / nc;
                    a[(size + k, l)] = coef10 / nc;
                }
            }
        }
        self.face_basis_change(&cells, &mut a)?;
        Ok(a)
    }

    /// Penalty matrix `int_f K_f [psi] [rho]`.
    pub fn face_matrix_penalty(&self, f: EntityId, kf: f64) -> Result<DenseMatrix, MeshError> {
        let cells = self.mesh.face_get_cells(f, ParallelType::Used)?;
        let ncells = cells.len();
        let size = self.basis_size();
        let mut a = DenseMatrix::zeros(ncells * size, ncells * size);

        let c1 = cells[0];
        let c2 = cells.get(1).copied();
        self.update_integrals(c1, 2 * self.order)?;
        if let Some(c2) = c2 {
            self.update_integrals(c2, 2 * self.order)?;
        }

        let mons1 = self.natural_monomials(c1)?;
        let mons2 = match c2 {
            Some(c2) => self.natural_monomials(c2)?,
            None => Vec::new(),
        };
        let face = |polys: &[&Polynomial]| self.numi.integrate_polynomials_face(f, polys);

        for k in 0..size {
            let p0 = &mons1[k];
            for l in 0..size {
                let q0 = &mons1[l];
                a[(k, l)] = kf * face(&[p0, q0])?;

                if c2.is_some() {
                    let (p1, q1) = (&mons2[k], &mons2[l]);
                    let coef01 = face(&[p0, q1])?;
                    let coef11 = face(&[p1, q1])?;
                    a[(k, size + l)] = -kf * coef01;
                    a[(size + k, size + l)] = kf * coef11;
                    a[(size + l, k)] = -kf * coef01;
                }
            }
        }
        self.face_basis_change(&cells, &mut a)?;
        Ok(a)
    }

    fn check_tensors(&self, k: &[Tensor]) -> Result<usize, MeshError> {
        let ncells = self.basis.len();
        if k.len() != ncells {
            return Err(MeshError::MatrixSizeMismatch {
                what: "cell tensors",
                expected: ncells,
                found: k.len(),
            });
        }
        Ok(ncells)
    }

    /// Mass matrices of all used cells, one tensor per cell.
    pub fn mass_matrices(&self, k: &[Tensor]) -> Result<Vec<DenseMatrix>, MeshError> {
        let ncells = self.check_tensors(k)?;
        (0..ncells).map(|c| self.mass_matrix(c, &k[c])).collect()
    }

    /// Parallel [`DgModal::mass_matrices`]. Integral caches are filled
    /// sequentially first so workers only read them.
    #[cfg(feature = "rayon")]
    pub fn mass_matrices_par(&self, k: &[Tensor]) -> Result<Vec<DenseMatrix>, MeshError> {
        use rayon::prelude::*;

        let ncells = self.check_tensors(k)?;
        for c in 0..ncells {
            self.update_integrals(c, 2 * self.order)?;
        }
        (0..ncells)
            .into_par_iter()
            .map(|c| self.mass_matrix(c, &k[c]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::basis::BasisKind;
    use crate::geometry::region::GeometricModel;
    use crate::mesh::{StructuredMesh, StructuredMeshOptions};

    fn dg(opts: &StructuredMeshOptions, order: usize, basis: BasisKind) -> DgModal {
        let mesh = Mesh::new(
            StructuredMesh::new(opts).unwrap(),
            Arc::new(GeometricModel::default()),
            VerboseObject::silent("test"),
        )
        .unwrap();
        let options = DgOptions {
            order,
            basis,
            ..Default::default()
        };
        DgModal::new(Arc::new(mesh), &options, VerboseObject::silent("dg")).unwrap()
    }

    #[test]
    fn regular_mass_matrix_on_unit_square() {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 1, 1);
        let dg = dg(&opts, 1, BasisKind::Regular);
        let m = dg.mass_matrix(0, &Tensor::scalar(2, 1.0)).unwrap();
        // int 1 = 1, int (x - 1/2)^2 = 1/12, odd moments vanish
        assert!((m[(0, 0)] - 1.0).abs() < 1e-14);
        assert!((m[(1, 1)] - 1.0 / 12.0).abs() < 1e-14);
        assert!((m[(2, 2)] - 1.0 / 12.0).abs() < 1e-14);
        assert!(m[(0, 1)].abs() < 1e-14 && m[(1, 2)].abs() < 1e-14);
    }

    #[test]
    fn stiffness_of_linear_monomials() {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [2.0, 1.0], 1, 1);
        let dg = dg(&opts, 1, BasisKind::Regular);
        let k = Tensor::diagonal(&[3.0, 5.0]);
        let a = dg.stiffness_matrix(0, &k).unwrap();
        // grad x = e_x, grad y = e_y, |c| = 2
        assert!(a[(0, 0)].abs() < 1e-14);
        assert!((a[(1, 1)] - 6.0).abs() < 1e-12);
        assert!((a[(2, 2)] - 10.0).abs() < 1e-12);
        assert!(a[(1, 2)].abs() < 1e-12);
    }

    #[test]
    fn polynomial_coefficient_matches_constant_one() {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 2.0], 2, 1);
        let dg = dg(&opts, 2, BasisKind::Normalized);
        let m1 = dg.mass_matrix(1, &Tensor::scalar(2, 2.0)).unwrap();
        let m2 = dg.mass_matrix_poly(1, &Polynomial::constant(2, 2.0)).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                assert!((m1[(i, j)] - m2[(i, j)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn piecewise_coefficient_rejected_in_3d() {
        let opts = StructuredMeshOptions::brick([0.0; 3], [1.0; 3], 1, 1, 1);
        let dg = dg(&opts, 1, BasisKind::Normalized);
        let k = VectorPolynomial::new(3, 6, 0);
        assert!(matches!(
            dg.mass_matrix_piecewise_poly(0, &k),
            Err(MeshError::UnsupportedOperation(_))
        ));
        assert!(matches!(dg.cell_basis(5), Err(MeshError::BasisNotInitialized(5))));
    }

    #[test]
    fn rusanov_on_boundary_face_is_zero() {
        let opts = StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 1, 1);
        let dg = dg(&opts, 1, BasisKind::Normalized);
        let u = VectorPolynomial::new(2, 2, 0);
        let a = dg.flux_matrix_rusanov(0, &u, &u, &Polynomial::new(2, 0)).unwrap();
        assert_eq!(a.shape(), (3, 3));
        assert_eq!(a.max_abs(), 0.0);
    }
}
