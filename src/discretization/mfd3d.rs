//! Mimetic finite difference matrices for diffusion.
//!
//! Face degrees of freedom are normal flux components (per unit area)
//! relative to the outward normal of the cell; nodal degrees of freedom are
//! point values. Each matrix is the sum of a consistency part `Xc`, exact for
//! linear fields, and a stability part `Xs = s (I - N (N^T N)^(-1) N^T)`
//! vanishing on them.
//!
//! Notation: `M` mass, `W = M^(-1)` (approximately), `A` stiffness.

use crate::discretization::dense::DenseMatrix;
use crate::discretization::options::{MfdOptions, StabilityMethod};
use crate::discretization::tensor::Tensor;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::EntityId;
use crate::verbose::VerboseObject;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mfd3dDiffusion {
    mesh: Arc<Mesh>,
    options: MfdOptions,
    vo: VerboseObject,
}

fn check_shape(what: &'static str, a: &DenseMatrix, m: usize, n: usize) -> Result<(), MeshError> {
    if a.nrows() != m {
        return Err(MeshError::MatrixSizeMismatch {
            what,
            expected: m,
            found: a.nrows(),
        });
    }
    if a.ncols() != n {
        return Err(MeshError::MatrixSizeMismatch {
            what,
            expected: n,
            found: a.ncols(),
        });
    }
    Ok(())
}

impl Mfd3dDiffusion {
    pub fn new(mesh: Arc<Mesh>, options: MfdOptions, vo: VerboseObject) -> Self {
        vo.debug(format_args!("mfd: stability {:?}, scaling {}", options.stability, options.scaling));
        Self { mesh, options, vo }
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn options(&self) -> &MfdOptions {
        &self.options
    }

    fn dim(&self) -> usize {
        self.mesh.space_dimension()
    }

    fn check_tensor(&self, k: &Tensor) -> Result<(), MeshError> {
        if k.dimension() != self.dim() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "tensor dimension",
                expected: self.dim(),
                found: k.dimension(),
            });
        }
        Ok(())
    }

    /// Consistency part of the mass matrix:
    /// `Mc(i, j) = ((x_j - x_c) . K^(-T) (x_i - x_c)) a_i a_j / |c|` and the
    /// unit outward normals `N`. Only the upper triangle of `Mc` is filled
    /// when `symmetry` is set.
    pub fn l2_consistency(
        &self,
        c: EntityId,
        k: &Tensor,
        n: &mut DenseMatrix,
        mc: &mut DenseMatrix,
        symmetry: bool,
    ) -> Result<(), MeshError> {
        self.check_tensor(k)?;
        let faces = self.mesh.cell_get_faces(c)?;
        let nfaces = faces.len();
        let d = self.dim();
        check_shape("l2 consistency normals", n, nfaces, d)?;
        check_shape("l2 consistency matrix", mc, nfaces, nfaces)?;

        let volume = self.mesh.cell_volume(c)?;
        let xc = self.mesh.cell_centroid(c)?;
        let kinv = k.inverse()?.transpose();

        let arms: Vec<(Point, f64)> = faces
            .iter()
            .map(|&f| Ok((self.mesh.face_centroid(f)? - xc, self.mesh.face_area(f)?)))
            .collect::<Result<_, MeshError>>()?;

        for i in 0..nfaces {
            let (vi, ai) = &arms[i];
            let v2 = kinv.apply(vi);
            for j in if symmetry { i } else { 0 }..nfaces {
                let (vj, aj) = &arms[j];
                mc[(i, j)] = vj.dot(&v2) * ai * aj / volume;
            }
            let (normal, _) = self.mesh.face_normal_oriented(faces[i], c)?;
            for kk in 0..d {
                n[(i, kk)] = normal[kk] / ai;
            }
        }
        Ok(())
    }

    /// Consistency part of the inverse mass matrix, `Wc = N K N^T / |c|`
    /// with unit outward normals, and `R(i, :) = (x_i - x_c) a_i`.
    pub fn l2_consistency_inverse(
        &self,
        c: EntityId,
        k: &Tensor,
        r: &mut DenseMatrix,
        wc: &mut DenseMatrix,
        symmetry: bool,
    ) -> Result<(), MeshError> {
        self.check_tensor(k)?;
        let faces = self.mesh.cell_get_faces(c)?;
        let nfaces = faces.len();
        let d = self.dim();
        check_shape("l2 inverse consistency arms", r, nfaces, d)?;
        check_shape("l2 inverse consistency matrix", wc, nfaces, nfaces)?;

        let volume = self.mesh.cell_volume(c)?;
        let xc = self.mesh.cell_centroid(c)?;
        let mut units = Vec::with_capacity(nfaces);
        for (i, &f) in faces.iter().enumerate() {
            let area = self.mesh.face_area(f)?;
            let (normal, _) = self.mesh.face_normal_oriented(f, c)?;
            units.push(normal / area);
            let arm = self.mesh.face_centroid(f)? - xc;
            for kk in 0..d {
                r[(i, kk)] = arm[kk] * area;
            }
        }
        for i in 0..nfaces {
            let kn = k.apply(&units[i]);
            for j in if symmetry { i } else { 0 }..nfaces {
                wc[(i, j)] = kn.dot(&units[j]) / volume;
            }
        }
        Ok(())
    }

    /// `s (I - N (N^T N)^(-1) N^T)` added to the upper triangle of `xc`,
    /// which is then symmetrized.
    fn add_stability(&self, n: &DenseMatrix, xc: &mut DenseMatrix) -> Result<(), MeshError> {
        let rows = n.nrows();
        let scale = match self.options.stability {
            StabilityMethod::Scalar => xc.trace() / rows as f64,
            StabilityMethod::Fixed(v) => v,
        } * self.options.scaling;

        let ntn_inv = n.transpose_matmul(n)?.inverse()?;
        let proj = n.matmul(&ntn_inv)?.matmul(&n.transpose())?;
        for i in 0..rows {
            for j in i..rows {
                let id = if i == j { 1.0 } else { 0.0 };
                xc[(i, j)] += scale * (id - proj[(i, j)]);
            }
        }
        xc.symmetrize_from_upper();
        Ok(())
    }

    /// Mass matrix `M = Mc + Ms` on face fluxes.
    pub fn mass_matrix(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        let nfaces = self.mesh.cell_get_faces(c)?.len();
        let mut n = DenseMatrix::zeros(nfaces, self.dim());
        let mut m = DenseMatrix::zeros(nfaces, nfaces);
        self.l2_consistency(c, k, &mut n, &mut m, true)?;
        self.add_stability(&n, &mut m)?;
        Ok(m)
    }

    /// Inverse mass matrix `W = Wc + Ws`.
    pub fn mass_matrix_inverse(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        let nfaces = self.mesh.cell_get_faces(c)?.len();
        let mut r = DenseMatrix::zeros(nfaces, self.dim());
        let mut w = DenseMatrix::zeros(nfaces, nfaces);
        self.l2_consistency_inverse(c, k, &mut r, &mut w, true)?;
        self.add_stability(&r, &mut w)?;
        Ok(w)
    }

    /// Integral over each face of each nodal hat function, as `(node, weight)`
    /// pairs. Polygonal faces are split into triangles about their vertex
    /// average, where every hat function is `1/m`.
    fn face_node_weights(&self, f: EntityId) -> Result<Vec<(EntityId, f64)>, MeshError> {
        let nodes = self.mesh.face_get_nodes(f)?;
        if self.mesh.manifold_dimension() == 2 {
            let half = 0.5 * self.mesh.face_area(f)?;
            return Ok(nodes.iter().map(|&v| (v, half)).collect());
        }
        let x: Vec<Point> = nodes
            .iter()
            .map(|&v| self.mesh.node_get_coordinates(v))
            .collect::<Result<_, _>>()?;
        let m = x.len();
        let mut xv = Point::zero(self.dim());
        for p in &x {
            xv += *p;
        }
        let xv = xv / m as f64;

        let mut w = vec![0.0; m];
        for i in 0..m {
            let j = (i + 1) % m;
            let area = 0.5 * (x[i] - xv).cross(&(x[j] - xv)).norm();
            for (k, wk) in w.iter_mut().enumerate() {
                *wk += area / 3.0 / m as f64;
                if k == i || k == j {
                    *wk += area / 3.0;
                }
            }
        }
        Ok(nodes.iter().copied().zip(w).collect())
    }

    /// Consistency part of the nodal stiffness matrix. Returns `N`
    /// (`nnodes x (d + 1)`, rows `[x_n - x_c, 1]`) and `Ac = R K R^T / |c|`
    /// with `R(n, :) = int_{dc} phi_n n`.
    pub fn h1_consistency(&self, c: EntityId, k: &Tensor) -> Result<(DenseMatrix, DenseMatrix), MeshError> {
        self.check_tensor(k)?;
        let nodes = self.mesh.cell_get_nodes(c)?;
        let nnodes = nodes.len();
        let d = self.dim();
        let volume = self.mesh.cell_volume(c)?;
        let xc = self.mesh.cell_centroid(c)?;

        let mut n = DenseMatrix::zeros(nnodes, d + 1);
        for (i, &v) in nodes.iter().enumerate() {
            let x = self.mesh.node_get_coordinates(v)? - xc;
            for kk in 0..d {
                n[(i, kk)] = x[kk];
            }
            n[(i, d)] = 1.0;
        }

        let r = self.nodal_boundary_moments(c, &nodes)?;
        let mut ac = DenseMatrix::zeros(nnodes, nnodes);
        for i in 0..nnodes {
            let kr = k.apply(&r[i]);
            for j in i..nnodes {
                ac[(i, j)] = kr.dot(&r[j]) / volume;
            }
        }
        ac.symmetrize_from_upper();
        Ok((n, ac))
    }

    /// `R(n, :) = int_{dc} phi_n n` for the nodes of cell `c`.
    fn nodal_boundary_moments(&self, c: EntityId, nodes: &[EntityId]) -> Result<Vec<Point>, MeshError> {
        let mut r = vec![Point::zero(self.dim()); nodes.len()];
        for &f in self.mesh.cell_get_faces(c)? {
            let (normal, _) = self.mesh.face_normal_oriented(f, c)?;
            let unit = normal / self.mesh.face_area(f)?;
            for (v, w) in self.face_node_weights(f)? {
                let i = nodes.iter().position(|&u| u == v).ok_or_else(|| {
                    MeshError::InvalidTopology(format!("node {v} of face {f} is not a node of cell {c}"))
                })?;
                r[i] += unit * w;
            }
        }
        Ok(r)
    }

    /// Nodal stiffness matrix `A = Ac + As`.
    pub fn stiffness_matrix(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        let (n, mut a) = self.h1_consistency(c, k)?;
        self.add_stability(&n, &mut a)?;
        Ok(a)
    }

    /// Half transmissibility of face `f` seen from cell `c`:
    /// `|(K n_f) . (x_f - x_c)| / |x_f - x_c|^2` with the area-weighted
    /// normal.
    pub fn transmissibility(&self, f: EntityId, c: EntityId, k: &Tensor) -> Result<f64, MeshError> {
        self.check_tensor(k)?;
        let a = self.mesh.face_centroid(f)? - self.mesh.cell_centroid(c)?;
        let normal = self.mesh.face_normal(f)?;
        let dist2 = a.dot(&a);
        if dist2 == 0.0 {
            return Err(MeshError::InvalidGeometry(format!(
                "centroid of face {f} coincides with centroid of cell {c}"
            )));
        }
        Ok(k.apply(&normal).dot(&a).abs() / dist2)
    }

    /// Diagonal inverse mass matrix of the two-point flux approximation.
    pub fn mass_matrix_inverse_tpfa(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        let faces = self.mesh.cell_get_faces(c)?;
        let mut w = DenseMatrix::zeros(faces.len(), faces.len());
        for (i, &f) in faces.iter().enumerate() {
            let area = self.mesh.face_area(f)?;
            w[(i, i)] = self.transmissibility(f, c, k)? / (area * area);
        }
        Ok(w)
    }

    /// Diagonal inverse of the lumped mass matrix `d |c| / (nfaces K_00)`.
    pub fn mass_matrix_inverse_diagonal(&self, c: EntityId, k: &Tensor) -> Result<DenseMatrix, MeshError> {
        self.check_tensor(k)?;
        let nfaces = self.mesh.cell_get_faces(c)?.len();
        let volume = self.mesh.cell_volume(c)?;
        let value = nfaces as f64 * k[(0, 0)] / (self.dim() as f64 * volume);
        if !value.is_finite() || value == 0.0 {
            self.vo.warn(format_args!("cell {c}: diagonal inverse mass matrix is {value}"));
            return Err(MeshError::SingularMatrix(format!("lumped mass matrix of cell {c}")));
        }
        let mut w = DenseMatrix::zeros(nfaces, nfaces);
        for i in 0..nfaces {
            w[(i, i)] = value;
        }
        Ok(w)
    }

    /// Constant gradient `-K^(-1) u` of the pressure behind the face fluxes
    /// `solution` (outward, per unit area), with `u = sum_f a_f (x_f - x_c) u_f / |c|`.
    pub fn recover_gradient_mass_matrix(&self, c: EntityId, k: &Tensor, solution: &[f64]) -> Result<Point, MeshError> {
        self.check_tensor(k)?;
        let faces = self.mesh.cell_get_faces(c)?;
        if solution.len() != faces.len() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "face solution",
                expected: faces.len(),
                found: solution.len(),
            });
        }
        let xc = self.mesh.cell_centroid(c)?;
        let mut u = Point::zero(self.dim());
        for (&f, &uf) in faces.iter().zip(solution) {
            u += (self.mesh.face_centroid(f)? - xc) * (self.mesh.face_area(f)? * uf);
        }
        let u = u / self.mesh.cell_volume(c)?;
        Ok(-k.inverse()?.apply(&u))
    }

    /// Constant gradient `sum_n R(n, :) p_n / |c|` of the nodal values
    /// `solution`.
    pub fn recover_gradient_stiffness_matrix(&self, c: EntityId, solution: &[f64]) -> Result<Point, MeshError> {
        let nodes = self.mesh.cell_get_nodes(c)?;
        if solution.len() != nodes.len() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "nodal solution",
                expected: nodes.len(),
                found: solution.len(),
            });
        }
        let r = self.nodal_boundary_moments(c, &nodes)?;
        let mut g = Point::zero(self.dim());
        for (rn, &p) in r.iter().zip(solution) {
            g += *rn * p;
        }
        Ok(g / self.mesh.cell_volume(c)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::region::GeometricModel;
    use crate::mesh::{StructuredMesh, StructuredMeshOptions};

    fn mfd(opts: &StructuredMeshOptions) -> Mfd3dDiffusion {
        let mesh = Mesh::new(
            StructuredMesh::new(opts).unwrap(),
            Arc::new(GeometricModel::default()),
            VerboseObject::silent("test"),
        )
        .unwrap();
        Mfd3dDiffusion::new(Arc::new(mesh), MfdOptions::default(), VerboseObject::silent("mfd"))
    }

    #[test]
    fn unit_square_tpfa_agrees_with_diagonal() {
        let m = mfd(&StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 1, 1));
        let k = Tensor::scalar(2, 1.0);
        let tpfa = m.mass_matrix_inverse_tpfa(0, &k).unwrap();
        let diag = m.mass_matrix_inverse_diagonal(0, &k).unwrap();
        for i in 0..4 {
            assert!((tpfa[(i, i)] - 2.0).abs() < 1e-12);
            assert!((diag[(i, i)] - 2.0).abs() < 1e-12);
        }
        assert!((m.transmissibility(0, 0, &k).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sizes_are_preconditions() {
        let m = mfd(&StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 1, 1));
        let mut n = DenseMatrix::zeros(3, 2);
        let mut mc = DenseMatrix::zeros(4, 4);
        let err = m
            .l2_consistency(0, &Tensor::scalar(2, 1.0), &mut n, &mut mc, true)
            .unwrap_err();
        assert_eq!(err.status_code(), crate::mesh_error::ELEMENTAL_MATRIX_PRECONDITION);
    }

    #[test]
    fn singular_tensor_fails() {
        let m = mfd(&StructuredMeshOptions::rectangle([0.0, 0.0], [1.0, 1.0], 1, 1));
        let err = m.mass_matrix(0, &Tensor::scalar(2, 0.0)).unwrap_err();
        assert!(matches!(err, MeshError::SingularMatrix(_)));
        assert_eq!(err.status_code(), crate::mesh_error::ELEMENTAL_MATRIX_FAILED);
    }

    #[test]
    fn stiffness_kills_constants() {
        let m = mfd(&StructuredMeshOptions::brick([0.0; 3], [1.0, 2.0, 0.5], 1, 1, 1));
        let a = m.stiffness_matrix(0, &Tensor::scalar(3, 1.5)).unwrap();
        assert!(a.is_symmetric(1e-12));
        let ones = vec![1.0; a.nrows()];
        for v in a.matvec(&ones).unwrap() {
            assert!(v.abs() < 1e-12);
        }
    }
}
