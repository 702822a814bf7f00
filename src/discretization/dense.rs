//! Small dense matrices and vectors for local (per-cell, per-face) systems.

use crate::mesh_error::MeshError;
use std::fmt;
use std::ops::{AddAssign, Index, IndexMut, Mul, MulAssign, SubAssign};

/// Row-major `m x n` matrix.
#[derive(Clone, PartialEq, Default)]
pub struct DenseMatrix {
    m: usize,
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            data: vec![0.0; m * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut a = Self::zeros(n, n);
        for i in 0..n {
            a[(i, i)] = 1.0;
        }
        a
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MeshError> {
        let m = rows.len();
        let n = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(m * n);
        for r in rows {
            if r.len() != n {
                return Err(MeshError::MatrixSizeMismatch {
                    what: "matrix row",
                    expected: n,
                    found: r.len(),
                });
            }
            data.extend_from_slice(r);
        }
        Ok(Self { m, n, data })
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.m
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.n
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Change the shape, keeping the overlapping top-left block and
    /// zero-filling the rest.
    pub fn reshape(&mut self, m: usize, n: usize) {
        if (m, n) == (self.m, self.n) {
            return;
        }
        let mut data = vec![0.0; m * n];
        for i in 0..m.min(self.m) {
            for j in 0..n.min(self.n) {
                data[i * n + j] = self.data[i * self.n + j];
            }
        }
        self.m = m;
        self.n = n;
        self.data = data;
    }

    pub fn put_scalar(&mut self, v: f64) {
        self.data.fill(v);
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.n, self.m);
        for i in 0..self.m {
            for j in 0..self.n {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// `self * b`
    pub fn matmul(&self, b: &DenseMatrix) -> Result<DenseMatrix, MeshError> {
        if self.n != b.m {
            return Err(MeshError::MatrixSizeMismatch {
                what: "matmul inner dimension",
                expected: self.n,
                found: b.m,
            });
        }
        let mut c = Self::zeros(self.m, b.n);
        for i in 0..self.m {
            for k in 0..self.n {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..b.n {
                    c.data[i * b.n + j] += a * b.data[k * b.n + j];
                }
            }
        }
        Ok(c)
    }

    /// `selfᵀ * b`
    pub fn transpose_matmul(&self, b: &DenseMatrix) -> Result<DenseMatrix, MeshError> {
        if self.m != b.m {
            return Err(MeshError::MatrixSizeMismatch {
                what: "transpose_matmul inner dimension",
                expected: self.m,
                found: b.m,
            });
        }
        let mut c = Self::zeros(self.n, b.n);
        for k in 0..self.m {
            for i in 0..self.n {
                let a = self[(k, i)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..b.n {
                    c.data[i * b.n + j] += a * b.data[k * b.n + j];
                }
            }
        }
        Ok(c)
    }

    /// `self * v`
    pub fn matvec(&self, v: &[f64]) -> Result<Vec<f64>, MeshError> {
        if v.len() != self.n {
            return Err(MeshError::MatrixSizeMismatch {
                what: "matvec",
                expected: self.n,
                found: v.len(),
            });
        }
        Ok((0..self.m)
            .map(|i| (0..self.n).map(|j| self[(i, j)] * v[j]).sum())
            .collect())
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    pub fn inverse(&self) -> Result<DenseMatrix, MeshError> {
        if self.m != self.n {
            return Err(MeshError::MatrixSizeMismatch {
                what: "inverse of non-square matrix",
                expected: self.m,
                found: self.n,
            });
        }
        let n = self.n;
        let mut a = self.clone();
        let mut inv = Self::identity(n);
        let scale = self.max_abs().max(f64::MIN_POSITIVE);

        for col in 0..n {
            let (piv, pmax) = (col..n)
                .map(|r| (r, a[(r, col)].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if pmax <= 1e-14 * scale {
                return Err(MeshError::SingularMatrix(format!(
                    "pivot {pmax:e} in column {col} of {n}x{n} matrix"
                )));
            }
            if piv != col {
                a.swap_rows(piv, col);
                inv.swap_rows(piv, col);
            }
            let d = a[(col, col)];
            for j in 0..n {
                a[(col, j)] /= d;
                inv[(col, j)] /= d;
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let f = a[(r, col)];
                if f == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[(r, j)] -= f * a[(col, j)];
                    inv[(r, j)] -= f * inv[(col, j)];
                }
            }
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        for j in 0..self.n {
            self.data.swap(r1 * self.n + j, r2 * self.n + j);
        }
    }

    pub fn trace(&self) -> f64 {
        (0..self.m.min(self.n)).map(|i| self[(i, i)]).sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    pub fn is_symmetric(&self, tol: f64) -> bool {
        if self.m != self.n {
            return false;
        }
        let scale = self.max_abs().max(1.0);
        (0..self.n).all(|i| (0..i).all(|j| (self[(i, j)] - self[(j, i)]).abs() <= tol * scale))
    }

    /// Copy the upper triangle into the lower one.
    pub fn symmetrize_from_upper(&mut self) {
        for i in 0..self.m {
            for j in 0..i.min(self.n) {
                self[(i, j)] = self[(j, i)];
            }
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Add `b` scaled by `s`.
    pub fn add_scaled(&mut self, s: f64, b: &DenseMatrix) -> Result<(), MeshError> {
        if self.shape() != b.shape() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "add_scaled rows",
                expected: self.m,
                found: b.m,
            });
        }
        for (x, y) in self.data.iter_mut().zip(&b.data) {
            *x += s * y;
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        debug_assert!(i < self.m && j < self.n);
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        debug_assert!(i < self.m && j < self.n);
        &mut self.data[i * self.n + j]
    }
}

impl MulAssign<f64> for DenseMatrix {
    fn mul_assign(&mut self, s: f64) {
        for v in &mut self.data {
            *v *= s;
        }
    }
}

impl Mul<f64> for DenseMatrix {
    type Output = DenseMatrix;
    fn mul(mut self, s: f64) -> DenseMatrix {
        self *= s;
        self
    }
}

impl AddAssign<&DenseMatrix> for DenseMatrix {
    fn add_assign(&mut self, rhs: &DenseMatrix) {
        assert_eq!(self.shape(), rhs.shape(), "matrix shapes differ");
        for (x, y) in self.data.iter_mut().zip(&rhs.data) {
            *x += y;
        }
    }
}

impl SubAssign<&DenseMatrix> for DenseMatrix {
    fn sub_assign(&mut self, rhs: &DenseMatrix) {
        assert_eq!(self.shape(), rhs.shape(), "matrix shapes differ");
        for (x, y) in self.data.iter_mut().zip(&rhs.data) {
            *x -= y;
        }
    }
}

impl fmt::Debug for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DenseMatrix {}x{}", self.m, self.n)?;
        for i in 0..self.m {
            let row: Vec<String> = self.row(i).iter().map(|v| format!("{v:12.5e}")).collect();
            writeln!(f, "  [{}]", row.join(" "))?;
        }
        Ok(())
    }
}

/// Dense vector of local coefficients.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DenseVector(Vec<f64>);

impl DenseVector {
    pub fn zeros(n: usize) -> Self {
        Self(vec![0.0; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &DenseVector) -> f64 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for DenseVector {
    fn from(v: Vec<f64>) -> Self {
        Self(v)
    }
}

impl Index<usize> for DenseVector {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for DenseVector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_with_pivoting() {
        let a = DenseMatrix::from_rows(&[vec![0.0, 2.0], vec![1.0, 1.0]]).unwrap();
        let inv = a.inverse().unwrap();
        let id = a.matmul(&inv).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let e = if i == j { 1.0 } else { 0.0 };
                assert!((id[(i, j)] - e).abs() < 1e-14);
            }
        }
        let s = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(s.inverse(), Err(MeshError::SingularMatrix(_))));
    }

    #[test]
    fn products_and_shapes() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let ata = a.transpose_matmul(&a).unwrap();
        let ata2 = a.transpose().matmul(&a).unwrap();
        assert_eq!(ata, ata2);
        assert!(ata.is_symmetric(1e-14));
        assert_eq!(a.matvec(&[1.0, 0.0, -1.0]).unwrap(), vec![-2.0, -2.0]);
        assert!(a.matmul(&a).is_err());

        let mut b = a.clone();
        b.reshape(3, 3);
        assert_eq!(b[(1, 2)], 6.0);
        assert_eq!(b[(2, 0)], 0.0);
        assert_eq!(b.trace(), 6.0);
    }
}
