//! Material tensors: scalar (rank 1) or full `d x d` (rank 2).

use crate::discretization::dense::DenseMatrix;
use crate::geometry::point::Point;
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::ops::{Index, Mul};

static ZERO: f64 = 0.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    d: usize,
    rank: usize,
    data: Vec<f64>,
}

impl Tensor {
    /// Scalar (isotropic) tensor.
    pub fn scalar(d: usize, value: f64) -> Self {
        Self {
            d,
            rank: 1,
            data: vec![value],
        }
    }

    /// Full tensor with the given diagonal.
    pub fn diagonal(diag: &[f64]) -> Self {
        let d = diag.len();
        let mut data = vec![0.0; d * d];
        for (i, v) in diag.iter().enumerate() {
            data[i * d + i] = *v;
        }
        Self { d, rank: 2, data }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MeshError> {
        let d = rows.len();
        if !(1..=3).contains(&d) {
            return Err(MeshError::PreconditionViolated(format!(
                "tensor dimension {d}"
            )));
        }
        let mut data = Vec::with_capacity(d * d);
        for r in rows {
            if r.len() != d {
                return Err(MeshError::MatrixSizeMismatch {
                    what: "tensor row",
                    expected: d,
                    found: r.len(),
                });
            }
            data.extend_from_slice(r);
        }
        Ok(Self { d, rank: 2, data })
    }

    /// Rank-2 tensor `value * I`.
    pub fn make_diagonal(d: usize, value: f64) -> Self {
        Self::diagonal(&vec![value; d])
    }

    pub fn dimension(&self) -> usize {
        self.d
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn is_scalar(&self) -> bool {
        self.rank == 1
    }

    /// Same tensor stored as a full `d x d` array.
    pub fn to_full(&self) -> Tensor {
        match self.rank {
            1 => Self::make_diagonal(self.d, self.data[0]),
            _ => self.clone(),
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self[(i, j)]
    }

    pub fn trace(&self) -> f64 {
        match self.rank {
            1 => self.data[0] * self.d as f64,
            _ => (0..self.d).map(|i| self.data[i * self.d + i]).sum(),
        }
    }

    pub fn transpose(&self) -> Tensor {
        match self.rank {
            1 => self.clone(),
            _ => {
                let mut t = self.clone();
                for i in 0..self.d {
                    for j in 0..self.d {
                        t.data[i * self.d + j] = self.data[j * self.d + i];
                    }
                }
                t
            }
        }
    }

    pub fn inverse(&self) -> Result<Tensor, MeshError> {
        match self.rank {
            1 => {
                let v = self.data[0];
                if v == 0.0 || !v.is_finite() {
                    return Err(MeshError::SingularMatrix(format!("scalar tensor {v}")));
                }
                Ok(Self::scalar(self.d, 1.0 / v))
            }
            _ => {
                let inv = self.as_matrix().inverse()?;
                Ok(Self {
                    d: self.d,
                    rank: 2,
                    data: inv.as_slice().to_vec(),
                })
            }
        }
    }

    /// `K p`
    pub fn apply(&self, p: &Point) -> Point {
        let mut out = Point::zero(self.d);
        for i in 0..self.d {
            out[i] = (0..self.d).map(|j| self[(i, j)] * p[j]).sum();
        }
        out
    }

    pub fn as_matrix(&self) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(self.d, self.d);
        for i in 0..self.d {
            for j in 0..self.d {
                m[(i, j)] = self[(i, j)];
            }
        }
        m
    }
}

impl Index<(usize, usize)> for Tensor {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        match self.rank {
            1 if i == j => &self.data[0],
            1 => &ZERO,
            _ => &self.data[i * self.d + j],
        }
    }
}

impl Mul<&Point> for &Tensor {
    type Output = Point;
    fn mul(self, p: &Point) -> Point {
        self.apply(p)
    }
}

impl Mul<f64> for Tensor {
    type Output = Tensor;
    fn mul(mut self, s: f64) -> Tensor {
        for v in &mut self.data {
            *v *= s;
        }
        self
    }
}
