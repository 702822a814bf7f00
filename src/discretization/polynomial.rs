//! Polynomials in Taylor form about an origin.
//!
//! Coefficients are stored degree block by degree block. Inside the block of
//! degree `m` the monomials are ordered as
//!
//! * 1D: `(m)`
//! * 2D: `(m - k, k)` at position `k`
//! * 3D: `(a, m - a - c, c)` at position `(m - a)(m - a + 1)/2 + c`
//!
//! so that [`monomial_set_position`] is O(1) and the global position of a
//! monomial is `polynomial_space_size(d, m - 1) + position`.

use crate::geometry::point::Point;
use crate::mesh_error::MeshError;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// Exponents of one monomial; entries past the dimension are zero.
pub type MultiIndex = [usize; 3];

/// Number of monomials of exact degree `m` in `d` variables.
pub fn monomial_set_size(d: usize, m: usize) -> usize {
    match d {
        0 => usize::from(m == 0),
        1 => 1,
        2 => m + 1,
        _ => (m + 1) * (m + 2) / 2,
    }
}

/// Dimension of the space of polynomials of degree `<= k` in `d` variables.
pub fn polynomial_space_size(d: usize, k: usize) -> usize {
    match d {
        0 => 1,
        1 => k + 1,
        2 => (k + 1) * (k + 2) / 2,
        _ => (k + 1) * (k + 2) * (k + 3) / 6,
    }
}

/// Position of a monomial inside its degree block.
pub fn monomial_set_position(d: usize, idx: &[usize]) -> usize {
    match d {
        0 | 1 => 0,
        2 => idx[1],
        _ => {
            let s = idx[1] + idx[2];
            s * (s + 1) / 2 + idx[2]
        }
    }
}

/// Inverse of [`monomial_set_position`].
pub fn multi_index_at(d: usize, m: usize, pos: usize) -> MultiIndex {
    match d {
        0 => [0; 3],
        1 => [m, 0, 0],
        2 => [m - pos, pos, 0],
        _ => {
            let mut s = 0;
            while (s + 1) * (s + 2) / 2 <= pos {
                s += 1;
            }
            let c = pos - s * (s + 1) / 2;
            [m - s, s - c, c]
        }
    }
}

/// Offset of the degree-`m` block in the coefficient vector.
#[inline]
fn block_offset(d: usize, m: usize) -> usize {
    if m == 0 {
        0
    } else {
        polynomial_space_size(d, m - 1)
    }
}

/// One monomial visited by [`Polynomial::iter_monomials`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonomialIndex {
    pub multi_index: MultiIndex,
    /// Total degree.
    pub degree: usize,
    /// Position inside the degree block.
    pub position: usize,
    /// Position in the full coefficient vector.
    pub global: usize,
}

/// Iterator over all monomials of degree `<= order` in `d` variables,
/// by increasing degree.
#[derive(Clone, Debug)]
pub struct MonomialIter {
    d: usize,
    order: usize,
    degree: usize,
    position: usize,
    global: usize,
}

impl MonomialIter {
    pub fn new(d: usize, order: usize) -> Self {
        Self {
            d,
            order,
            degree: 0,
            position: 0,
            global: 0,
        }
    }
}

impl Iterator for MonomialIter {
    type Item = MonomialIndex;

    fn next(&mut self) -> Option<MonomialIndex> {
        if self.degree > self.order {
            return None;
        }
        let item = MonomialIndex {
            multi_index: multi_index_at(self.d, self.degree, self.position),
            degree: self.degree,
            position: self.position,
            global: self.global,
        };
        self.global += 1;
        self.position += 1;
        if self.position == monomial_set_size(self.d, self.degree) {
            self.position = 0;
            self.degree += 1;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = polynomial_space_size(self.d, self.order).saturating_sub(self.global);
        (n, Some(n))
    }
}

impl ExactSizeIterator for MonomialIter {}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// `p(x) = sum_a c_a (x - origin)^a`, degree `<= order`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    d: usize,
    order: usize,
    coefs: Vec<f64>,
    origin: Point,
}

impl Polynomial {
    /// Zero polynomial of the given dimension and order, origin at zero.
    pub fn new(d: usize, order: usize) -> Self {
        Self {
            d,
            order,
            coefs: vec![0.0; polynomial_space_size(d, order)],
            origin: Point::zero(d),
        }
    }

    /// `factor * (x - origin)^idx`.
    pub fn monomial(d: usize, idx: &[usize], factor: f64) -> Self {
        let degree: usize = idx.iter().take(d).sum();
        let mut p = Self::new(d, degree);
        let pos = monomial_set_position(d, idx);
        p.coefs[block_offset(d, degree) + pos] = factor;
        p
    }

    /// Constant polynomial.
    pub fn constant(d: usize, value: f64) -> Self {
        let mut p = Self::new(d, 0);
        p.coefs[0] = value;
        p
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.d
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of coefficients.
    #[inline]
    pub fn size(&self) -> usize {
        self.coefs.len()
    }

    pub fn origin(&self) -> &Point {
        &self.origin
    }

    /// Move the origin without re-expanding the coefficients.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin.with_dim(self.d);
    }

    pub fn get(&self, degree: usize, pos: usize) -> f64 {
        if degree > self.order {
            return 0.0;
        }
        self.coefs[block_offset(self.d, degree) + pos]
    }

    pub fn set(&mut self, degree: usize, pos: usize, v: f64) {
        let k = block_offset(self.d, degree) + pos;
        self.coefs[k] = v;
    }

    /// Position of a multi index in the coefficient vector.
    pub fn polynomial_position(&self, idx: &[usize]) -> usize {
        let degree: usize = idx.iter().take(self.d).sum();
        block_offset(self.d, degree) + monomial_set_position(self.d, idx)
    }

    /// Change the order. Coefficients of degrees present in both orders are
    /// kept, new ones are zero.
    pub fn reshape(&mut self, order: usize) {
        self.coefs.resize(polynomial_space_size(self.d, order), 0.0);
        self.order = order;
    }

    pub fn iter_monomials(&self) -> MonomialIter {
        MonomialIter::new(self.d, self.order)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefs
    }

    pub fn set_coefficients(&mut self, coefs: &[f64]) -> Result<(), MeshError> {
        if coefs.len() != self.coefs.len() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "polynomial coefficients",
                expected: self.coefs.len(),
                found: coefs.len(),
            });
        }
        self.coefs.copy_from_slice(coefs);
        Ok(())
    }

    pub fn value(&self, x: &Point) -> f64 {
        let mut dx = [0.0; 3];
        for (i, v) in dx.iter_mut().enumerate().take(self.d) {
            *v = x[i] - self.origin[i];
        }
        self.iter_monomials()
            .zip(&self.coefs)
            .filter(|(_, c)| **c != 0.0)
            .map(|(m, c)| {
                let mut t = *c;
                for i in 0..self.d {
                    t *= dx[i].powi(m.multi_index[i] as i32);
                }
                t
            })
            .sum()
    }

    /// Re-expand about a new origin. The polynomial as a function is unchanged.
    pub fn change_origin(&mut self, origin: &Point) {
        let origin = origin.with_dim(self.d);
        let mut shift = [0.0; 3];
        for (i, s) in shift.iter_mut().enumerate().take(self.d) {
            *s = origin[i] - self.origin[i];
        }
        if shift.iter().all(|s| *s == 0.0) {
            self.origin = origin;
            return;
        }

        let mut out = vec![0.0; self.coefs.len()];
        for (m, &c) in self.iter_monomials().zip(&self.coefs) {
            if c == 0.0 {
                continue;
            }
            let a = m.multi_index;
            // (x - o)^a = prod_i sum_{b_i <= a_i} C(a_i, b_i) (x - o')^b_i s_i^(a_i - b_i)
            for b0 in 0..=a[0] {
                for b1 in 0..=a[1] {
                    for b2 in 0..=a[2] {
                        let b = [b0, b1, b2];
                        let mut t = c;
                        for i in 0..3 {
                            t *= binomial(a[i], b[i]) * shift[i].powi((a[i] - b[i]) as i32);
                        }
                        out[self.polynomial_position(&b)] += t;
                    }
                }
            }
        }
        self.coefs = out;
        self.origin = origin;
    }

    /// Partial derivative along axis `i`.
    pub fn derivative(&self, i: usize) -> Polynomial {
        let mut out = Polynomial::new(self.d, self.order.saturating_sub(1));
        out.origin = self.origin;
        for (m, &c) in self.iter_monomials().zip(&self.coefs) {
            let a = m.multi_index;
            if c == 0.0 || a[i] == 0 {
                continue;
            }
            let mut b = a;
            b[i] -= 1;
            let k = out.polynomial_position(&b);
            out.coefs[k] += c * a[i] as f64;
        }
        out
    }

    /// Largest coefficient in absolute value.
    pub fn norm_max(&self) -> f64 {
        self.coefs.iter().fold(0.0, |m, c| m.max(c.abs()))
    }

    /// Copy of `other` expanded about this polynomial's origin.
    fn aligned(&self, other: &Polynomial) -> Polynomial {
        let mut q = other.clone();
        if q.origin != self.origin {
            q.change_origin(&self.origin);
        }
        q
    }
}

impl Index<(usize, usize)> for Polynomial {
    type Output = f64;
    fn index(&self, (degree, pos): (usize, usize)) -> &f64 {
        &self.coefs[block_offset(self.d, degree) + pos]
    }
}

impl IndexMut<(usize, usize)> for Polynomial {
    fn index_mut(&mut self, (degree, pos): (usize, usize)) -> &mut f64 {
        &mut self.coefs[block_offset(self.d, degree) + pos]
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        let q = self.aligned(rhs);
        if q.order > self.order {
            self.reshape(q.order);
        }
        for (a, b) in self.coefs.iter_mut().zip(&q.coefs) {
            *a += b;
        }
    }
}

impl SubAssign<&Polynomial> for Polynomial {
    fn sub_assign(&mut self, rhs: &Polynomial) {
        *self += &(-rhs.clone());
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut p = self.clone();
        p += rhs;
        p
    }
}

impl Add for Polynomial {
    type Output = Polynomial;
    fn add(mut self, rhs: Polynomial) -> Polynomial {
        self += &rhs;
        self
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let mut p = self.clone();
        p -= rhs;
        p
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;
    fn sub(mut self, rhs: Polynomial) -> Polynomial {
        self -= &rhs;
        self
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;
    fn neg(mut self) -> Polynomial {
        for c in &mut self.coefs {
            *c = -*c;
        }
        self
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let q = self.aligned(rhs);
        let mut out = Polynomial::new(self.d, self.order + q.order);
        out.origin = self.origin;
        for (ma, &a) in self.iter_monomials().zip(&self.coefs) {
            if a == 0.0 {
                continue;
            }
            for (mb, &b) in q.iter_monomials().zip(&q.coefs) {
                if b == 0.0 {
                    continue;
                }
                let idx = [
                    ma.multi_index[0] + mb.multi_index[0],
                    ma.multi_index[1] + mb.multi_index[1],
                    ma.multi_index[2] + mb.multi_index[2],
                ];
                let k = out.polynomial_position(&idx);
                out.coefs[k] += a * b;
            }
        }
        out
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl MulAssign<f64> for Polynomial {
    fn mul_assign(&mut self, s: f64) {
        for c in &mut self.coefs {
            *c *= s;
        }
    }
}

impl Mul<f64> for Polynomial {
    type Output = Polynomial;
    fn mul(mut self, s: f64) -> Polynomial {
        self *= s;
        self
    }
}

impl Mul<f64> for &Polynomial {
    type Output = Polynomial;
    fn mul(self, s: f64) -> Polynomial {
        self.clone() * s
    }
}
