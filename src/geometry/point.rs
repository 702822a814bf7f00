//! Points and vectors in 2D or 3D.
//!
//! A [`Point`] always stores three components; only the first `dim` are
//! meaningful and the rest stay zero, so arithmetic never needs to branch on
//! the dimension.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    dim: usize,
    xyz: [f64; 3],
}

impl Point {
    /// Origin of the given dimension (1, 2 or 3).
    pub fn zero(dim: usize) -> Self {
        debug_assert!((1..=3).contains(&dim), "point dimension {dim}");
        Self {
            dim: dim.clamp(1, 3),
            xyz: [0.0; 3],
        }
    }

    pub fn new2(x: f64, y: f64) -> Self {
        Self {
            dim: 2,
            xyz: [x, y, 0.0],
        }
    }

    pub fn new3(x: f64, y: f64, z: f64) -> Self {
        Self {
            dim: 3,
            xyz: [x, y, z],
        }
    }

    /// Build from a slice; its length is the dimension.
    pub fn from_slice(x: &[f64]) -> Self {
        let mut p = Self::zero(x.len().clamp(1, 3));
        for (dst, src) in p.xyz.iter_mut().zip(x) {
            *dst = *src;
        }
        p
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The meaningful components.
    #[inline]
    pub fn coords(&self) -> &[f64] {
        &self.xyz[..self.dim]
    }

    /// All three components, zero padded.
    #[inline]
    pub fn xyz(&self) -> [f64; 3] {
        self.xyz
    }

    pub fn x(&self) -> f64 {
        self.xyz[0]
    }

    pub fn y(&self) -> f64 {
        self.xyz[1]
    }

    pub fn z(&self) -> f64 {
        self.xyz[2]
    }

    #[inline]
    pub fn dot(&self, other: &Point) -> f64 {
        self.xyz[0] * other.xyz[0] + self.xyz[1] * other.xyz[1] + self.xyz[2] * other.xyz[2]
    }

    /// Cross product. In 2D the result is a 1-D point holding the z component.
    pub fn cross(&self, other: &Point) -> Point {
        let [a0, a1, a2] = self.xyz;
        let [b0, b1, b2] = other.xyz;
        if self.dim == 2 {
            Point::from_slice(&[a0 * b1 - a1 * b0])
        } else {
            Point::new3(a1 * b2 - a2 * b1, a2 * b0 - a0 * b2, a0 * b1 - a1 * b0)
        }
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        super::cell_geometry::vector_length(self.coords())
    }

    /// Same point with the trailing components dropped (or zero-padded).
    pub fn with_dim(&self, dim: usize) -> Point {
        let mut p = Point::zero(dim);
        p.xyz[..p.dim].copy_from_slice(&self.xyz[..p.dim]);
        p
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }
}

impl Index<usize> for Point {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.xyz[i]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.xyz[i]
    }
}

impl Add for Point {
    type Output = Point;
    fn add(mut self, rhs: Point) -> Point {
        self += rhs;
        self
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        for i in 0..3 {
            self.xyz[i] += rhs.xyz[i];
        }
        self.dim = self.dim.max(rhs.dim);
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(mut self, rhs: Point) -> Point {
        self -= rhs;
        self
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        for i in 0..3 {
            self.xyz[i] -= rhs.xyz[i];
        }
        self.dim = self.dim.max(rhs.dim);
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(mut self) -> Point {
        for v in &mut self.xyz {
            *v = -*v;
        }
        self
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(mut self, s: f64) -> Point {
        for v in &mut self.xyz {
            *v *= s;
        }
        self
    }
}

impl Mul<Point> for f64 {
    type Output = Point;
    fn mul(self, p: Point) -> Point {
        p * self
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(mut self, s: f64) -> Point {
        for v in &mut self.xyz {
            *v /= s;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_keeps_dimension() {
        let a = Point::new2(1.0, 2.0);
        let b = Point::new2(3.0, -1.0);
        let c = a + b * 2.0;
        assert_eq!(c.dim(), 2);
        assert_eq!(c.coords(), &[7.0, 0.0]);
        assert_eq!((-a).x(), -1.0);
        assert_eq!(a.dot(&b), 1.0);
    }

    #[test]
    fn cross_products() {
        let a = Point::new2(1.0, 0.0);
        let b = Point::new2(0.0, 1.0);
        let z = a.cross(&b);
        assert_eq!(z.dim(), 1);
        assert_eq!(z[0], 1.0);
        let e = Point::new3(1.0, 0.0, 0.0).cross(&Point::new3(0.0, 1.0, 0.0));
        assert_eq!(e.coords(), &[0.0, 0.0, 1.0]);
        assert!((Point::new3(3.0, 4.0, 0.0).norm() - 5.0).abs() < 1e-15);
    }
}
