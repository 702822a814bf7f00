//! Vectors of polynomials: gradients, velocity fields, piecewise data.

use crate::discretization::polynomial::Polynomial;
use crate::geometry::point::Point;
use std::ops::{Index, IndexMut, Mul};

#[derive(Clone, Debug, PartialEq)]
pub struct VectorPolynomial(Vec<Polynomial>);

impl VectorPolynomial {
    /// `n` zero polynomials of dimension `d` and the given order.
    pub fn new(d: usize, n: usize, order: usize) -> Self {
        Self(vec![Polynomial::new(d, order); n])
    }

    pub fn from_components(components: Vec<Polynomial>) -> Self {
        Self(components)
    }

    /// `grad p`, one component per space direction.
    pub fn gradient(p: &Polynomial) -> Self {
        Self((0..p.dimension()).map(|i| p.derivative(i)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Polynomial> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Polynomial> {
        self.0.iter_mut()
    }

    /// `sum_i p_i v_i`
    pub fn dot_point(&self, v: &Point) -> Polynomial {
        let mut out = match self.0.first() {
            Some(p0) => {
                let mut z = Polynomial::new(p0.dimension(), 0);
                z.set_origin(*p0.origin());
                z
            }
            None => return Polynomial::new(v.dim(), 0),
        };
        for (i, p) in self.0.iter().enumerate() {
            if v[i] != 0.0 {
                out += &(p * v[i]);
            }
        }
        out
    }

    /// `sum_i p_i q_i` over the common components.
    pub fn dot(&self, other: &VectorPolynomial) -> Polynomial {
        let mut terms = self.0.iter().zip(&other.0).map(|(p, q)| p * q);
        let first = terms.next();
        match first {
            Some(mut acc) => {
                for t in terms {
                    acc += &t;
                }
                acc
            }
            None => Polynomial::new(1, 0),
        }
    }

    /// Re-expand every component about `origin`.
    pub fn change_origin(&mut self, origin: &Point) {
        for p in &mut self.0 {
            p.change_origin(origin);
        }
    }

    /// Highest component order.
    pub fn order(&self) -> usize {
        self.0.iter().map(Polynomial::order).max().unwrap_or(0)
    }
}

impl Index<usize> for VectorPolynomial {
    type Output = Polynomial;
    fn index(&self, i: usize) -> &Polynomial {
        &self.0[i]
    }
}

impl IndexMut<usize> for VectorPolynomial {
    fn index_mut(&mut self, i: usize) -> &mut Polynomial {
        &mut self.0[i]
    }
}

impl Mul<&Point> for &VectorPolynomial {
    type Output = Polynomial;
    fn mul(self, v: &Point) -> Polynomial {
        self.dot_point(v)
    }
}

impl Mul<&VectorPolynomial> for &VectorPolynomial {
    type Output = Polynomial;
    fn mul(self, other: &VectorPolynomial) -> Polynomial {
        self.dot(other)
    }
}
