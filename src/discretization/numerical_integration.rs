//! Exact integration of polynomial products on simplices and mesh entities.
//!
//! Triangles and tetrahedra are mapped from the unit square/cube by
//! collapsed (Duffy) coordinates, so tensor Gauss-Legendre rules on `[0, 1]`
//! integrate polynomials exactly. Faces and cells are split into simplex
//! fans about their centroids.

use crate::discretization::polynomial::Polynomial;
use crate::discretization::quadrature::rule_for_degree;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::EntityId;
use std::sync::Arc;

/// Integral over the segment `[x0, x1]` of a function of degree `degree`.
fn segment_integral(x0: &Point, x1: &Point, degree: usize, f: &impl Fn(&Point) -> f64) -> f64 {
    let len = (*x1 - *x0).norm();
    rule_for_degree(degree)
        .iter()
        .map(|(s, w)| w * f(&(*x0 + (*x1 - *x0) * s)))
        .sum::<f64>()
        * len
}

fn triangle_integral(x: &[Point; 3], degree: usize, f: &impl Fn(&Point) -> f64) -> f64 {
    let e1 = x[1] - x[0];
    let e2 = x[2] - x[1];
    let area = 0.5 * e1.cross(&(x[2] - x[0])).norm();
    let ru = rule_for_degree(degree + 1);
    let rv = rule_for_degree(degree);

    let mut sum = 0.0;
    for (u, wu) in ru.iter() {
        for (v, wv) in rv.iter() {
            let p = x[0] + e1 * u + e2 * (u * v);
            sum += wu * wv * u * f(&p);
        }
    }
    2.0 * area * sum
}

fn tet_integral(x: &[Point; 4], degree: usize, f: &impl Fn(&Point) -> f64) -> f64 {
    let e1 = x[1] - x[0];
    let e2 = x[2] - x[1];
    let e3 = x[3] - x[2];
    let vol = (x[1] - x[0]).cross(&(x[2] - x[0])).dot(&(x[3] - x[0])).abs() / 6.0;
    let ru = rule_for_degree(degree + 2);
    let rv = rule_for_degree(degree + 1);
    let rw = rule_for_degree(degree);

    let mut sum = 0.0;
    for (u, wu) in ru.iter() {
        for (v, wv) in rv.iter() {
            for (w, ww) in rw.iter() {
                let p = x[0] + e1 * u + e2 * (u * v) + e3 * (u * v * w);
                sum += wu * wv * ww * u * u * v * f(&p);
            }
        }
    }
    6.0 * vol * sum
}

fn product<'a>(polys: &'a [&'a Polynomial]) -> impl Fn(&Point) -> f64 + 'a {
    move |x| polys.iter().map(|p| p.value(x)).product()
}

fn product_degree(polys: &[&Polynomial]) -> usize {
    polys.iter().map(|p| p.order()).sum()
}

pub fn integrate_polynomials_segment(x0: &Point, x1: &Point, polys: &[&Polynomial]) -> f64 {
    segment_integral(x0, x1, product_degree(polys), &product(polys))
}

pub fn integrate_polynomials_triangle(x: &[Point; 3], polys: &[&Polynomial]) -> f64 {
    triangle_integral(x, product_degree(polys), &product(polys))
}

pub fn integrate_polynomials_tet(x: &[Point; 4], polys: &[&Polynomial]) -> f64 {
    tet_integral(x, product_degree(polys), &product(polys))
}

/// Integration over the faces and cells of one mesh.
#[derive(Clone, Debug)]
pub struct NumericalIntegration {
    mesh: Arc<Mesh>,
}

impl NumericalIntegration {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    fn coords(&self, nodes: &[EntityId]) -> Result<Vec<Point>, MeshError> {
        nodes.iter().map(|&n| self.mesh.node_get_coordinates(n)).collect()
    }

    /// Integral of `f` (a polynomial of degree `degree`) over face `f`.
    pub fn integrate_face_fn(
        &self,
        face: EntityId,
        degree: usize,
        f: impl Fn(&Point) -> f64,
    ) -> Result<f64, MeshError> {
        let x = self.coords(self.mesh.face_get_nodes(face)?)?;
        if self.mesh.manifold_dimension() == 2 {
            return Ok(segment_integral(&x[0], &x[1], degree, &f));
        }
        let xf = self.mesh.face_centroid(face)?;
        let n = x.len();
        Ok((0..n)
            .map(|i| triangle_integral(&[xf, x[i], x[(i + 1) % n]], degree, &f))
            .sum())
    }

    /// Integral of `f` (a polynomial of degree `degree`) over cell `c`.
    pub fn integrate_cell_fn(
        &self,
        c: EntityId,
        degree: usize,
        f: impl Fn(&Point) -> f64,
    ) -> Result<f64, MeshError> {
        let xc = self.mesh.cell_centroid(c)?;
        let mut sum = 0.0;
        for &face in self.mesh.cell_get_faces(c)? {
            let x = self.coords(self.mesh.face_get_nodes(face)?)?;
            if self.mesh.manifold_dimension() == 2 {
                sum += triangle_integral(&[xc, x[0], x[1]], degree, &f);
            } else {
                let xf = self.mesh.face_centroid(face)?;
                let n = x.len();
                for i in 0..n {
                    sum += tet_integral(&[xc, xf, x[i], x[(i + 1) % n]], degree, &f);
                }
            }
        }
        Ok(sum)
    }

    /// Integral of the product of `polys` over face `f`.
    pub fn integrate_polynomials_face(&self, f: EntityId, polys: &[&Polynomial]) -> Result<f64, MeshError> {
        self.integrate_face_fn(f, product_degree(polys), product(polys))
    }

    /// Integral of the product of `polys` over cell `c`.
    pub fn integrate_polynomials_cell(&self, c: EntityId, polys: &[&Polynomial]) -> Result<f64, MeshError> {
        self.integrate_cell_fn(c, product_degree(polys), product(polys))
    }

    /// `|c|^(-k/d)`: scale of a degree-`k` natural monomial.
    pub fn monomial_natural_scales(&self, c: EntityId, k: usize) -> Result<f64, MeshError> {
        let vol = self.mesh.cell_volume(c)?;
        let d = self.mesh.manifold_dimension() as f64;
        Ok(vol.powf(-(k as f64) / d))
    }

    /// Rewrite the coefficients of `p` (expanded about the centroid of `c`)
    /// in the natural monomials `((x - x_c)/h)^a`.
    pub fn change_basis_regular_to_natural(&self, c: EntityId, p: &mut Polynomial) -> Result<(), MeshError> {
        self.rescale(c, p, true)
    }

    pub fn change_basis_natural_to_regular(&self, c: EntityId, p: &mut Polynomial) -> Result<(), MeshError> {
        self.rescale(c, p, false)
    }

    fn rescale(&self, c: EntityId, p: &mut Polynomial, to_natural: bool) -> Result<(), MeshError> {
        let scales: Vec<f64> = (0..=p.order())
            .map(|k| self.monomial_natural_scales(c, k))
            .collect::<Result<_, _>>()?;
        let monomials: Vec<_> = p.iter_monomials().collect();
        for m in monomials {
            let s = scales[m.degree];
            let v = p[(m.degree, m.position)];
            p[(m.degree, m.position)] = if to_natural { v / s } else { v * s };
        }
        Ok(())
    }

    /// Integrals over cell `c` of the natural monomials of degree `k`,
    /// stored in block `k` of `integrals` (which grows if needed).
    pub fn integrate_monomials_cell(
        &self,
        c: EntityId,
        k: usize,
        integrals: &mut Polynomial,
    ) -> Result<(), MeshError> {
        if integrals.order() < k {
            integrals.reshape(k);
        }
        let d = integrals.dimension();
        let xc = self.mesh.cell_centroid(c)?;
        let scale = self.monomial_natural_scales(c, k)?;
        let block: Vec<_> = Polynomial::new(d, k)
            .iter_monomials()
            .filter(|m| m.degree == k)
            .collect();
        for m in block {
            let idx = m.multi_index;
            let v = self.integrate_cell_fn(c, k, |x| {
                (0..d).fold(scale, |acc, i| acc * (x[i] - xc[i]).powi(idx[i] as i32))
            })?;
            integrals[(k, m.position)] = v;
        }
        Ok(())
    }

    /// Integrals of all natural monomials of degree `<= order` over cell `c`.
    pub fn integrate_monomials_cell_all(&self, c: EntityId, order: usize) -> Result<Polynomial, MeshError> {
        let mut integrals = Polynomial::new(self.mesh.space_dimension(), order);
        for k in 0..=order {
            self.integrate_monomials_cell(c, k, &mut integrals)?;
        }
        Ok(integrals)
    }

    /// Maximum of `|p|` over face `f`, estimated from the face nodes, the
    /// face centroid and the quadrature points of the face.
    pub fn polynomial_max_value(&self, f: EntityId, p: &Polynomial) -> Result<f64, MeshError> {
        let x = self.coords(self.mesh.face_get_nodes(f)?)?;
        let xf = self.mesh.face_centroid(f)?;
        let mut vmax = x.iter().chain(std::iter::once(&xf)).fold(0.0_f64, |m, y| m.max(p.value(y).abs()));

        let rule = rule_for_degree(p.order());
        let n = x.len();
        let pieces: Vec<(Point, Point)> = if self.mesh.manifold_dimension() == 2 {
            vec![(x[0], x[1])]
        } else {
            (0..n).map(|i| (x[i], x[(i + 1) % n])).collect()
        };
        for (a, b) in pieces {
            for (s, _) in rule.iter() {
                let y = if self.mesh.manifold_dimension() == 2 {
                    a + (b - a) * s
                } else {
                    // points on the median from the centroid to the edge middle
                    xf + ((a + b) * 0.5 - xf) * s
                };
                vmax = vmax.max(p.value(&y).abs());
            }
        }
        Ok(vmax)
    }
}
