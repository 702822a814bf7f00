#![allow(dead_code)]
use mimetic_sieve::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub fn model(dim: usize, regions: Vec<Region>) -> Arc<GeometricModel> {
    Arc::new(GeometricModel::new(dim, regions).unwrap())
}

pub fn structured(opts: &StructuredMeshOptions, gm: Arc<GeometricModel>) -> Arc<Mesh> {
    let backend = StructuredMesh::new(opts).unwrap();
    Arc::new(Mesh::new(backend, gm, VerboseObject::silent("mesh")).unwrap())
}

/// `nx x ny` cells on `[0, lx] x [0, ly]`.
pub fn rectangle(nx: usize, ny: usize, lx: f64, ly: f64) -> Arc<Mesh> {
    structured(
        &StructuredMeshOptions::rectangle([0.0, 0.0], [lx, ly], nx, ny),
        model(2, Vec::new()),
    )
}

pub fn brick(n: [usize; 3], hi: [f64; 3]) -> Arc<Mesh> {
    structured(
        &StructuredMeshOptions::brick([0.0; 3], hi, n[0], n[1], n[2]),
        model(3, Vec::new()),
    )
}

/// Unstructured quadrilateral grid of the unit square. Interior nodes are
/// moved by up to `jitter` cell widths, driven by `seed`.
pub fn jittered_quads(n: usize, jitter: f64, seed: u64) -> Arc<Mesh> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let h = 1.0 / n as f64;
    let mut nodes = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let mut x = i as f64 * h;
            let mut y = j as f64 * h;
            if jitter > 0.0 && i > 0 && i < n && j > 0 && j < n {
                x += rng.gen_range(-jitter..jitter) * h;
                y += rng.gen_range(-jitter..jitter) * h;
            }
            nodes.push(Point::new2(x, y));
        }
    }
    let id = |i: usize, j: usize| j * (n + 1) + i;
    let mut cells = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            cells.push(vec![id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    let backend = UnstructuredMesh::from_polygons(nodes, cells).unwrap();
    Arc::new(Mesh::new(backend, model(2, Vec::new()), VerboseObject::silent("mesh")).unwrap())
}

pub fn interior_faces(mesh: &Mesh) -> Vec<EntityId> {
    mesh.entity_ids(EntityKind::Face, ParallelType::Used)
        .filter(|&f| mesh.face_get_cells(f, ParallelType::Used).unwrap().len() == 2)
        .collect()
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!(
        (a - b).abs() <= tol * (1.0 + b.abs()),
        "values differ: {a} vs {b} (tol {tol})"
    );
}

pub fn assert_symmetric(m: &DenseMatrix, tol: f64) {
    assert!(m.is_symmetric(tol), "matrix is not symmetric:\n{m:?}");
}
