mod util;
use util::*;

use mimetic_sieve::prelude::*;
use std::sync::Arc;

fn mfd(mesh: Arc<Mesh>) -> Mfd3dDiffusion {
    Mfd3dDiffusion::new(mesh, MfdOptions::default(), VerboseObject::silent("mfd"))
}

fn anisotropic(d: usize) -> Tensor {
    if d == 2 {
        Tensor::from_rows(&[vec![2.0, 0.3], vec![0.3, 1.0]]).unwrap()
    } else {
        Tensor::from_rows(&[vec![2.0, 0.3, 0.0], vec![0.3, 1.0, 0.1], vec![0.0, 0.1, 3.0]]).unwrap()
    }
}

/// Unit outward normals and area-weighted face arms of cell `c`.
fn face_data(mesh: &Mesh, c: EntityId) -> (Vec<Point>, Vec<Point>) {
    let xc = mesh.cell_centroid(c).unwrap();
    let mut units = Vec::new();
    let mut arms = Vec::new();
    for &f in mesh.cell_get_faces(c).unwrap() {
        let area = mesh.face_area(f).unwrap();
        let (n, _) = mesh.face_normal_oriented(f, c).unwrap();
        units.push(n / area);
        arms.push((mesh.face_centroid(f).unwrap() - xc) * area);
    }
    (units, arms)
}

fn check_mass_consistency(mesh: Arc<Mesh>) {
    let d = mesh.space_dimension();
    let k = anisotropic(d);
    let kinv = k.inverse().unwrap();
    let solver = mfd(Arc::clone(&mesh));
    let u = if d == 2 {
        Point::new2(1.0, -2.0)
    } else {
        Point::new3(1.0, -2.0, 0.5)
    };
    let kinv_u = kinv.apply(&u);
    let k_u = k.apply(&u);

    for c in mesh.entity_ids(EntityKind::Cell, ParallelType::Used) {
        let (units, arms) = face_data(&mesh, c);

        // M (N u) = R K^-1 u for a constant velocity u
        let m = solver.mass_matrix(c, &k).unwrap();
        assert_symmetric(&m, 1e-12);
        let fluxes: Vec<f64> = units.iter().map(|n| n.dot(&u)).collect();
        for (i, v) in m.matvec(&fluxes).unwrap().iter().enumerate() {
            assert_close(*v, arms[i].dot(&kinv_u), 1e-11);
        }

        // W (R u) = N K u
        let w = solver.mass_matrix_inverse(c, &k).unwrap();
        assert_symmetric(&w, 1e-12);
        let moments: Vec<f64> = arms.iter().map(|r| r.dot(&u)).collect();
        for (i, v) in w.matvec(&moments).unwrap().iter().enumerate() {
            assert_close(*v, units[i].dot(&k_u), 1e-11);
        }
    }
}

#[test]
fn mass_matrices_are_exact_for_constant_velocities_2d() {
    check_mass_consistency(jittered_quads(3, 0.2, 21));
}

#[test]
fn mass_matrices_are_exact_for_constant_velocities_3d() {
    check_mass_consistency(brick([2, 1, 1], [1.0, 0.5, 2.0]));
}

#[test]
fn nodal_stiffness_is_exact_for_linear_fields() {
    for mesh in [jittered_quads(3, 0.2, 4), brick([1, 2, 1], [1.0, 2.0, 0.5])] {
        let d = mesh.space_dimension();
        let k = anisotropic(d);
        let solver = mfd(Arc::clone(&mesh));
        let g = if d == 2 {
            Point::new2(1.0, 2.0)
        } else {
            Point::new3(1.0, 2.0, -1.0)
        };
        for c in mesh.entity_ids(EntityKind::Cell, ParallelType::Used) {
            let a = solver.stiffness_matrix(c, &k).unwrap();
            assert_symmetric(&a, 1e-12);
            let u: Vec<f64> = mesh
                .cell_get_nodes(c)
                .unwrap()
                .iter()
                .map(|&n| 0.7 + g.dot(&mesh.node_get_coordinates(n).unwrap()))
                .collect();
            let au = a.matvec(&u).unwrap();
            let energy: f64 = au.iter().zip(&u).map(|(x, y)| x * y).sum();
            let exact = mesh.cell_volume(c).unwrap() * g.dot(&k.apply(&g));
            assert_close(energy, exact, 1e-11);
        }
    }
}

#[test]
fn fixed_stability_scale_is_used() {
    let mesh = rectangle(1, 1, 1.0, 1.0);
    let options = MfdOptions {
        stability: StabilityMethod::Fixed(4.0),
        scaling: 0.5,
        ..Default::default()
    };
    let solver = Mfd3dDiffusion::new(Arc::clone(&mesh), options, VerboseObject::silent("mfd"));
    let k = Tensor::scalar(2, 1.0);

    let mut n = DenseMatrix::zeros(4, 2);
    let mut mc = DenseMatrix::zeros(4, 4);
    solver.l2_consistency(0, &k, &mut n, &mut mc, false).unwrap();
    let m = solver.mass_matrix(0, &k).unwrap();
    // the stability term adds 2 (I - P) where P projects on the normals
    let mut ms = m.clone();
    ms -= &mc;
    assert_close(ms.trace(), 2.0 * (4.0 - 2.0), 1e-12);
    assert_symmetric(&m, 1e-14);
}

#[test]
fn tpfa_and_diagonal_inverses_on_a_brick() {
    let mesh = brick([1, 1, 1], [1.0, 2.0, 0.5]);
    let solver = mfd(Arc::clone(&mesh));
    let k = Tensor::scalar(3, 3.0);
    let tpfa = solver.mass_matrix_inverse_tpfa(0, &k).unwrap();
    let faces = mesh.cell_get_faces(0).unwrap();
    for (i, &f) in faces.iter().enumerate() {
        let t = solver.transmissibility(f, 0, &k).unwrap();
        let area = mesh.face_area(f).unwrap();
        assert_close(tpfa[(i, i)], t / (area * area), 1e-12);
        let dist = (mesh.face_centroid(f).unwrap() - mesh.cell_centroid(0).unwrap()).norm();
        assert_close(t, 3.0 * area / dist, 1e-12);
    }
    let diag = solver.mass_matrix_inverse_diagonal(0, &k).unwrap();
    assert_close(diag[(0, 0)], 6.0 * 3.0 / (3.0 * 1.0), 1e-12);
    assert_eq!(diag[(0, 1)], 0.0);
}

#[test]
fn tensors_of_the_wrong_dimension_are_rejected() {
    let mesh = brick([1, 1, 1], [1.0; 3]);
    let solver = mfd(Arc::clone(&mesh));
    let k2 = Tensor::scalar(2, 1.0);
    let is_rejected = |err: MeshError| {
        matches!(
            err,
            MeshError::MatrixSizeMismatch {
                what: "tensor dimension",
                expected: 3,
                found: 2
            }
        )
    };
    assert!(is_rejected(solver.mass_matrix(0, &k2).unwrap_err()));
    assert!(is_rejected(solver.mass_matrix_inverse(0, &k2).unwrap_err()));
    assert!(is_rejected(solver.stiffness_matrix(0, &k2).unwrap_err()));
    assert!(is_rejected(solver.mass_matrix_inverse_tpfa(0, &k2).unwrap_err()));
    assert!(is_rejected(solver.mass_matrix_inverse_diagonal(0, &k2).unwrap_err()));
    assert!(is_rejected(solver.transmissibility(0, 0, &k2).unwrap_err()));
    assert!(is_rejected(
        solver.recover_gradient_mass_matrix(0, &k2, &[0.0; 6]).unwrap_err()
    ));
    let mut n = DenseMatrix::zeros(6, 3);
    let mut mc = DenseMatrix::zeros(6, 6);
    let err = solver.l2_consistency(0, &k2, &mut n, &mut mc, true).unwrap_err();
    assert_eq!(err.status_code(), 1);

    // all six faces of the unit cube are alike
    let m = solver.mass_matrix(0, &Tensor::scalar(3, 1.0)).unwrap();
    for i in 1..6 {
        assert_close(m[(i, i)], m[(0, 0)], 1e-13);
    }
}

#[test]
fn gradients_are_recovered_from_fluxes_and_nodal_values() {
    for mesh in [jittered_quads(3, 0.2, 8), brick([2, 1, 1], [1.0, 0.5, 2.0])] {
        let d = mesh.space_dimension();
        let k = anisotropic(d);
        let solver = mfd(Arc::clone(&mesh));
        let g = if d == 2 {
            Point::new2(0.5, -1.5)
        } else {
            Point::new3(0.5, -1.5, 2.0)
        };
        // Darcy velocity of the pressure gradient g
        let u = -k.apply(&g);
        for c in mesh.entity_ids(EntityKind::Cell, ParallelType::Used) {
            let (units, _) = face_data(&mesh, c);
            let fluxes: Vec<f64> = units.iter().map(|n| n.dot(&u)).collect();
            let grad = solver.recover_gradient_mass_matrix(c, &k, &fluxes).unwrap();
            for i in 0..d {
                assert_close(grad[i], g[i], 1e-11);
            }

            let values: Vec<f64> = mesh
                .cell_get_nodes(c)
                .unwrap()
                .iter()
                .map(|&n| 2.0 + g.dot(&mesh.node_get_coordinates(n).unwrap()))
                .collect();
            let grad = solver.recover_gradient_stiffness_matrix(c, &values).unwrap();
            for i in 0..d {
                assert_close(grad[i], g[i], 1e-11);
            }
        }
    }

    let mesh = rectangle(1, 1, 1.0, 1.0);
    let solver = mfd(mesh);
    assert!(matches!(
        solver.recover_gradient_stiffness_matrix(0, &[1.0; 3]),
        Err(MeshError::MatrixSizeMismatch { what: "nodal solution", .. })
    ));
}
