mod util;
use util::*;

use mimetic_sieve::geometry::cell_geometry::{
    compute_hex_face_normals, hex_centroid, hex_volume, quad_face_normal, tet_volume, vector_length, Xyz,
};
use mimetic_sieve::prelude::*;
use proptest::prelude::*;

fn cube(lo: Xyz, h: Xyz) -> [Xyz; 8] {
    let mut x = [[0.0; 3]; 8];
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    for (xi, c) in x.iter_mut().zip(corners) {
        for a in 0..3 {
            xi[a] = lo[a] + c[a] * h[a];
        }
    }
    x
}

#[test]
fn unit_cube_hex_volume_is_one() {
    let x = cube([0.0; 3], [1.0; 3]);
    assert_close(hex_volume(&x), 1.0, 1e-14);
}

#[test]
fn sheared_hex_keeps_volume() {
    // x += 0.3 z is a shear with unit determinant; faces stay planar
    let mut x = cube([1.0, -2.0, 0.5], [2.0, 1.0, 3.0]);
    for p in &mut x {
        p[0] += 0.3 * p[2];
    }
    assert_close(hex_volume(&x), 6.0, 1e-13);
    let c = hex_centroid(&x);
    assert_close(c[0], 2.0 + 0.3 * 2.0, 1e-13);
    assert_close(c[2], 2.0, 1e-13);
}

#[test]
fn hex_face_normals_close_the_cell() {
    let x = cube([0.0; 3], [1.0, 2.0, 0.5]);
    let mut sum = [0.0; 3];
    for n in compute_hex_face_normals(&x) {
        for a in 0..3 {
            sum[a] += n[a];
        }
    }
    assert!(vector_length(&sum) < 1e-14);
}

#[test]
fn quad_normal_is_half_diagonal_cross() {
    let n = quad_face_normal(&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0], &[2.0, 3.0, 0.0], &[0.0, 3.0, 0.0]);
    assert_close(n[2], 6.0, 1e-15);
    assert_eq!((n[0], n[1]), (0.0, 0.0));
}

#[test]
fn vector_length_survives_extreme_magnitudes() {
    let tiny = vector_length(&[3e-200_f64, 4e-200]);
    assert!(tiny > 0.0);
    assert_close(tiny / 1e-200, 5.0, 1e-14);
    let big = vector_length(&[3e300_f64, 4e300, 0.0]);
    assert!(big.is_finite());
    assert_close(big / 1e300, 5.0, 1e-14);
}

#[test]
fn mesh_hex_volume_matches_kernel() {
    let mesh = brick([1, 1, 1], [1.0, 2.0, 0.5]);
    let x: Vec<Xyz> = mesh
        .cell_get_coordinates(0)
        .unwrap()
        .iter()
        .map(Point::xyz)
        .collect();
    let x: [Xyz; 8] = x.try_into().unwrap();
    assert_close(mesh.cell_volume(0).unwrap(), hex_volume(&x), 1e-14);
    assert_close(mesh.cell_volume(0).unwrap(), 1.0, 1e-14);
}

fn coord() -> impl Strategy<Value = f64> {
    -10.0..10.0f64
}

fn vertex() -> impl Strategy<Value = Xyz> {
    [coord(), coord(), coord()]
}

proptest! {
    #[test]
    fn tet_volume_is_antisymmetric(a in vertex(), b in vertex(), c in vertex(), d in vertex()) {
        let v = tet_volume(&a, &b, &c, &d);
        let tol = 1e-12 * (1.0 + v.abs()) * 1e3;
        prop_assert!((tet_volume(&b, &a, &c, &d) + v).abs() <= tol);
        prop_assert!((tet_volume(&a, &c, &b, &d) + v).abs() <= tol);
        prop_assert!((tet_volume(&a, &b, &d, &c) + v).abs() <= tol);
        prop_assert!((tet_volume(&d, &b, &c, &a) + v).abs() <= tol);
        // even permutation
        prop_assert!((tet_volume(&b, &c, &a, &d) - v).abs() <= tol);
    }
}
