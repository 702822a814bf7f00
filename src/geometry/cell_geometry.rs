//! Elementary geometry kernels on raw coordinate arrays.
//!
//! Hex vertex ordering follows the Exodus convention: the bottom face
//! `0,1,2,3` counter-clockwise seen from above, then the top face `4,5,6,7`
//! directly above it.
//!
//! The hex routines are exact only for hexes with planar faces. Warped faces
//! are approximated by the two-triangle splits below and no attempt is made
//! to detect them.

use num_traits::Float;

pub type Xyz = [f64; 3];

/// The ten tets used for hex volume and centroid: eight corner tets followed
/// by the two interior tets on the diagonals. Their signed volumes sum to
/// twice the hex volume.
pub const HEX_TET_VERTICES: [[usize; 4]; 10] = [
    [0, 1, 3, 4],
    [1, 2, 0, 5],
    [2, 3, 1, 6],
    [3, 0, 2, 7],
    [4, 7, 5, 0],
    [5, 4, 6, 1],
    [6, 5, 7, 2],
    [7, 6, 4, 3],
    [0, 2, 7, 5],
    [1, 3, 4, 6],
];

/// Hex faces as local vertex quadruples, each ordered so that
/// [`quad_face_normal`] points out of the hex.
pub const HEX_FACE_VERTICES: [[usize; 4]; 6] = [
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
    [0, 3, 2, 1],
    [4, 5, 6, 7],
];

pub fn dot_product<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Euclidean length.
///
/// For 2- and 3-vectors the largest magnitude is factored out before
/// squaring to avoid overflow and underflow. The zero vector has length 0.
pub fn vector_length<T: Float>(x: &[T]) -> T {
    match x.len() {
        2 | 3 => {
            let a = x.iter().fold(T::zero(), |m, v| m.max(v.abs()));
            if a == T::zero() {
                return T::zero();
            }
            let s = x.iter().fold(T::zero(), |acc, &v| {
                let r = v.abs() / a;
                acc + r * r
            });
            a * s.sqrt()
        }
        _ => x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt(),
    }
}

#[inline]
pub fn sub(a: &Xyz, b: &Xyz) -> Xyz {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn cross_product(a: &Xyz, b: &Xyz) -> Xyz {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// a · (b × c)
#[inline]
pub fn triple_product(a: &Xyz, b: &Xyz, c: &Xyz) -> f64 {
    a[0] * (b[1] * c[2] - b[2] * c[1])
        + a[1] * (b[2] * c[0] - b[0] * c[2])
        + a[2] * (b[0] * c[1] - b[1] * c[0])
}

/// Area-weighted normal of the quad `x1 x2 x3 x4`: half the cross product of
/// its diagonals.
pub fn quad_face_normal(x1: &Xyz, x2: &Xyz, x3: &Xyz, x4: &Xyz) -> Xyz {
    let v1 = sub(x3, x1);
    let v2 = sub(x4, x2);
    let n = cross_product(&v1, &v2);
    [0.5 * n[0], 0.5 * n[1], 0.5 * n[2]]
}

pub fn quad_face_area(x1: &Xyz, x2: &Xyz, x3: &Xyz, x4: &Xyz) -> f64 {
    vector_length(&quad_face_normal(x1, x2, x3, x4))
}

pub fn tri_face_area(x0: &Xyz, x1: &Xyz, x2: &Xyz) -> f64 {
    let a = cross_product(&sub(x1, x0), &sub(x2, x0));
    0.5 * vector_length(&a)
}

pub fn tri_face_centroid(x0: &Xyz, x1: &Xyz, x2: &Xyz) -> Xyz {
    [
        (x0[0] + x1[0] + x2[0]) / 3.0,
        (x0[1] + x1[1] + x2[1]) / 3.0,
        (x0[2] + x1[2] + x2[2]) / 3.0,
    ]
}

/// Centroid of a quad, split into triangles (0,1,3) and (2,3,1). Exact only
/// for planar quads.
pub fn quad_face_centroid(x: &[Xyz; 4]) -> Xyz {
    let a0 = tri_face_area(&x[0], &x[1], &x[3]);
    let a2 = tri_face_area(&x[2], &x[3], &x[1]);
    let c0 = tri_face_centroid(&x[0], &x[1], &x[3]);
    let c2 = tri_face_centroid(&x[2], &x[3], &x[1]);
    let mut c = [0.0; 3];
    for i in 0..3 {
        c[i] = (a0 * c0[i] + a2 * c2[i]) / (a0 + a2);
    }
    c
}

/// Signed volume of the tet; positive when `x2-x1, x3-x1, x4-x1` is a
/// right-handed frame.
pub fn tet_volume(x1: &Xyz, x2: &Xyz, x3: &Xyz, x4: &Xyz) -> f64 {
    triple_product(&sub(x2, x1), &sub(x3, x1), &sub(x4, x1)) / 6.0
}

/// Hex volume together with the eight corner-tet volumes.
pub fn compute_hex_volumes(x: &[Xyz; 8]) -> (f64, [f64; 8]) {
    let mut cvol = [0.0; 8];
    for (j, t) in HEX_TET_VERTICES.iter().take(8).enumerate() {
        cvol[j] = tet_volume(&x[t[0]], &x[t[1]], &x[t[2]], &x[t[3]]);
    }
    let mut hvol: f64 = cvol.iter().sum();
    for t in &HEX_TET_VERTICES[8..] {
        hvol += tet_volume(&x[t[0]], &x[t[1]], &x[t[2]], &x[t[3]]);
    }
    (0.5 * hvol, cvol)
}

pub fn hex_volume(x: &[Xyz; 8]) -> f64 {
    compute_hex_volumes(x).0
}

/// Outward area-weighted normals of the six hex faces, in
/// [`HEX_FACE_VERTICES`] order.
pub fn compute_hex_face_normals(x: &[Xyz; 8]) -> [Xyz; 6] {
    let mut a = [[0.0; 3]; 6];
    for (n, f) in a.iter_mut().zip(HEX_FACE_VERTICES.iter()) {
        *n = quad_face_normal(&x[f[0]], &x[f[1]], &x[f[2]], &x[f[3]]);
    }
    a
}

/// Hex centroid from the ten-tet decomposition. Exact for planar faces.
pub fn hex_centroid(x: &[Xyz; 8]) -> Xyz {
    let mut hvol = 0.0;
    let mut c = [0.0; 3];
    for t in &HEX_TET_VERTICES {
        let tvol = tet_volume(&x[t[0]], &x[t[1]], &x[t[2]], &x[t[3]]);
        hvol += tvol;
        for (i, ci) in c.iter_mut().enumerate() {
            let s: f64 = t.iter().map(|&k| x[k][i]).sum();
            *ci += tvol * s;
        }
    }
    hvol *= 0.5;
    c.map(|ci| ci / (8.0 * hvol))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> [Xyz; 8] {
        [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ]
    }

    #[test]
    fn vector_length_is_stable() {
        assert_eq!(vector_length(&[0.0_f64, 0.0]), 0.0);
        assert!((vector_length(&[3.0_f64, 4.0]) - 5.0).abs() < 1e-15);
        let big = vector_length(&[1e200_f64, 1e200, 0.0]);
        assert!(big.is_finite());
        assert!((big / 1e200 - 2.0_f64.sqrt()).abs() < 1e-14);
        assert!((vector_length(&[1.0_f64, 1.0, 1.0, 1.0]) - 2.0).abs() < 1e-15);
        assert!((vector_length(&[2.0_f32]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unit_cube_volume_and_centroid() {
        let x = unit_cube();
        let (hvol, cvol) = compute_hex_volumes(&x);
        assert!((hvol - 1.0).abs() < 1e-14);
        for v in cvol {
            assert!((v - 1.0 / 6.0).abs() < 1e-14);
        }
        let c = hex_centroid(&x);
        for ci in c {
            assert!((ci - 0.5).abs() < 1e-14);
        }
    }

    #[test]
    fn hex_normals_point_outward() {
        let x = unit_cube();
        let normals = compute_hex_face_normals(&x);
        let expected = [
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 0.0, -1.0],
            [0.0, 0.0, 1.0],
        ];
        for (n, e) in normals.iter().zip(expected.iter()) {
            for i in 0..3 {
                assert!((n[i] - e[i]).abs() < 1e-14, "{n:?} vs {e:?}");
            }
        }
    }

    #[test]
    fn tet_volume_changes_sign_under_swap() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let d = [0.0, 0.0, 1.0];
        let v = tet_volume(&a, &b, &c, &d);
        assert!((v - 1.0 / 6.0).abs() < 1e-15);
        assert!((tet_volume(&b, &a, &c, &d) + v).abs() < 1e-15);
    }

    #[test]
    fn quad_face_kernels() {
        let q = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        assert!((quad_face_area(&q[0], &q[1], &q[2], &q[3]) - 2.0).abs() < 1e-15);
        let c = quad_face_centroid(&q);
        assert!((c[0] - 1.0).abs() < 1e-15 && (c[1] - 0.5).abs() < 1e-15);
        assert!((tri_face_area(&q[0], &q[1], &q[2]) - 1.0).abs() < 1e-15);
    }
}
