//! Measures of general polygons and polyhedra.
//!
//! Polygons are split into a triangle fan about their vertex average and
//! polyhedra into a tet fan about an interior reference point. Both are exact
//! for planar faces; warped faces are approximated by their fan.

use crate::geometry::cell_geometry::{cross_product, sub, triple_product, vector_length, Xyz};
use crate::geometry::point::Point;
use crate::mesh_error::MeshError;

/// Area, centroid and normal of a polygon.
///
/// For a 3D polygon `normal` is the area-weighted normal, oriented by the
/// vertex order (right-hand rule). For a 2D polygon it is a 1-D point holding
/// the signed area (positive for counter-clockwise vertices).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonMetrics {
    pub area: f64,
    pub centroid: Point,
    pub normal: Point,
}

fn vertex_average(nodes: &[Point]) -> Point {
    let dim = nodes[0].dim();
    let mut c = Point::zero(dim);
    for p in nodes {
        c += *p;
    }
    c / nodes.len() as f64
}

pub fn polygon_area_centroid_normal(nodes: &[Point]) -> Result<PolygonMetrics, MeshError> {
    let n = nodes.len();
    if n < 3 {
        return Err(MeshError::InvalidGeometry(format!(
            "polygon has {n} vertices, needs at least 3"
        )));
    }
    let dim = nodes[0].dim();
    let c0 = vertex_average(nodes);

    match dim {
        2 => {
            let mut area = 0.0;
            let mut centroid = Point::zero(2);
            for i in 0..n {
                let a = nodes[i] - c0;
                let b = nodes[(i + 1) % n] - c0;
                let tri = 0.5 * (a[0] * b[1] - a[1] * b[0]);
                area += tri;
                centroid += (c0 + nodes[i] + nodes[(i + 1) % n]) * (tri / 3.0);
            }
            if area == 0.0 {
                return Err(MeshError::InvalidGeometry("polygon has zero area".into()));
            }
            Ok(PolygonMetrics {
                area: area.abs(),
                centroid: centroid / area,
                normal: Point::from_slice(&[area]),
            })
        }
        3 => {
            let c0x = c0.xyz();
            let mut normal: Xyz = [0.0; 3];
            let mut tris = Vec::with_capacity(n);
            for i in 0..n {
                let u = sub(&nodes[i].xyz(), &c0x);
                let v = sub(&nodes[(i + 1) % n].xyz(), &c0x);
                let t = cross_product(&u, &v);
                for k in 0..3 {
                    normal[k] += 0.5 * t[k];
                }
                tris.push(t);
            }
            let area = vector_length(&normal);
            if area == 0.0 {
                return Err(MeshError::InvalidGeometry("polygon has zero area".into()));
            }
            // Signed triangle areas along the polygon normal keep the
            // centroid correct for non-convex polygons.
            let mut centroid = Point::zero(3);
            for (i, t) in tris.iter().enumerate() {
                let tri = 0.5 * (t[0] * normal[0] + t[1] * normal[1] + t[2] * normal[2]) / area;
                centroid += (c0 + nodes[i] + nodes[(i + 1) % n]) * (tri / 3.0);
            }
            Ok(PolygonMetrics {
                area,
                centroid: centroid / area,
                normal: Point::new3(normal[0], normal[1], normal[2]),
            })
        }
        _ => Err(MeshError::InvalidGeometry(format!(
            "polygon in dimension {dim}"
        ))),
    }
}

/// Volume and centroid of a polyhedron.
///
/// `faces` lists, for each face, its vertices and a direction: `+1` when the
/// vertex order's right-hand normal points out of the cell, `-1` otherwise.
pub fn polyhedron_volume_centroid(faces: &[(Vec<Point>, i32)]) -> Result<(f64, Point), MeshError> {
    if faces.len() < 4 {
        return Err(MeshError::InvalidGeometry(format!(
            "polyhedron has {} faces, needs at least 4",
            faces.len()
        )));
    }
    let all: Vec<Point> = faces.iter().flat_map(|(f, _)| f.iter().copied()).collect();
    if all.iter().any(|p| p.dim() != 3) {
        return Err(MeshError::InvalidGeometry(
            "polyhedron vertices must be 3D".into(),
        ));
    }
    let p = vertex_average(&all).xyz();

    let mut volume = 0.0;
    let mut centroid = [0.0; 3];
    for (nodes, dir) in faces {
        let fc = polygon_area_centroid_normal(nodes)?.centroid.xyz();
        let a = sub(&fc, &p);
        let n = nodes.len();
        for i in 0..n {
            let u = sub(&nodes[i].xyz(), &p);
            let v = sub(&nodes[(i + 1) % n].xyz(), &p);
            let tvol = f64::from(*dir) * triple_product(&a, &u, &v) / 6.0;
            volume += tvol;
            for k in 0..3 {
                centroid[k] += tvol * (3.0 * p[k] + fc[k] + u[k] + v[k]) / 4.0;
            }
        }
    }
    if volume <= 0.0 {
        return Err(MeshError::InvalidGeometry(format!(
            "polyhedron has non-positive volume {volume}"
        )));
    }
    let [cx, cy, cz] = centroid.map(|ci| ci / volume);
    Ok((volume, Point::new3(cx, cy, cz)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn l_shaped_polygon() {
        let nodes = [
            Point::new2(0.0, 0.0),
            Point::new2(2.0, 0.0),
            Point::new2(2.0, 1.0),
            Point::new2(1.0, 1.0),
            Point::new2(1.0, 2.0),
            Point::new2(0.0, 2.0),
        ];
        let m = polygon_area_centroid_normal(&nodes).unwrap();
        assert!(approx(m.area, 3.0));
        assert!(approx(m.centroid.x(), 5.0 / 6.0));
        assert!(approx(m.centroid.y(), 5.0 / 6.0));
        assert!(m.normal[0] > 0.0);
    }

    #[test]
    fn tilted_square_normal() {
        let nodes = [
            Point::new3(0.0, 0.0, 0.0),
            Point::new3(0.0, 1.0, 0.0),
            Point::new3(0.0, 1.0, 1.0),
            Point::new3(0.0, 0.0, 1.0),
        ];
        let m = polygon_area_centroid_normal(&nodes).unwrap();
        assert!(approx(m.area, 1.0));
        assert!(approx(m.normal.x(), 1.0));
        assert!(approx(m.centroid.y(), 0.5) && approx(m.centroid.z(), 0.5));
    }

    #[test]
    fn unit_tet_volume_centroid() {
        let o = Point::new3(0.0, 0.0, 0.0);
        let x = Point::new3(1.0, 0.0, 0.0);
        let y = Point::new3(0.0, 1.0, 0.0);
        let z = Point::new3(0.0, 0.0, 1.0);
        let faces = vec![
            (vec![o, y, x], 1),
            (vec![o, x, z], 1),
            (vec![o, z, y], 1),
            (vec![x, y, z], 1),
        ];
        let (v, c) = polyhedron_volume_centroid(&faces).unwrap();
        assert!(approx(v, 1.0 / 6.0));
        for k in 0..3 {
            assert!(approx(c[k], 0.25));
        }
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let err = polygon_area_centroid_normal(&[Point::new2(0.0, 0.0), Point::new2(1.0, 0.0)]);
        assert!(matches!(err, Err(MeshError::InvalidGeometry(_))));
    }
}
