//! Derived geometry of a mesh: computed once from the backend, recomputed
//! wholesale after any node moves.

use crate::geometry::cell_geometry::{
    compute_hex_volumes, cross_product, hex_centroid, quad_face_centroid, quad_face_normal, sub,
    tri_face_centroid, Xyz,
};
use crate::geometry::metrics::{polygon_area_centroid_normal, polyhedron_volume_centroid};
use crate::geometry::point::Point;
use crate::mesh::framework::MeshFramework;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::EntityId;

/// Adjacency tables copied out of the backend.
#[derive(Clone, Debug, Default)]
pub(crate) struct MeshTopology {
    pub face_nodes: Vec<Vec<EntityId>>,
    pub cell_faces: Vec<Vec<EntityId>>,
    pub cell_dirs: Vec<Vec<i32>>,
    pub cell_nodes: Vec<Vec<EntityId>>,
    pub cell_types: Vec<CellType>,
    /// Cells of each face, ascending.
    pub face_cells: Vec<Vec<EntityId>>,
}

impl MeshTopology {
    pub fn build<B: MeshFramework>(backend: &B, nfaces: usize, ncells: usize) -> Result<Self, MeshError> {
        let mut topo = MeshTopology {
            face_nodes: (0..nfaces)
                .map(|f| backend.face_get_nodes(f))
                .collect::<Result<_, _>>()?,
            face_cells: vec![Vec::new(); nfaces],
            ..Default::default()
        };
        for c in 0..ncells {
            let (faces, dirs) = backend.cell_get_faces_and_dirs(c)?;
            for &f in &faces {
                topo.face_cells[f].push(c);
            }
            topo.cell_faces.push(faces);
            topo.cell_dirs.push(dirs);
            topo.cell_nodes.push(backend.cell_get_nodes(c)?);
            topo.cell_types.push(backend.cell_get_type(c)?);
        }
        for (f, cells) in topo.face_cells.iter().enumerate() {
            if cells.is_empty() || cells.len() > 2 {
                return Err(MeshError::InvalidTopology(format!(
                    "face {f} is adjacent to {} cells",
                    cells.len()
                )));
            }
        }
        Ok(topo)
    }
}

/// Measures, centroids and natural normals of faces and cells.
#[derive(Clone, Debug, Default)]
pub(crate) struct MeshGeometry {
    pub cell_volumes: Vec<f64>,
    pub cell_centroids: Vec<Point>,
    pub face_areas: Vec<f64>,
    pub face_centroids: Vec<Point>,
    /// Area-weighted natural normals.
    pub face_normals: Vec<Point>,
}

impl MeshGeometry {
    pub fn compute<B: MeshFramework>(
        backend: &B,
        topo: &MeshTopology,
        nnodes: usize,
    ) -> Result<Self, MeshError> {
        let coords: Vec<Point> = (0..nnodes)
            .map(|n| backend.node_get_coordinates(n))
            .collect::<Result<_, _>>()?;
        match backend.manifold_dimension() {
            2 => Self::compute_surface(backend.space_dimension(), topo, &coords),
            _ => Self::compute_volume(backend.has_standard_cell_nodes(), topo, &coords),
        }
    }

    /// 2-manifolds in 2D or 3D: faces are segments.
    fn compute_surface(space_dim: usize, topo: &MeshTopology, x: &[Point]) -> Result<Self, MeshError> {
        let ncells = topo.cell_faces.len();
        let mut geom = MeshGeometry::default();
        let mut cell_unit_normals = Vec::with_capacity(ncells);

        for c in 0..ncells {
            let (area, centroid, unit) = if space_dim == 2 {
                let segments: Vec<(Point, Point)> = topo.cell_faces[c]
                    .iter()
                    .zip(&topo.cell_dirs[c])
                    .map(|(&f, &d)| {
                        let (a, b) = (x[topo.face_nodes[f][0]], x[topo.face_nodes[f][1]]);
                        if d > 0 { (a, b) } else { (b, a) }
                    })
                    .collect();
                let (area, centroid) = oriented_loop_area_centroid(&segments);
                (area, centroid, Point::zero(3))
            } else {
                let nodes: Vec<Point> = topo.cell_nodes[c].iter().map(|&n| x[n]).collect();
                let m = polygon_area_centroid_normal(&nodes)?;
                (m.area, m.centroid, m.normal / m.area)
            };
            if area <= 0.0 {
                return Err(MeshError::DegenerateCell { cell: c, volume: area });
            }
            geom.cell_volumes.push(area);
            geom.cell_centroids.push(centroid);
            cell_unit_normals.push(unit);
        }

        for (f, fnodes) in topo.face_nodes.iter().enumerate() {
            let (a, b) = (x[fnodes[0]], x[fnodes[1]]);
            let t = b - a;
            let normal = if space_dim == 2 {
                Point::new2(t[1], -t[0])
            } else {
                let c = topo.face_cells[f][0];
                t.cross(&cell_unit_normals[c])
            };
            geom.face_areas.push(t.norm());
            geom.face_centroids.push((a + b) * 0.5);
            geom.face_normals.push(normal);
        }
        Ok(geom)
    }

    /// 3D cells with polygonal faces.
    fn compute_volume(standard_nodes: bool, topo: &MeshTopology, x: &[Point]) -> Result<Self, MeshError> {
        let mut geom = MeshGeometry::default();
        for fnodes in &topo.face_nodes {
            let pts: Vec<Xyz> = fnodes.iter().map(|&n| x[n].xyz()).collect();
            let (normal, centroid) = match pts.len() {
                3 => {
                    let n = cross_product(&sub(&pts[1], &pts[0]), &sub(&pts[2], &pts[0]));
                    (n.map(|v| 0.5 * v), tri_face_centroid(&pts[0], &pts[1], &pts[2]))
                }
                4 => (
                    quad_face_normal(&pts[0], &pts[1], &pts[2], &pts[3]),
                    quad_face_centroid(&[pts[0], pts[1], pts[2], pts[3]]),
                ),
                _ => {
                    let nodes: Vec<Point> = fnodes.iter().map(|&n| x[n]).collect();
                    let m = polygon_area_centroid_normal(&nodes)?;
                    (m.normal.xyz(), m.centroid.xyz())
                }
            };
            let normal = Point::new3(normal[0], normal[1], normal[2]);
            geom.face_areas.push(normal.norm());
            geom.face_centroids.push(Point::new3(centroid[0], centroid[1], centroid[2]));
            geom.face_normals.push(normal);
        }

        for c in 0..topo.cell_faces.len() {
            let (volume, centroid) = if standard_nodes
                && topo.cell_types[c] == CellType::Hexahedron
                && topo.cell_nodes[c].len() == 8
            {
                let mut hx: [Xyz; 8] = [[0.0; 3]; 8];
                for (dst, &n) in hx.iter_mut().zip(&topo.cell_nodes[c]) {
                    *dst = x[n].xyz();
                }
                let (hvol, _) = compute_hex_volumes(&hx);
                let [cx, cy, cz] = hex_centroid(&hx);
                (hvol, Point::new3(cx, cy, cz))
            } else {
                let faces: Vec<(Vec<Point>, i32)> = topo.cell_faces[c]
                    .iter()
                    .zip(&topo.cell_dirs[c])
                    .map(|(&f, &d)| (topo.face_nodes[f].iter().map(|&n| x[n]).collect(), d))
                    .collect();
                polyhedron_volume_centroid(&faces).map_err(|_| MeshError::DegenerateCell {
                    cell: c,
                    volume: 0.0,
                })?
            };
            if volume <= 0.0 {
                return Err(MeshError::DegenerateCell { cell: c, volume });
            }
            geom.cell_volumes.push(volume);
            geom.cell_centroids.push(centroid);
        }
        Ok(geom)
    }
}

/// Area and centroid of a 2D cell from its boundary segments, each oriented
/// counter-clockwise about the cell. Segment order does not matter.
fn oriented_loop_area_centroid(segments: &[(Point, Point)]) -> (f64, Point) {
    let mut c0 = Point::zero(2);
    for (a, _) in segments {
        c0 += *a;
    }
    let c0 = c0 / segments.len().max(1) as f64;

    let mut area = 0.0;
    let mut centroid = Point::zero(2);
    for (a, b) in segments {
        let u = *a - c0;
        let v = *b - c0;
        let tri = 0.5 * (u[0] * v[1] - u[1] * v[0]);
        area += tri;
        centroid += (c0 + *a + *b) * (tri / 3.0);
    }
    if area == 0.0 {
        return (0.0, c0);
    }
    (area, centroid / area)
}
