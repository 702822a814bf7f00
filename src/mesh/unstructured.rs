//! Unstructured meshes given by explicit adjacency tables.
//!
//! The tables are face-to-nodes and cell-to-faces with orientation flags.
//! Edges are derived: in 2D they coincide with faces, in 3D they are the
//! distinct consecutive node pairs of the face loops.

use crate::geometry::point::Point;
use crate::mesh::framework::MeshFramework;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use crate::topology::labels::LabelSet;
use crate::topology::ownership::EntityOwnership;
use hashbrown::HashMap;
use itertools::Itertools;

#[derive(Clone, Debug)]
pub struct UnstructuredMesh {
    space_dim: usize,
    manifold_dim: usize,
    nodes: Vec<Point>,
    face_nodes: Vec<Vec<EntityId>>,
    cell_faces: Vec<Vec<EntityId>>,
    cell_dirs: Vec<Vec<i32>>,
    cell_nodes: Vec<Vec<EntityId>>,
    cell_types: Vec<CellType>,
    edge_nodes: Vec<(EntityId, EntityId)>,
    cell_edges: Vec<Vec<EntityId>>,
    ownership: EntityOwnership,
    labels: LabelSet,
}

fn edge_key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a < b { (a, b) } else { (b, a) }
}

impl UnstructuredMesh {
    /// Build a mesh from face-to-node and cell-to-face tables.
    ///
    /// All entities are owned; use [`UnstructuredMesh::with_ownership`] to
    /// declare trailing ghosts.
    pub fn new(
        nodes: Vec<Point>,
        face_nodes: Vec<Vec<EntityId>>,
        cell_faces: Vec<Vec<EntityId>>,
        cell_dirs: Vec<Vec<i32>>,
    ) -> Result<Self, MeshError> {
        let space_dim = nodes
            .first()
            .map(Point::dim)
            .ok_or_else(|| MeshError::InvalidTopology("mesh has no nodes".into()))?;
        if !(2..=3).contains(&space_dim) || nodes.iter().any(|p| p.dim() != space_dim) {
            return Err(MeshError::InvalidGeometry(
                "nodes must all be 2D or all be 3D".into(),
            ));
        }
        if cell_faces.len() != cell_dirs.len() {
            return Err(MeshError::MatrixSizeMismatch {
                what: "cell dirs",
                expected: cell_faces.len(),
                found: cell_dirs.len(),
            });
        }
        let nnodes = nodes.len();
        let nfaces = face_nodes.len();
        for (f, fnodes) in face_nodes.iter().enumerate() {
            let min = if space_dim == 2 { 2 } else { 3 };
            if fnodes.len() < min || (space_dim == 2 && fnodes.len() != 2) {
                return Err(MeshError::InvalidTopology(format!(
                    "face {f} has {} nodes",
                    fnodes.len()
                )));
            }
            if let Some(&n) = fnodes.iter().find(|&&n| n >= nnodes) {
                return Err(MeshError::InvalidEntityId {
                    kind: EntityKind::Node,
                    id: n,
                    count: nnodes,
                });
            }
        }
        for (c, (faces, dirs)) in cell_faces.iter().zip(&cell_dirs).enumerate() {
            if faces.len() != dirs.len() {
                return Err(MeshError::InvalidTopology(format!(
                    "cell {c} has {} faces but {} dirs",
                    faces.len(),
                    dirs.len()
                )));
            }
            if let Some(&f) = faces.iter().find(|&&f| f >= nfaces) {
                return Err(MeshError::InvalidEntityId {
                    kind: EntityKind::Face,
                    id: f,
                    count: nfaces,
                });
            }
            if dirs.iter().any(|d| d.abs() != 1) {
                return Err(MeshError::InvalidTopology(format!(
                    "cell {c} has a face direction other than +1/-1"
                )));
            }
        }

        let cell_nodes = cell_faces
            .iter()
            .zip(&cell_dirs)
            .map(|(faces, dirs)| Self::collect_cell_nodes(space_dim, &face_nodes, faces, dirs))
            .collect::<Result<Vec<_>, _>>()?;
        let cell_types = cell_faces
            .iter()
            .zip(&cell_nodes)
            .map(|(faces, cnodes)| match space_dim {
                2 => CellType::polygon(cnodes.len()),
                _ => CellType::polyhedron(faces.len(), cnodes.len()),
            })
            .collect();

        // Edges: faces themselves in 2D, loop segments in 3D.
        let mut edge_nodes = Vec::new();
        let mut cell_edges = Vec::with_capacity(cell_faces.len());
        if space_dim == 2 {
            edge_nodes = face_nodes.iter().map(|f| (f[0], f[1])).collect();
            cell_edges = cell_faces.clone();
        } else {
            let mut index: HashMap<(EntityId, EntityId), EntityId> = HashMap::new();
            let mut face_edges = Vec::with_capacity(nfaces);
            for fnodes in &face_nodes {
                let mut edges = Vec::with_capacity(fnodes.len());
                for (&a, &b) in fnodes.iter().circular_tuple_windows::<(_, _)>() {
                    let id = *index.entry(edge_key(a, b)).or_insert_with(|| {
                        edge_nodes.push(edge_key(a, b));
                        edge_nodes.len() - 1
                    });
                    edges.push(id);
                }
                face_edges.push(edges);
            }
            for faces in &cell_faces {
                let edges: Vec<EntityId> = faces
                    .iter()
                    .flat_map(|&f| face_edges[f].iter().copied())
                    .unique()
                    .collect();
                cell_edges.push(edges);
            }
        }

        let ownership =
            EntityOwnership::serial(nnodes, edge_nodes.len(), nfaces, cell_faces.len());
        Ok(Self {
            space_dim,
            manifold_dim: space_dim,
            nodes,
            face_nodes,
            cell_faces,
            cell_dirs,
            cell_nodes,
            cell_types,
            edge_nodes,
            cell_edges,
            ownership,
            labels: LabelSet::new(),
        })
    }

    /// Build a 2D mesh from polygons given by their vertex loops.
    ///
    /// Faces are created on first use with the orientation of the first cell
    /// traversing them; clockwise loops are reversed first, so every cell's
    /// nodes end up counter-clockwise.
    pub fn from_polygons(nodes: Vec<Point>, cells: Vec<Vec<EntityId>>) -> Result<Self, MeshError> {
        let mut face_nodes: Vec<Vec<EntityId>> = Vec::new();
        let mut index: HashMap<(EntityId, EntityId), (EntityId, usize)> = HashMap::new();
        let mut cell_faces = Vec::with_capacity(cells.len());
        let mut cell_dirs = Vec::with_capacity(cells.len());

        for (c, mut loop_nodes) in cells.into_iter().enumerate() {
            if loop_nodes.len() < 3 {
                return Err(MeshError::InvalidTopology(format!(
                    "polygon {c} has {} vertices",
                    loop_nodes.len()
                )));
            }
            if let Some(&n) = loop_nodes.iter().find(|&&n| n >= nodes.len()) {
                return Err(MeshError::InvalidEntityId {
                    kind: EntityKind::Node,
                    id: n,
                    count: nodes.len(),
                });
            }
            let twice_area: f64 = loop_nodes
                .iter()
                .circular_tuple_windows::<(_, _)>()
                .map(|(&a, &b)| nodes[a].x() * nodes[b].y() - nodes[b].x() * nodes[a].y())
                .sum();
            if twice_area < 0.0 {
                loop_nodes.reverse();
            }

            let mut faces = Vec::with_capacity(loop_nodes.len());
            let mut dirs = Vec::with_capacity(loop_nodes.len());
            for (&a, &b) in loop_nodes.iter().circular_tuple_windows::<(_, _)>() {
                match index.get_mut(&edge_key(a, b)) {
                    Some((f, uses)) => {
                        *uses += 1;
                        if *uses > 2 {
                            return Err(MeshError::InvalidTopology(format!(
                                "edge ({a}, {b}) is shared by more than two polygons"
                            )));
                        }
                        faces.push(*f);
                        dirs.push(if face_nodes[*f][0] == a { 1 } else { -1 });
                    }
                    None => {
                        face_nodes.push(vec![a, b]);
                        let f = face_nodes.len() - 1;
                        index.insert(edge_key(a, b), (f, 1));
                        faces.push(f);
                        dirs.push(1);
                    }
                }
            }
            cell_faces.push(faces);
            cell_dirs.push(dirs);
        }
        Self::new(nodes, face_nodes, cell_faces, cell_dirs)
    }

    /// Declare the trailing entities of each kind as ghosts.
    pub fn with_ownership(mut self, ownership: EntityOwnership) -> Result<Self, MeshError> {
        for kind in EntityKind::ALL {
            let expected = self.ownership.count(kind, ParallelType::Used);
            let found = ownership.count(kind, ParallelType::Used);
            if expected != found {
                return Err(MeshError::InvalidTopology(format!(
                    "ownership declares {found} used {kind}s, mesh has {expected}"
                )));
            }
        }
        self.ownership = ownership;
        Ok(self)
    }

    pub fn labels_mut(&mut self) -> &mut LabelSet {
        &mut self.labels
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    /// Cell nodes from the faces: a loop walk in 2D, first-appearance order in 3D.
    fn collect_cell_nodes(
        space_dim: usize,
        face_nodes: &[Vec<EntityId>],
        faces: &[EntityId],
        dirs: &[i32],
    ) -> Result<Vec<EntityId>, MeshError> {
        if space_dim == 2 {
            let mut next: HashMap<EntityId, EntityId> = HashMap::with_capacity(faces.len());
            for (&f, &d) in faces.iter().zip(dirs) {
                let (a, b) = if d > 0 {
                    (face_nodes[f][0], face_nodes[f][1])
                } else {
                    (face_nodes[f][1], face_nodes[f][0])
                };
                next.insert(a, b);
            }
            let Some(&start) = faces.first().map(|&f| {
                if dirs[0] > 0 { &face_nodes[f][0] } else { &face_nodes[f][1] }
            }) else {
                return Err(MeshError::InvalidTopology("cell without faces".into()));
            };
            let mut out = Vec::with_capacity(faces.len());
            let mut n = start;
            loop {
                out.push(n);
                n = *next.get(&n).ok_or_else(|| {
                    MeshError::InvalidTopology("cell faces do not form a closed loop".into())
                })?;
                if n == start {
                    break;
                }
                if out.len() > faces.len() {
                    return Err(MeshError::InvalidTopology(
                        "cell faces do not form a single loop".into(),
                    ));
                }
            }
            if out.len() != faces.len() {
                return Err(MeshError::InvalidTopology(
                    "cell faces do not form a single loop".into(),
                ));
            }
            Ok(out)
        } else {
            Ok(faces
                .iter()
                .flat_map(|&f| face_nodes[f].iter().copied())
                .unique()
                .collect())
        }
    }

    fn check(&self, kind: EntityKind, id: EntityId) -> Result<(), MeshError> {
        self.ownership.check(kind, id)
    }
}

impl MeshFramework for UnstructuredMesh {
    fn space_dimension(&self) -> usize {
        self.space_dim
    }

    fn manifold_dimension(&self) -> usize {
        self.manifold_dim
    }

    fn ownership(&self) -> &EntityOwnership {
        &self.ownership
    }

    fn node_get_coordinates(&self, n: EntityId) -> Result<Point, MeshError> {
        self.check(EntityKind::Node, n)?;
        Ok(self.nodes[n])
    }

    fn node_set_coordinates(&mut self, n: EntityId, p: Point) -> Result<(), MeshError> {
        self.check(EntityKind::Node, n)?;
        self.nodes[n] = p.with_dim(self.space_dim);
        Ok(())
    }

    fn face_get_nodes(&self, f: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Face, f)?;
        Ok(self.face_nodes[f].clone())
    }

    fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(Vec<EntityId>, Vec<i32>), MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok((self.cell_faces[c].clone(), self.cell_dirs[c].clone()))
    }

    fn cell_get_nodes(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.cell_nodes[c].clone())
    }

    fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.cell_types[c])
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn cell_get_edges(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.cell_edges[c].clone())
    }

    fn edge_get_nodes(&self, e: EntityId) -> Result<(EntityId, EntityId), MeshError> {
        self.check(EntityKind::Edge, e)?;
        Ok(self.edge_nodes[e])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_squares() -> UnstructuredMesh {
        let nodes = vec![
            Point::new2(0.0, 0.0),
            Point::new2(1.0, 0.0),
            Point::new2(2.0, 0.0),
            Point::new2(0.0, 1.0),
            Point::new2(1.0, 1.0),
            Point::new2(2.0, 1.0),
        ];
        // second cell given clockwise on purpose
        UnstructuredMesh::from_polygons(nodes, vec![vec![0, 1, 4, 3], vec![1, 4, 5, 2]]).unwrap()
    }

    #[test]
    fn polygons_share_one_face_with_opposite_dirs() {
        let m = two_squares();
        assert_eq!(m.ownership().count(EntityKind::Face, ParallelType::Used), 7);
        let (f0, d0) = m.cell_get_faces_and_dirs(0).unwrap();
        let (f1, d1) = m.cell_get_faces_and_dirs(1).unwrap();
        let shared: Vec<_> = f0.iter().filter(|f| f1.contains(f)).copied().collect();
        assert_eq!(shared.len(), 1);
        let i0 = f0.iter().position(|&f| f == shared[0]).unwrap();
        let i1 = f1.iter().position(|&f| f == shared[0]).unwrap();
        assert_eq!(d0[i0], -d1[i1]);
        assert_eq!(m.cell_get_type(1).unwrap(), CellType::Quadrilateral);
        // reversed to counter-clockwise
        assert_eq!(m.cell_get_nodes(1).unwrap(), vec![2, 5, 4, 1]);
    }

    #[test]
    fn bad_ids_are_rejected() {
        let m = two_squares();
        assert!(matches!(
            m.cell_get_nodes(2),
            Err(MeshError::InvalidEntityId { kind: EntityKind::Cell, .. })
        ));
        let err = UnstructuredMesh::from_polygons(vec![Point::new2(0.0, 0.0)], vec![vec![0, 1, 2]]);
        assert!(matches!(err, Err(MeshError::InvalidEntityId { .. })));
    }

    #[test]
    fn tet_edges_are_derived() {
        let nodes = vec![
            Point::new3(0.0, 0.0, 0.0),
            Point::new3(1.0, 0.0, 0.0),
            Point::new3(0.0, 1.0, 0.0),
            Point::new3(0.0, 0.0, 1.0),
        ];
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]];
        let m = UnstructuredMesh::new(nodes, faces, vec![vec![0, 1, 2, 3]], vec![vec![1; 4]])
            .unwrap();
        assert_eq!(m.cell_get_edges(0).unwrap().len(), 6);
        assert_eq!(m.cell_get_type(0).unwrap(), CellType::Tetrahedron);
        assert_eq!(m.edge_get_nodes(0).unwrap(), (0, 2));
    }
}
