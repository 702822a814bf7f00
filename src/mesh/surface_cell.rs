//! A one-cell 2D mesh cut from a single face of a 3D mesh.
//!
//! The cell's nodes are the parent face's nodes; face `i` joins nodes `i`
//! and `i + 1`. Region membership is decided once at construction, from the
//! parent's sets for labeled and enumerated regions and by containment of a
//! centroid for geometric ones. There are no edges.

use crate::geometry::metrics::polygon_area_centroid_normal;
use crate::geometry::point::Point;
use crate::geometry::region::{Region, RegionKind};
use crate::mesh::framework::MeshFramework;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use crate::topology::labels::LabelSet;
use crate::topology::ownership::EntityOwnership;
use hashbrown::HashMap;

#[derive(Clone, Debug)]
pub struct SurfaceCellMesh {
    space_dim: usize,
    nodes: Vec<Point>,
    dir: i32,
    parent_face: EntityId,
    cell_type: CellType,
    sets: HashMap<String, bool>,
    ownership: EntityOwnership,
    labels: LabelSet,
}

impl SurfaceCellMesh {
    /// Extract the single owned face of `parent` in region `surface_set`.
    ///
    /// With `flatten` the nodes are projected onto the xy-plane and the mesh
    /// is 2D; otherwise it is a 2-manifold in 3D.
    pub fn new(parent: &Mesh, surface_set: &str, flatten: bool) -> Result<Self, MeshError> {
        if parent.manifold_dimension() != 3 {
            return Err(MeshError::PreconditionViolated(format!(
                "surface cell needs a 3D parent mesh, got manifold dimension {}",
                parent.manifold_dimension()
            )));
        }
        let faces = parent.get_set_entities(surface_set, EntityKind::Face, ParallelType::Owned)?;
        let [parent_face] = faces[..] else {
            return Err(MeshError::PreconditionViolated(format!(
                "region `{surface_set}` holds {} owned faces, expected exactly one",
                faces.len()
            )));
        };

        let space_dim = if flatten { 2 } else { 3 };
        let nodes = parent
            .face_get_nodes(parent_face)?
            .iter()
            .map(|&n| parent.node_get_coordinates(n).map(|p| p.with_dim(space_dim)))
            .collect::<Result<Vec<_>, _>>()?;
        let cell = polygon_area_centroid_normal(&nodes)?;

        // A flattened face seen from below is clockwise; flip all faces so
        // the natural normals still point out of the cell.
        let dir = if flatten && cell.normal[0] < 0.0 { -1 } else { 1 };

        let mut sets = HashMap::new();
        for region in parent.geometric_model().regions() {
            let member = match region.kind() {
                RegionKind::LabeledSet { .. } | RegionKind::Enumerated { .. } => parent
                    .get_set_entities(region.name(), EntityKind::Face, ParallelType::Owned)?
                    .contains(&parent_face),
                _ if region.is_geometric() => match region.space_dimension() {
                    Some(3) => region.inside(&parent.face_centroid(parent_face)?)?,
                    Some(2) if flatten => region.inside(&cell.centroid)?,
                    None => region.inside(&cell.centroid)?,
                    _ => false,
                },
                _ => false,
            };
            sets.insert(region.name().to_string(), member);
        }

        let n = nodes.len();
        let cell_type = CellType::polygon(n);
        Ok(Self {
            space_dim,
            nodes,
            dir,
            parent_face,
            cell_type,
            sets,
            ownership: EntityOwnership::serial(n, 0, n, 1),
            labels: LabelSet::new(),
        })
    }

    pub fn parent_face(&self) -> EntityId {
        self.parent_face
    }

    fn check(&self, kind: EntityKind, id: EntityId) -> Result<(), MeshError> {
        self.ownership.check(kind, id)
    }
}

impl MeshFramework for SurfaceCellMesh {
    fn space_dimension(&self) -> usize {
        self.space_dim
    }

    fn manifold_dimension(&self) -> usize {
        2
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
        Ok(vec![f, (f + 1) % self.nodes.len()])
    }

    fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(Vec<EntityId>, Vec<i32>), MeshError> {
        self.check(EntityKind::Cell, c)?;
        let n = self.nodes.len();
        Ok(((0..n).collect(), vec![self.dir; n]))
    }

    fn cell_get_nodes(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok((0..self.nodes.len()).collect())
    }

    fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.cell_type)
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn entity_get_parent(&self, kind: EntityKind, id: EntityId) -> Option<EntityId> {
        (kind == EntityKind::Cell && id == 0).then_some(self.parent_face)
    }

    fn set_membership(&self, region: &Region) -> Option<bool> {
        Some(self.sets.get(region.name()).copied().unwrap_or(false))
    }
}
