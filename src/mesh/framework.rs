//! Backend capability trait and the closed set of mesh backends.
//!
//! A backend answers raw topology and coordinate queries. Everything derived
//! (face-to-cell adjacency, volumes, centroids, normals, set resolution) is
//! computed once by [`Mesh`](super::Mesh) on top of it.

use crate::geometry::point::Point;
use crate::geometry::region::Region;
use crate::mesh::structured::StructuredMesh;
use crate::mesh::surface_cell::SurfaceCellMesh;
use crate::mesh::unstructured::UnstructuredMesh;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::labels::LabelSet;
use crate::topology::ownership::EntityOwnership;

/// Queries every mesh backend must answer.
///
/// Optional capabilities have default implementations that report
/// [`MeshError::UnsupportedOperation`] (or `None`).
pub trait MeshFramework {
    fn space_dimension(&self) -> usize;

    fn manifold_dimension(&self) -> usize;

    /// Owned/used counts per entity kind.
    fn ownership(&self) -> &EntityOwnership;

    fn node_get_coordinates(&self, n: EntityId) -> Result<Point, MeshError>;

    /// Move a node. Derived geometry must be recomputed by the caller.
    fn node_set_coordinates(&mut self, n: EntityId, p: Point) -> Result<(), MeshError>;

    /// Nodes of a face, ordered so that their right-hand normal is the
    /// face's natural normal. In 2D a face has exactly two nodes.
    fn face_get_nodes(&self, f: EntityId) -> Result<Vec<EntityId>, MeshError>;

    /// Faces of a cell and, for each, `+1` if the natural normal points out
    /// of the cell and `-1` otherwise.
    fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(Vec<EntityId>, Vec<i32>), MeshError>;

    /// Nodes of a cell; counter-clockwise in 2D, Exodus order for standard
    /// 3D cells when [`MeshFramework::has_standard_cell_nodes`] is true.
    fn cell_get_nodes(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError>;

    fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError>;

    /// Labeled entity sets carried by the backend.
    fn labels(&self) -> &LabelSet;

    /// True if hex cell nodes follow the Exodus ordering.
    fn has_standard_cell_nodes(&self) -> bool {
        false
    }

    fn cell_get_edges(&self, _c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        Err(MeshError::unsupported("cell_get_edges"))
    }

    fn edge_get_nodes(&self, _e: EntityId) -> Result<(EntityId, EntityId), MeshError> {
        Err(MeshError::unsupported("edge_get_nodes"))
    }

    /// Entity of the parent mesh this entity was extracted from.
    fn entity_get_parent(&self, _kind: EntityKind, _id: EntityId) -> Option<EntityId> {
        None
    }

    /// Precomputed membership of the whole mesh in a region, for backends
    /// that resolve sets against a parent mesh.
    fn set_membership(&self, _region: &Region) -> Option<bool> {
        None
    }
}

/// The mesh backends, dispatched by `match`.
#[derive(Clone, Debug)]
pub enum MeshBackend {
    Unstructured(UnstructuredMesh),
    Structured(StructuredMesh),
    SurfaceCell(SurfaceCellMesh),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            MeshBackend::Unstructured($m) => $body,
            MeshBackend::Structured($m) => $body,
            MeshBackend::SurfaceCell($m) => $body,
        }
    };
}

impl MeshFramework for MeshBackend {
    fn space_dimension(&self) -> usize {
        dispatch!(self, m => m.space_dimension())
    }

    fn manifold_dimension(&self) -> usize {
        dispatch!(self, m => m.manifold_dimension())
    }

    fn ownership(&self) -> &EntityOwnership {
        dispatch!(self, m => m.ownership())
    }

    fn node_get_coordinates(&self, n: EntityId) -> Result<Point, MeshError> {
        dispatch!(self, m => m.node_get_coordinates(n))
    }

    fn node_set_coordinates(&mut self, n: EntityId, p: Point) -> Result<(), MeshError> {
        dispatch!(self, m => m.node_set_coordinates(n, p))
    }

    fn face_get_nodes(&self, f: EntityId) -> Result<Vec<EntityId>, MeshError> {
        dispatch!(self, m => m.face_get_nodes(f))
    }

    fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(Vec<EntityId>, Vec<i32>), MeshError> {
        dispatch!(self, m => m.cell_get_faces_and_dirs(c))
    }

    fn cell_get_nodes(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        dispatch!(self, m => m.cell_get_nodes(c))
    }

    fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError> {
        dispatch!(self, m => m.cell_get_type(c))
    }

    fn labels(&self) -> &LabelSet {
        dispatch!(self, m => m.labels())
    }

    fn has_standard_cell_nodes(&self) -> bool {
        dispatch!(self, m => m.has_standard_cell_nodes())
    }

    fn cell_get_edges(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        dispatch!(self, m => m.cell_get_edges(c))
    }

    fn edge_get_nodes(&self, e: EntityId) -> Result<(EntityId, EntityId), MeshError> {
        dispatch!(self, m => m.edge_get_nodes(e))
    }

    fn entity_get_parent(&self, kind: EntityKind, id: EntityId) -> Option<EntityId> {
        dispatch!(self, m => m.entity_get_parent(kind, id))
    }

    fn set_membership(&self, region: &Region) -> Option<bool> {
        dispatch!(self, m => m.set_membership(region))
    }
}

impl From<UnstructuredMesh> for MeshBackend {
    fn from(m: UnstructuredMesh) -> Self {
        MeshBackend::Unstructured(m)
    }
}

impl From<StructuredMesh> for MeshBackend {
    fn from(m: StructuredMesh) -> Self {
        MeshBackend::Structured(m)
    }
}

impl From<SurfaceCellMesh> for MeshBackend {
    fn from(m: SurfaceCellMesh) -> Self {
        MeshBackend::SurfaceCell(m)
    }
}
