//! Polymorphic mesh abstraction.
//!
//! [`Mesh`] wraps one of the [`MeshBackend`]s together with the shared
//! [`GeometricModel`] and a [`VerboseObject`]. Topology is copied out of the
//! backend once; cell and face geometry is cached and recomputed only by
//! [`Mesh::node_set_coordinates`]. All read queries are side-effect free.
//!
//! Orientation conventions:
//! - each face has a *natural* normal, given by the right-hand rule on its
//!   node order (in 2D the edge `n0 -> n1` has natural normal `(dy, -dx)`);
//! - `cell_get_faces_and_dirs` pairs every face of a cell with `+1` when the
//!   natural normal points out of that cell and `-1` otherwise;
//! - normals are area weighted: their length is the face area.

pub mod framework;
mod geometry_cache;
pub mod structured;
pub mod surface_cell;
pub mod unstructured;
mod validation;

pub use framework::{MeshBackend, MeshFramework};
pub use structured::{StructuredMesh, StructuredMeshOptions};
pub use surface_cell::SurfaceCellMesh;
pub use unstructured::UnstructuredMesh;

use crate::debug_invariants::DebugInvariants;
use crate::geometry::point::Point;
use crate::geometry::region::{GeometricModel, Region, RegionKind};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use crate::verbose::VerboseObject;
use geometry_cache::{MeshGeometry, MeshTopology};
use std::ops::Range;
use std::sync::Arc;

/// Relative tolerance for the point-in-cell test of point regions.
const POINT_IN_CELL_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Debug)]
pub struct Mesh {
    backend: MeshBackend,
    gm: Arc<GeometricModel>,
    vo: VerboseObject,
    topo: MeshTopology,
    geom: MeshGeometry,
}

static_assertions::assert_impl_all!(Mesh: Send, Sync);

impl Mesh {
    /// Wrap a backend, copying its topology and computing its geometry.
    pub fn new(
        backend: impl Into<MeshBackend>,
        gm: Arc<GeometricModel>,
        vo: VerboseObject,
    ) -> Result<Self, MeshError> {
        let backend = backend.into();
        let own = backend.ownership();
        let ncells = own.count(EntityKind::Cell, ParallelType::Used);
        let nfaces = own.count(EntityKind::Face, ParallelType::Used);
        let nnodes = own.count(EntityKind::Node, ParallelType::Used);
        if gm.space_dimension() != 0 && gm.space_dimension() < backend.manifold_dimension() {
            return Err(MeshError::Configuration(format!(
                "{}D geometric model for a {}D mesh",
                gm.space_dimension(),
                backend.manifold_dimension()
            )));
        }

        let topo = MeshTopology::build(&backend, nfaces, ncells)?;
        let min_faces = backend.manifold_dimension() + 1;
        if let Some(c) = topo.cell_faces.iter().position(|f| f.len() < min_faces) {
            return Err(MeshError::InvalidTopology(format!(
                "cell {c} has {} faces, needs at least {min_faces}",
                topo.cell_faces[c].len()
            )));
        }
        let geom = MeshGeometry::compute(&backend, &topo, nnodes)?;
        vo.info(format_args!(
            "mesh: {} cells, {} faces, {} nodes (space dim {}, manifold dim {})",
            ncells,
            nfaces,
            nnodes,
            backend.space_dimension(),
            backend.manifold_dimension()
        ));
        let mesh = Self {
            backend,
            gm,
            vo,
            topo,
            geom,
        };
        mesh.validate_invariants()?;
        Ok(mesh)
    }

    pub fn backend(&self) -> &MeshBackend {
        &self.backend
    }

    pub fn geometric_model(&self) -> &Arc<GeometricModel> {
        &self.gm
    }

    pub fn verbose(&self) -> &VerboseObject {
        &self.vo
    }

    pub fn space_dimension(&self) -> usize {
        self.backend.space_dimension()
    }

    pub fn manifold_dimension(&self) -> usize {
        self.backend.manifold_dimension()
    }

    // ---- entity counts -------------------------------------------------

    pub fn num_entities(&self, kind: EntityKind, ptype: ParallelType) -> usize {
        self.backend.ownership().count(kind, ptype)
    }

    /// Ids of `kind` in category `ptype`; owned ids come before ghosts.
    pub fn entity_ids(&self, kind: EntityKind, ptype: ParallelType) -> Range<EntityId> {
        self.backend.ownership().ids(kind, ptype)
    }

    pub fn entity_get_ptype(&self, kind: EntityKind, id: EntityId) -> Result<ParallelType, MeshError> {
        self.backend.ownership().ptype(kind, id)
    }

    pub fn entity_get_parent(&self, kind: EntityKind, id: EntityId) -> Option<EntityId> {
        self.backend.entity_get_parent(kind, id)
    }

    #[inline]
    fn check(&self, kind: EntityKind, id: EntityId) -> Result<(), MeshError> {
        self.backend.ownership().check(kind, id)
    }

    // ---- adjacency -----------------------------------------------------

    pub fn cell_get_faces(&self, c: EntityId) -> Result<&[EntityId], MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(&self.topo.cell_faces[c])
    }

    pub fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(&[EntityId], &[i32]), MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok((&self.topo.cell_faces[c], &self.topo.cell_dirs[c]))
    }

    pub fn cell_get_nodes(&self, c: EntityId) -> Result<&[EntityId], MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(&self.topo.cell_nodes[c])
    }

    pub fn cell_get_edges(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.backend.cell_get_edges(c)
    }

    pub fn edge_get_nodes(&self, e: EntityId) -> Result<(EntityId, EntityId), MeshError> {
        self.backend.edge_get_nodes(e)
    }

    pub fn face_get_nodes(&self, f: EntityId) -> Result<&[EntityId], MeshError> {
        self.check(EntityKind::Face, f)?;
        Ok(&self.topo.face_nodes[f])
    }

    /// Cells of category `ptype` adjacent to face `f`, ascending.
    pub fn face_get_cells(&self, f: EntityId, ptype: ParallelType) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Face, f)?;
        let own = self.backend.ownership();
        Ok(self.topo.face_cells[f]
            .iter()
            .copied()
            .filter(|&c| own.contains(EntityKind::Cell, ptype, c))
            .collect())
    }

    /// The cell across face `f` from cell `c`, if any.
    pub fn cell_get_face_adj_cell(&self, c: EntityId, f: EntityId) -> Result<Option<EntityId>, MeshError> {
        self.check(EntityKind::Cell, c)?;
        self.check(EntityKind::Face, f)?;
        if !self.topo.cell_faces[c].contains(&f) {
            return Err(MeshError::PreconditionViolated(format!(
                "face {f} is not a face of cell {c}"
            )));
        }
        Ok(self.topo.face_cells[f].iter().copied().find(|&other| other != c))
    }

    /// Face neighbours of `c` of category `ptype`, in face order.
    pub fn cell_get_face_adj_cells(&self, c: EntityId, ptype: ParallelType) -> Result<Vec<EntityId>, MeshError> {
        let own = self.backend.ownership();
        let mut out = Vec::new();
        for &f in self.cell_get_faces(c)? {
            if let Some(other) = self.cell_get_face_adj_cell(c, f)? {
                if own.contains(EntityKind::Cell, ptype, other) {
                    out.push(other);
                }
            }
        }
        Ok(out)
    }

    // ---- geometry ------------------------------------------------------

    pub fn node_get_coordinates(&self, n: EntityId) -> Result<Point, MeshError> {
        self.backend.node_get_coordinates(n)
    }

    pub fn cell_get_coordinates(&self, c: EntityId) -> Result<Vec<Point>, MeshError> {
        self.cell_get_nodes(c)?
            .iter()
            .map(|&n| self.node_get_coordinates(n))
            .collect()
    }

    pub fn face_area(&self, f: EntityId) -> Result<f64, MeshError> {
        self.check(EntityKind::Face, f)?;
        Ok(self.geom.face_areas[f])
    }

    pub fn face_centroid(&self, f: EntityId) -> Result<Point, MeshError> {
        self.check(EntityKind::Face, f)?;
        Ok(self.geom.face_centroids[f])
    }

    /// Natural, area-weighted normal of `f`.
    pub fn face_normal(&self, f: EntityId) -> Result<Point, MeshError> {
        self.check(EntityKind::Face, f)?;
        Ok(self.geom.face_normals[f])
    }

    /// Normal of `f` pointing out of cell `c`, and the direction flag
    /// relating it to the natural normal.
    pub fn face_normal_oriented(&self, f: EntityId, c: EntityId) -> Result<(Point, i32), MeshError> {
        let (faces, dirs) = self.cell_get_faces_and_dirs(c)?;
        let i = faces.iter().position(|&g| g == f).ok_or_else(|| {
            MeshError::PreconditionViolated(format!("face {f} is not a face of cell {c}"))
        })?;
        let dir = dirs[i];
        Ok((self.geom.face_normals[f] * f64::from(dir), dir))
    }

    pub fn cell_volume(&self, c: EntityId) -> Result<f64, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.geom.cell_volumes[c])
    }

    pub fn cell_centroid(&self, c: EntityId) -> Result<Point, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.geom.cell_centroids[c])
    }

    pub fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(self.topo.cell_types[c])
    }

    /// Move a node and recompute all derived geometry. A move that leaves
    /// the mesh invalid is undone and the mesh is unchanged.
    pub fn node_set_coordinates(&mut self, n: EntityId, p: Point) -> Result<(), MeshError> {
        let old = self.node_get_coordinates(n)?;
        self.backend.node_set_coordinates(n, p)?;
        let nnodes = self.num_entities(EntityKind::Node, ParallelType::Used);
        match MeshGeometry::compute(&self.backend, &self.topo, nnodes) {
            Ok(geom) => {
                self.geom = geom;
                Ok(())
            }
            Err(e) => {
                self.vo.warn(format_args!("moving node {n} failed: {e}"));
                self.backend.node_set_coordinates(n, old)?;
                Err(e)
            }
        }
    }

    // ---- sets ----------------------------------------------------------

    /// Entities of `kind` and category `ptype` in the region named `name`.
    pub fn get_set_entities(
        &self,
        name: &str,
        kind: EntityKind,
        ptype: ParallelType,
    ) -> Result<Vec<EntityId>, MeshError> {
        let region = self.gm.find_region(name)?;
        let all = self.resolve_region(region, kind)?;
        let own = self.backend.ownership();
        Ok(all
            .into_iter()
            .filter(|&id| own.contains(kind, ptype, id))
            .collect())
    }

    pub fn get_set_size(&self, name: &str, kind: EntityKind, ptype: ParallelType) -> Result<usize, MeshError> {
        self.get_set_entities(name, kind, ptype).map(|v| v.len())
    }

    fn resolve_region(&self, region: &Region, kind: EntityKind) -> Result<Vec<EntityId>, MeshError> {
        let used = self.entity_ids(kind, ParallelType::Used);
        if let Some(member) = self.backend.set_membership(region) {
            return Ok(if member { used.collect() } else { Vec::new() });
        }
        match region.kind() {
            RegionKind::All => Ok(used.collect()),
            RegionKind::Point(p) if kind == EntityKind::Cell => {
                let mut out = Vec::new();
                for c in used {
                    if self.point_in_cell(p, c)? {
                        out.push(c);
                    }
                }
                Ok(out)
            }
            RegionKind::Box { .. } | RegionKind::Plane { .. } | RegionKind::Point(_) => {
                let mut out = Vec::new();
                for id in used {
                    if region.inside(&self.entity_position(kind, id)?)? {
                        out.push(id);
                    }
                }
                Ok(out)
            }
            RegionKind::Boundary => self.boundary_entities(kind),
            RegionKind::LabeledSet { label, entity } => {
                if *entity != kind {
                    self.vo.debug(format_args!(
                        "region `{}` labels {entity}s, {kind}s requested",
                        region.name()
                    ));
                    return Ok(Vec::new());
                }
                match self.backend.labels().get(label, kind) {
                    Some(ids) => Ok(ids.to_vec()),
                    None => {
                        self.vo.warn(format_args!(
                            "label `{label}` of region `{}` not found in mesh",
                            region.name()
                        ));
                        Ok(Vec::new())
                    }
                }
            }
            RegionKind::Enumerated { entity, ids } => {
                if *entity != kind {
                    return Ok(Vec::new());
                }
                let mut ids = ids.clone();
                ids.sort_unstable();
                ids.dedup();
                ids.retain(|&id| used.contains(&id));
                Ok(ids)
            }
        }
    }

    fn entity_position(&self, kind: EntityKind, id: EntityId) -> Result<Point, MeshError> {
        match kind {
            EntityKind::Node => self.node_get_coordinates(id),
            EntityKind::Edge => {
                let (a, b) = self.edge_get_nodes(id)?;
                Ok((self.node_get_coordinates(a)? + self.node_get_coordinates(b)?) * 0.5)
            }
            EntityKind::Face => self.face_centroid(id),
            EntityKind::Cell => self.cell_centroid(id),
        }
    }

    /// Containment in a star-shaped cell: `p` lies behind every face plane.
    fn point_in_cell(&self, p: &Point, c: EntityId) -> Result<bool, MeshError> {
        let scale = self.cell_volume(c)?.powf(1.0 / self.manifold_dimension() as f64);
        for &f in self.cell_get_faces(c)? {
            let (n, _) = self.face_normal_oriented(f, c)?;
            let d = (p.with_dim(self.space_dimension()) - self.face_centroid(f)?).dot(&n);
            if d > POINT_IN_CELL_TOLERANCE * scale * n.norm() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn boundary_entities(&self, kind: EntityKind) -> Result<Vec<EntityId>, MeshError> {
        let bfaces: Vec<EntityId> = self
            .topo
            .face_cells
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.len() == 1)
            .map(|(f, _)| f)
            .collect();
        match kind {
            EntityKind::Face => Ok(bfaces),
            EntityKind::Cell => {
                let mut cells: Vec<EntityId> = bfaces.iter().map(|&f| self.topo.face_cells[f][0]).collect();
                cells.sort_unstable();
                cells.dedup();
                Ok(cells)
            }
            EntityKind::Node => {
                let mut nodes: Vec<EntityId> = bfaces
                    .iter()
                    .flat_map(|&f| self.topo.face_nodes[f].iter().copied())
                    .collect();
                nodes.sort_unstable();
                nodes.dedup();
                Ok(nodes)
            }
            EntityKind::Edge => Err(MeshError::unsupported("boundary edge sets")),
        }
    }
}
