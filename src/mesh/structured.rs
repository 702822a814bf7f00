//! Structured box meshes with arithmetic topology.
//!
//! Cells, faces, edges and nodes are numbered lexicographically in
//! `(i, j, k)`, x fastest. Faces are grouped by normal direction: all
//! x-normal faces first, then y-normal, then z-normal; edges likewise
//! (x-aligned, y-aligned, z-aligned). Every natural face normal points in
//! the positive coordinate direction.
//!
//! Boundary sides are published as labeled face sets named
//! [`BOUNDARY_X_MIN`], [`BOUNDARY_X_MAX`], and so on.

use crate::geometry::point::Point;
use crate::mesh::framework::MeshFramework;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::labels::LabelSet;
use crate::topology::ownership::EntityOwnership;
use itertools::iproduct;
use serde::{Deserialize, Serialize};

pub const BOUNDARY_X_MIN: &str = "boundary_x_min";
pub const BOUNDARY_X_MAX: &str = "boundary_x_max";
pub const BOUNDARY_Y_MIN: &str = "boundary_y_min";
pub const BOUNDARY_Y_MAX: &str = "boundary_y_max";
pub const BOUNDARY_Z_MIN: &str = "boundary_z_min";
pub const BOUNDARY_Z_MAX: &str = "boundary_z_max";

/// Box corners and cell counts of a structured mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredMeshOptions {
    /// Space dimension, 2 or 3.
    pub dim: usize,
    pub lo: [f64; 3],
    pub hi: [f64; 3],
    pub cells: [usize; 3],
}

impl Default for StructuredMeshOptions {
    fn default() -> Self {
        Self {
            dim: 2,
            lo: [0.0; 3],
            hi: [1.0; 3],
            cells: [1, 1, 1],
        }
    }
}

impl StructuredMeshOptions {
    pub fn rectangle(lo: [f64; 2], hi: [f64; 2], nx: usize, ny: usize) -> Self {
        Self {
            dim: 2,
            lo: [lo[0], lo[1], 0.0],
            hi: [hi[0], hi[1], 0.0],
            cells: [nx, ny, 1],
        }
    }

    pub fn brick(lo: [f64; 3], hi: [f64; 3], nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            dim: 3,
            lo,
            hi,
            cells: [nx, ny, nz],
        }
    }

    fn validate(&self) -> Result<(), MeshError> {
        if !(2..=3).contains(&self.dim) {
            return Err(MeshError::Configuration(format!(
                "structured mesh dimension {} (expected 2 or 3)",
                self.dim
            )));
        }
        for a in 0..self.dim {
            if self.cells[a] == 0 {
                return Err(MeshError::Configuration(format!(
                    "structured mesh needs at least one cell along axis {a}"
                )));
            }
            if !(self.hi[a] > self.lo[a]) {
                return Err(MeshError::Configuration(format!(
                    "structured mesh box is empty along axis {a}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StructuredMesh {
    dim: usize,
    n: [usize; 3],
    nodes: Vec<Point>,
    ownership: EntityOwnership,
    labels: LabelSet,
}

impl StructuredMesh {
    pub fn new(options: &StructuredMeshOptions) -> Result<Self, MeshError> {
        options.validate()?;
        let dim = options.dim;
        let mut n = [1usize; 3];
        n[..dim].copy_from_slice(&options.cells[..dim]);
        let h: Vec<f64> = (0..dim)
            .map(|a| (options.hi[a] - options.lo[a]) / n[a] as f64)
            .collect();

        let nz_nodes = if dim == 3 { n[2] + 1 } else { 1 };
        let mut nodes = Vec::with_capacity((n[0] + 1) * (n[1] + 1) * nz_nodes);
        for (k, j, i) in iproduct!(0..nz_nodes, 0..=n[1], 0..=n[0]) {
            let x = options.lo[0] + i as f64 * h[0];
            let y = options.lo[1] + j as f64 * h[1];
            nodes.push(if dim == 2 {
                Point::new2(x, y)
            } else {
                Point::new3(x, y, options.lo[2] + k as f64 * h[2])
            });
        }

        let mut mesh = Self {
            dim,
            n,
            nodes,
            ownership: EntityOwnership::default(),
            labels: LabelSet::new(),
        };
        mesh.ownership = EntityOwnership::serial(
            mesh.nodes.len(),
            mesh.num_edges(),
            mesh.num_faces(),
            mesh.num_cells(),
        );
        mesh.publish_boundary_sets();
        log::debug!(
            "structured {}D mesh: {} cells, {} faces",
            dim,
            mesh.num_cells(),
            mesh.num_faces()
        );
        Ok(mesh)
    }

    /// Cells per axis.
    pub fn cell_counts(&self) -> [usize; 3] {
        self.n
    }

    pub fn num_cells(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    fn face_counts(&self) -> [usize; 3] {
        let [nx, ny, nz] = self.n;
        if self.dim == 2 {
            [(nx + 1) * ny, nx * (ny + 1), 0]
        } else {
            [(nx + 1) * ny * nz, nx * (ny + 1) * nz, nx * ny * (nz + 1)]
        }
    }

    pub fn num_faces(&self) -> usize {
        self.face_counts().iter().sum()
    }

    fn edge_counts(&self) -> [usize; 3] {
        let [nx, ny, nz] = self.n;
        [
            nx * (ny + 1) * (nz + 1),
            (nx + 1) * ny * (nz + 1),
            (nx + 1) * (ny + 1) * nz,
        ]
    }

    fn num_edges(&self) -> usize {
        if self.dim == 2 {
            self.num_faces()
        } else {
            self.edge_counts().iter().sum()
        }
    }

    #[inline]
    fn node_id(&self, i: usize, j: usize, k: usize) -> EntityId {
        i + (self.n[0] + 1) * (j + (self.n[1] + 1) * k)
    }

    #[inline]
    fn cell_ijk(&self, c: EntityId) -> (usize, usize, usize) {
        let [nx, ny, _] = self.n;
        (c % nx, (c / nx) % ny, c / (nx * ny))
    }

    /// Face with normal along `axis` at lattice position `(i, j, k)`.
    fn face_id(&self, axis: usize, i: usize, j: usize, k: usize) -> EntityId {
        let [nx, ny, _] = self.n;
        let [fx, fy, _] = self.face_counts();
        match axis {
            0 => i + (nx + 1) * (j + ny * k),
            1 => fx + i + nx * (j + (ny + 1) * k),
            _ => fx + fy + i + nx * (j + ny * k),
        }
    }

    /// Inverse of [`Self::face_id`].
    fn face_axis_ijk(&self, f: EntityId) -> (usize, usize, usize, usize) {
        let [nx, ny, _] = self.n;
        let [fx, fy, _] = self.face_counts();
        if f < fx {
            (0, f % (nx + 1), (f / (nx + 1)) % ny, f / ((nx + 1) * ny))
        } else if f < fx + fy {
            let g = f - fx;
            (1, g % nx, (g / nx) % (ny + 1), g / (nx * (ny + 1)))
        } else {
            let g = f - fx - fy;
            (2, g % nx, (g / nx) % ny, g / (nx * ny))
        }
    }

    fn edge_id(&self, axis: usize, i: usize, j: usize, k: usize) -> EntityId {
        let [nx, ny, _] = self.n;
        let [ex, ey, _] = self.edge_counts();
        match axis {
            0 => i + nx * (j + (ny + 1) * k),
            1 => ex + i + (nx + 1) * (j + ny * k),
            _ => ex + ey + i + (nx + 1) * (j + (ny + 1) * k),
        }
    }

    fn edge_axis_ijk(&self, e: EntityId) -> (usize, usize, usize, usize) {
        let [nx, ny, _] = self.n;
        let [ex, ey, _] = self.edge_counts();
        if e < ex {
            (0, e % nx, (e / nx) % (ny + 1), e / (nx * (ny + 1)))
        } else if e < ex + ey {
            let g = e - ex;
            (1, g % (nx + 1), (g / (nx + 1)) % ny, g / ((nx + 1) * ny))
        } else {
            let g = e - ex - ey;
            (2, g % (nx + 1), (g / (nx + 1)) % (ny + 1), g / ((nx + 1) * (ny + 1)))
        }
    }

    fn publish_boundary_sets(&mut self) {
        let [nx, ny, nz] = self.n;
        if self.dim == 2 {
            let sides = [
                (BOUNDARY_X_MIN, (0..ny).map(|j| self.face_id(0, 0, j, 0)).collect::<Vec<_>>()),
                (BOUNDARY_X_MAX, (0..ny).map(|j| self.face_id(0, nx, j, 0)).collect()),
                (BOUNDARY_Y_MIN, (0..nx).map(|i| self.face_id(1, i, 0, 0)).collect()),
                (BOUNDARY_Y_MAX, (0..nx).map(|i| self.face_id(1, i, ny, 0)).collect()),
            ];
            for (name, ids) in sides {
                self.labels.insert(name, EntityKind::Face, ids);
            }
        } else {
            let sides = [
                (
                    BOUNDARY_X_MIN,
                    iproduct!(0..nz, 0..ny)
                        .map(|(k, j)| self.face_id(0, 0, j, k))
                        .collect::<Vec<_>>(),
                ),
                (
                    BOUNDARY_X_MAX,
                    iproduct!(0..nz, 0..ny).map(|(k, j)| self.face_id(0, nx, j, k)).collect(),
                ),
                (
                    BOUNDARY_Y_MIN,
                    iproduct!(0..nz, 0..nx).map(|(k, i)| self.face_id(1, i, 0, k)).collect(),
                ),
                (
                    BOUNDARY_Y_MAX,
                    iproduct!(0..nz, 0..nx).map(|(k, i)| self.face_id(1, i, ny, k)).collect(),
                ),
                (
                    BOUNDARY_Z_MIN,
                    iproduct!(0..ny, 0..nx).map(|(j, i)| self.face_id(2, i, j, 0)).collect(),
                ),
                (
                    BOUNDARY_Z_MAX,
                    iproduct!(0..ny, 0..nx).map(|(j, i)| self.face_id(2, i, j, nz)).collect(),
                ),
            ];
            for (name, ids) in sides {
                self.labels.insert(name, EntityKind::Face, ids);
            }
        }
    }

    fn check(&self, kind: EntityKind, id: EntityId) -> Result<(), MeshError> {
        self.ownership.check(kind, id)
    }
}

impl MeshFramework for StructuredMesh {
    fn space_dimension(&self) -> usize {
        self.dim
    }

    fn manifold_dimension(&self) -> usize {
        self.dim
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
        self.nodes[n] = p.with_dim(self.dim);
        Ok(())
    }

    fn face_get_nodes(&self, f: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Face, f)?;
        let (axis, i, j, k) = self.face_axis_ijk(f);
        let v = |i, j, k| self.node_id(i, j, k);
        Ok(match (self.dim, axis) {
            (2, 0) => vec![v(i, j, 0), v(i, j + 1, 0)],
            (2, _) => vec![v(i + 1, j, 0), v(i, j, 0)],
            (_, 0) => vec![v(i, j, k), v(i, j + 1, k), v(i, j + 1, k + 1), v(i, j, k + 1)],
            (_, 1) => vec![v(i, j, k), v(i, j, k + 1), v(i + 1, j, k + 1), v(i + 1, j, k)],
            _ => vec![v(i, j, k), v(i + 1, j, k), v(i + 1, j + 1, k), v(i, j + 1, k)],
        })
    }

    fn cell_get_faces_and_dirs(&self, c: EntityId) -> Result<(Vec<EntityId>, Vec<i32>), MeshError> {
        self.check(EntityKind::Cell, c)?;
        let (i, j, k) = self.cell_ijk(c);
        if self.dim == 2 {
            Ok((
                vec![
                    self.face_id(1, i, j, 0),
                    self.face_id(0, i + 1, j, 0),
                    self.face_id(1, i, j + 1, 0),
                    self.face_id(0, i, j, 0),
                ],
                vec![-1, 1, 1, -1],
            ))
        } else {
            // Same order as the hex face table in `cell_geometry`.
            Ok((
                vec![
                    self.face_id(1, i, j, k),
                    self.face_id(0, i + 1, j, k),
                    self.face_id(1, i, j + 1, k),
                    self.face_id(0, i, j, k),
                    self.face_id(2, i, j, k),
                    self.face_id(2, i, j, k + 1),
                ],
                vec![-1, 1, 1, -1, -1, 1],
            ))
        }
    }

    fn cell_get_nodes(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        self.check(EntityKind::Cell, c)?;
        let (i, j, k) = self.cell_ijk(c);
        let v = |i, j, k| self.node_id(i, j, k);
        let mut out = vec![v(i, j, k), v(i + 1, j, k), v(i + 1, j + 1, k), v(i, j + 1, k)];
        if self.dim == 3 {
            out.extend([
                v(i, j, k + 1),
                v(i + 1, j, k + 1),
                v(i + 1, j + 1, k + 1),
                v(i, j + 1, k + 1),
            ]);
        }
        Ok(out)
    }

    fn cell_get_type(&self, c: EntityId) -> Result<CellType, MeshError> {
        self.check(EntityKind::Cell, c)?;
        Ok(if self.dim == 2 {
            CellType::Quadrilateral
        } else {
            CellType::Hexahedron
        })
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn has_standard_cell_nodes(&self) -> bool {
        true
    }

    fn cell_get_edges(&self, c: EntityId) -> Result<Vec<EntityId>, MeshError> {
        if self.dim == 2 {
            return self.cell_get_faces_and_dirs(c).map(|(faces, _)| faces);
        }
        self.check(EntityKind::Cell, c)?;
        let (i, j, k) = self.cell_ijk(c);
        let mut out = Vec::with_capacity(12);
        for (dk, dj) in iproduct!(0..2, 0..2) {
            out.push(self.edge_id(0, i, j + dj, k + dk));
        }
        for (dk, di) in iproduct!(0..2, 0..2) {
            out.push(self.edge_id(1, i + di, j, k + dk));
        }
        for (dj, di) in iproduct!(0..2, 0..2) {
            out.push(self.edge_id(2, i + di, j + dj, k));
        }
        Ok(out)
    }

    fn edge_get_nodes(&self, e: EntityId) -> Result<(EntityId, EntityId), MeshError> {
        self.check(EntityKind::Edge, e)?;
        if self.dim == 2 {
            let nodes = self.face_get_nodes(e)?;
            return Ok((nodes[0], nodes[1]));
        }
        let (axis, i, j, k) = self.edge_axis_ijk(e);
        let a = self.node_id(i, j, k);
        let b = match axis {
            0 => self.node_id(i + 1, j, k),
            1 => self.node_id(i, j + 1, k),
            _ => self.node_id(i, j, k + 1),
        };
        Ok((a, b))
    }
}
