//! Mesh consistency checks.
//!
//! Structural errors (faces with no or too many cells, too few faces per
//! cell) are rejected while the topology is copied. The checks here run on
//! the finished mesh: positive measures and outward-pointing oriented
//! normals. Faces with a tiny area relative to their cell are only warned
//! about.

use crate::debug_invariants::DebugInvariants;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityKind, ParallelType};

/// Faces smaller than this fraction of the cell's face scale are reported.
const TINY_FACE_FRACTION: f64 = 1e-10;

impl Mesh {
    fn check_cell(&self, c: usize) -> Result<(), MeshError> {
        let vol = self.cell_volume(c)?;
        if !(vol > 0.0) {
            return Err(MeshError::DegenerateCell { cell: c, volume: vol });
        }
        let d = self.manifold_dimension() as f64;
        let face_scale = vol.powf((d - 1.0) / d);
        let xc = self.cell_centroid(c)?;

        for &f in self.cell_get_faces(c)? {
            let area = self.face_area(f)?;
            if area < TINY_FACE_FRACTION * face_scale {
                self.verbose()
                    .warn(format_args!("face {f} of cell {c} has tiny area {area:e}"));
            }
            let (normal, _) = self.face_normal_oriented(f, c)?;
            let outward = (self.face_centroid(f)? - xc).dot(&normal);
            if !(outward > 0.0) {
                return Err(MeshError::InvalidGeometry(format!(
                    "normal of face {f} points into cell {c}"
                )));
            }
        }
        Ok(())
    }
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        for f in self.entity_ids(EntityKind::Face, ParallelType::Used) {
            let ncells = self.face_get_cells(f, ParallelType::Used)?.len();
            if !(1..=2).contains(&ncells) {
                return Err(MeshError::InvalidTopology(format!(
                    "face {f} is adjacent to {ncells} cells"
                )));
            }
        }
        let min_faces = self.manifold_dimension() + 1;
        for c in self.entity_ids(EntityKind::Cell, ParallelType::Used) {
            let nfaces = self.cell_get_faces(c)?.len();
            if nfaces < min_faces {
                return Err(MeshError::InvalidTopology(format!(
                    "cell {c} has {nfaces} faces, needs at least {min_faces}"
                )));
            }
            self.check_cell(c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;
    use crate::geometry::region::GeometricModel;
    use crate::mesh::UnstructuredMesh;
    use crate::verbose::VerboseObject;
    use std::sync::Arc;

    fn unit_square(dirs: Vec<i32>) -> Result<Mesh, MeshError> {
        let nodes = vec![
            Point::new2(0.0, 0.0),
            Point::new2(1.0, 0.0),
            Point::new2(1.0, 1.0),
            Point::new2(0.0, 1.0),
        ];
        let faces = vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 0]];
        let backend = UnstructuredMesh::new(nodes, faces, vec![vec![0, 1, 2, 3]], vec![dirs])?;
        Mesh::new(
            backend,
            Arc::new(GeometricModel::default()),
            VerboseObject::silent("test"),
        )
    }

    #[test]
    fn consistent_square_validates() {
        let m = unit_square(vec![1, 1, 1, 1]).unwrap();
        assert!(m.validate_invariants().is_ok());
        m.debug_assert_invariants();
    }

    #[test]
    fn flipped_face_is_rejected() {
        // One reversed dir breaks the boundary loop and the outward normal.
        assert!(unit_square(vec![1, -1, 1, 1]).is_err());
    }

    #[test]
    fn tiny_face_is_only_reported() {
        let nodes = vec![
            Point::new2(0.0, 0.0),
            Point::new2(1.0, 0.0),
            Point::new2(1.0, 1e-12),
            Point::new2(1.0, 1.0),
            Point::new2(0.0, 1.0),
        ];
        let faces = vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 4], vec![4, 0]];
        let backend =
            UnstructuredMesh::new(nodes, faces, vec![vec![0, 1, 2, 3, 4]], vec![vec![1; 5]]).unwrap();
        let m = Mesh::new(
            backend,
            Arc::new(GeometricModel::default()),
            VerboseObject::new("test", crate::verbose::Verbosity::High),
        )
        .unwrap();
        assert!(m.face_area(1).unwrap() < TINY_FACE_FRACTION);
        assert!(m.validate_invariants().is_ok());
    }

    #[test]
    fn inverted_cell_is_degenerate() {
        let err = unit_square(vec![-1, -1, -1, -1]).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateCell { .. }));
    }
}
