//! Cell type metadata for mesh cells.

use serde::{Deserialize, Serialize};

/// Common cell types for mesh elements.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// Type could not be determined.
    #[default]
    Unknown,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 2D polygon with more than four vertices.
    Polygon,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// Generic polyhedron.
    Polyhedron,
}

impl CellType {
    /// Returns the topological dimension of the cell, when well-defined.
    pub fn dimension(self) -> Option<u8> {
        match self {
            CellType::Unknown => None,
            CellType::Triangle | CellType::Quadrilateral | CellType::Polygon => Some(2),
            CellType::Tetrahedron
            | CellType::Prism
            | CellType::Pyramid
            | CellType::Hexahedron
            | CellType::Polyhedron => Some(3),
        }
    }

    /// Classify a 2D cell by its number of vertices.
    pub fn polygon(nnodes: usize) -> Self {
        match nnodes {
            3 => CellType::Triangle,
            4 => CellType::Quadrilateral,
            n if n > 4 => CellType::Polygon,
            _ => CellType::Unknown,
        }
    }

    /// Classify a 3D cell by its face and node counts.
    ///
    /// Prism/pyramid/hex detection only looks at counts; callers with
    /// exotic polyhedra sharing these counts should set the type explicitly.
    pub fn polyhedron(nfaces: usize, nnodes: usize) -> Self {
        match (nfaces, nnodes) {
            (4, 4) => CellType::Tetrahedron,
            (5, 5) => CellType::Pyramid,
            (5, 6) => CellType::Prism,
            (6, 8) => CellType::Hexahedron,
            (f, n) if f >= 4 && n >= 4 => CellType::Polyhedron,
            _ => CellType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_counts() {
        assert_eq!(CellType::polygon(3), CellType::Triangle);
        assert_eq!(CellType::polygon(6), CellType::Polygon);
        assert_eq!(CellType::polygon(2), CellType::Unknown);
        assert_eq!(CellType::polyhedron(6, 8), CellType::Hexahedron);
        assert_eq!(CellType::polyhedron(7, 10), CellType::Polyhedron);
        assert_eq!(CellType::Hexahedron.dimension(), Some(3));
        assert_eq!(CellType::Unknown.dimension(), None);
    }
}
