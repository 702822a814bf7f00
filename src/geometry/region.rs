//! Named regions and the geometric model that holds them.
//!
//! Geometric regions (box, plane, point, all) answer point containment;
//! the remaining kinds are resolved by the mesh from its topology or its
//! labeled sets.

use crate::geometry::point::Point;
use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityId, EntityKind};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Relative tolerance for on-plane and on-box-boundary tests.
pub const REGION_TOLERANCE: f64 = 1e-10;

/// Region identifier, unique within a [`GeometricModel`].
pub type SetId = u32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    /// Axis-aligned box `lo <= x <= hi` (boundary included).
    Box { lo: Point, hi: Point },
    /// Plane through `point` with normal `normal`.
    Plane { point: Point, normal: Point },
    /// A single point.
    Point(Point),
    /// The whole domain.
    All,
    /// Every entity on the domain boundary.
    Boundary,
    /// Entities stored in the mesh under `label`.
    LabeledSet { label: String, entity: EntityKind },
    /// Explicit list of entity ids.
    Enumerated { entity: EntityKind, ids: Vec<EntityId> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    name: String,
    id: SetId,
    kind: RegionKind,
}

impl Region {
    /// Build and validate a region.
    pub fn new(name: impl Into<String>, id: SetId, kind: RegionKind) -> Result<Self, MeshError> {
        let name = name.into();
        let malformed = |reason: String| MeshError::MalformedRegion {
            name: name.clone(),
            reason,
        };
        match &kind {
            RegionKind::Box { lo, hi } => {
                if lo.dim() != hi.dim() {
                    return Err(malformed(format!(
                        "corner dimensions differ ({} vs {})",
                        lo.dim(),
                        hi.dim()
                    )));
                }
                if let Some(i) = (0..lo.dim()).find(|&i| lo[i] > hi[i]) {
                    return Err(malformed(format!(
                        "lower corner exceeds upper corner in component {i}"
                    )));
                }
            }
            RegionKind::Plane { point, normal } => {
                if point.dim() != normal.dim() {
                    return Err(malformed("point and normal dimensions differ".into()));
                }
                if normal.norm() == 0.0 {
                    return Err(malformed("plane normal is zero".into()));
                }
            }
            RegionKind::LabeledSet { label, .. } if label.is_empty() => {
                return Err(malformed("empty label".into()));
            }
            _ => {}
        }
        Ok(Self { name, id, kind })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SetId {
        self.id
    }

    pub fn kind(&self) -> &RegionKind {
        &self.kind
    }

    /// True for regions defined by point containment.
    pub fn is_geometric(&self) -> bool {
        matches!(
            self.kind,
            RegionKind::Box { .. } | RegionKind::Plane { .. } | RegionKind::Point(_) | RegionKind::All
        )
    }

    /// Space dimension of a geometric region, `None` for the others and `All`.
    pub fn space_dimension(&self) -> Option<usize> {
        match &self.kind {
            RegionKind::Box { lo, .. } => Some(lo.dim()),
            RegionKind::Plane { point, .. } => Some(point.dim()),
            RegionKind::Point(p) => Some(p.dim()),
            _ => None,
        }
    }

    /// Point containment for geometric regions.
    pub fn inside(&self, p: &Point) -> Result<bool, MeshError> {
        if let Some(d) = self.space_dimension() {
            if d != p.dim() {
                return Err(MeshError::PreconditionViolated(format!(
                    "{}D point tested against {d}D region `{}`",
                    p.dim(),
                    self.name
                )));
            }
        }
        match &self.kind {
            RegionKind::Box { lo, hi } => {
                let d = lo.dim();
                let scale = (0..d).fold(1.0_f64, |m, i| m.max(hi[i] - lo[i]));
                let tol = REGION_TOLERANCE * scale;
                Ok((0..d).all(|i| p[i] >= lo[i] - tol && p[i] <= hi[i] + tol))
            }
            RegionKind::Plane { point, normal } => {
                let d = (*p - *point).with_dim(point.dim());
                let n = *normal / normal.norm();
                let scale = point.norm().max(p.norm()).max(1.0);
                Ok(d.dot(&n).abs() <= REGION_TOLERANCE * scale)
            }
            RegionKind::Point(q) => {
                let scale = q.norm().max(1.0);
                Ok(p.with_dim(q.dim()).distance(q) <= REGION_TOLERANCE * scale)
            }
            RegionKind::All => Ok(true),
            _ => Err(MeshError::unsupported(format!(
                "point containment for non-geometric region `{}`",
                self.name
            ))),
        }
    }
}

/// Immutable collection of named regions shared among meshes.
#[derive(Clone, Debug, Default)]
pub struct GeometricModel {
    dim: usize,
    regions: Vec<Arc<Region>>,
    by_name: HashMap<String, usize>,
}

impl GeometricModel {
    /// Build a model; region names and ids must be unique.
    pub fn new(dim: usize, regions: Vec<Region>) -> Result<Self, MeshError> {
        let mut by_name = HashMap::with_capacity(regions.len());
        let mut ids = HashMap::with_capacity(regions.len());
        for (i, r) in regions.iter().enumerate() {
            if by_name.insert(r.name().to_string(), i).is_some() {
                return Err(MeshError::MalformedRegion {
                    name: r.name().to_string(),
                    reason: "duplicate region name".into(),
                });
            }
            if ids.insert(r.id(), i).is_some() {
                return Err(MeshError::MalformedRegion {
                    name: r.name().to_string(),
                    reason: format!("duplicate region id {}", r.id()),
                });
            }
            if let Some(rd) = r.space_dimension() {
                if rd != dim {
                    return Err(MeshError::MalformedRegion {
                        name: r.name().to_string(),
                        reason: format!("region dimension {rd} in a {dim}D model"),
                    });
                }
            }
        }
        Ok(Self {
            dim,
            regions: regions.into_iter().map(Arc::new).collect(),
            by_name,
        })
    }

    pub fn space_dimension(&self) -> usize {
        self.dim
    }

    pub fn find_region(&self, name: &str) -> Result<&Arc<Region>, MeshError> {
        self.by_name
            .get(name)
            .map(|&i| &self.regions[i])
            .ok_or_else(|| MeshError::UnknownRegion(name.to_string()))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_validation_and_containment() {
        let bad = Region::new(
            "b",
            1,
            RegionKind::Box {
                lo: Point::new2(1.0, 0.0),
                hi: Point::new2(0.0, 1.0),
            },
        );
        assert!(matches!(bad, Err(MeshError::MalformedRegion { .. })));

        let r = Region::new(
            "b",
            1,
            RegionKind::Box {
                lo: Point::new2(0.0, 0.0),
                hi: Point::new2(1.0, 1.0),
            },
        )
        .unwrap();
        assert!(r.inside(&Point::new2(1.0, 0.5)).unwrap());
        assert!(!r.inside(&Point::new2(1.1, 0.5)).unwrap());
    }

    #[test]
    fn containment_requires_matching_dimension() {
        let b = Region::new(
            "slab",
            1,
            RegionKind::Box {
                lo: Point::new3(0.0, 0.0, 5.0),
                hi: Point::new3(1.0, 1.0, 6.0),
            },
        )
        .unwrap();
        assert!(matches!(
            b.inside(&Point::new2(0.5, 0.5)),
            Err(MeshError::PreconditionViolated(_))
        ));
        let q = Region::new("well", 2, RegionKind::Point(Point::new2(0.5, 0.5))).unwrap();
        assert!(q.inside(&Point::new3(0.5, 0.5, 0.0)).is_err());
        assert!(q.inside(&Point::new2(0.5, 0.5)).unwrap());
    }

    #[test]
    fn plane_and_non_geometric_regions() {
        let p = Region::new(
            "p",
            2,
            RegionKind::Plane {
                point: Point::new3(0.0, 0.0, 1.0),
                normal: Point::new3(0.0, 0.0, 2.0),
            },
        )
        .unwrap();
        assert!(p.inside(&Point::new3(0.3, 0.7, 1.0)).unwrap());
        assert!(!p.inside(&Point::new3(0.3, 0.7, 0.9)).unwrap());

        let zero = Region::new(
            "z",
            3,
            RegionKind::Plane {
                point: Point::new3(0.0, 0.0, 1.0),
                normal: Point::new3(0.0, 0.0, 0.0),
            },
        );
        assert!(zero.is_err());

        let b = Region::new("bnd", 4, RegionKind::Boundary).unwrap();
        assert!(!b.is_geometric());
        assert!(matches!(
            b.inside(&Point::new3(0.0, 0.0, 0.0)),
            Err(MeshError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn model_lookup() {
        let gm = GeometricModel::new(
            2,
            vec![
                Region::new("all", 1, RegionKind::All).unwrap(),
                Region::new("bnd", 2, RegionKind::Boundary).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(gm.find_region("bnd").unwrap().id(), 2);
        assert!(matches!(
            gm.find_region("nope"),
            Err(MeshError::UnknownRegion(_))
        ));
        let dup = GeometricModel::new(
            2,
            vec![
                Region::new("a", 1, RegionKind::All).unwrap(),
                Region::new("a", 2, RegionKind::All).unwrap(),
            ],
        );
        assert!(dup.is_err());
    }
}
