//! Entity kinds, parallel categories and local entity ids.
//!
//! Local numbering always lists owned entities first; ghosts follow. A
//! `Used` query therefore returns `0..n_used`, an `Owned` query `0..n_owned`
//! and a `Ghost` query `n_owned..n_used`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Local (rank-relative) entity index.
pub type EntityId = usize;

/// Topological kind of a mesh entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Edge,
    Face,
    Cell,
}

impl EntityKind {
    /// All kinds in increasing dimension.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Node,
        EntityKind::Edge,
        EntityKind::Face,
        EntityKind::Cell,
    ];

    /// Parse the lower-case names used in region definitions.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "node" | "nodes" => Some(EntityKind::Node),
            "edge" | "edges" => Some(EntityKind::Edge),
            "face" | "faces" | "side" | "sides" => Some(EntityKind::Face),
            "cell" | "cells" | "element" | "elements" => Some(EntityKind::Cell),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Face => "face",
            EntityKind::Cell => "cell",
        };
        f.write_str(name)
    }
}

/// Parallel category of an entity on the current rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelType {
    /// Entities owned by this rank.
    Owned,
    /// Copies of entities owned by another rank.
    Ghost,
    /// Owned followed by ghost entities.
    Used,
}

impl ParallelType {
    /// Returns true if an entity of category `actual` belongs to `self`.
    #[inline]
    pub fn admits(self, actual: ParallelType) -> bool {
        match self {
            ParallelType::Used => true,
            other => other == actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_admits_everything() {
        assert!(ParallelType::Used.admits(ParallelType::Owned));
        assert!(ParallelType::Used.admits(ParallelType::Ghost));
        assert!(ParallelType::Owned.admits(ParallelType::Owned));
        assert!(!ParallelType::Owned.admits(ParallelType::Ghost));
        assert!(!ParallelType::Ghost.admits(ParallelType::Owned));
    }

    #[test]
    fn kind_names() {
        assert_eq!(EntityKind::from_name("Faces"), Some(EntityKind::Face));
        assert_eq!(EntityKind::from_name("element"), Some(EntityKind::Cell));
        assert_eq!(EntityKind::from_name("volume"), None);
        assert_eq!(EntityKind::Cell.to_string(), "cell");
    }
}
