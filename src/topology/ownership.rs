//! Ownership metadata for mesh entities.
//!
//! The [`EntityOwnership`] map records, per entity kind, how many entities
//! are owned on this rank and how many are used (owned + ghost). Local ids
//! are partition-ordered, so the category of an entity follows from its id.

use crate::mesh_error::MeshError;
use crate::topology::entity::{EntityId, EntityKind, ParallelType};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEntry {
    pub owned: usize,
    pub used: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityOwnership {
    entries: [OwnershipEntry; 4],
}

fn slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Node => 0,
        EntityKind::Edge => 1,
        EntityKind::Face => 2,
        EntityKind::Cell => 3,
    }
}

impl EntityOwnership {
    /// Ownership map where every entity is owned (serial mesh).
    pub fn serial(nnodes: usize, nedges: usize, nfaces: usize, ncells: usize) -> Self {
        let mut ownership = Self::default();
        for (kind, n) in [
            (EntityKind::Node, nnodes),
            (EntityKind::Edge, nedges),
            (EntityKind::Face, nfaces),
            (EntityKind::Cell, ncells),
        ] {
            ownership.entries[slot(kind)] = OwnershipEntry { owned: n, used: n };
        }
        ownership
    }

    /// Set the owned/used counts for one kind.
    pub fn set(&mut self, kind: EntityKind, owned: usize, used: usize) -> Result<(), MeshError> {
        if owned > used {
            return Err(MeshError::InvalidTopology(format!(
                "{kind}: owned count {owned} exceeds used count {used}"
            )));
        }
        self.entries[slot(kind)] = OwnershipEntry { owned, used };
        Ok(())
    }

    /// Retrieve the counts for a kind.
    pub fn entry(&self, kind: EntityKind) -> OwnershipEntry {
        self.entries[slot(kind)]
    }

    /// Number of entities of `kind` in category `ptype`.
    pub fn count(&self, kind: EntityKind, ptype: ParallelType) -> usize {
        let e = self.entry(kind);
        match ptype {
            ParallelType::Owned => e.owned,
            ParallelType::Ghost => e.used - e.owned,
            ParallelType::Used => e.used,
        }
    }

    /// Contiguous id range of `kind` in category `ptype`.
    pub fn ids(&self, kind: EntityKind, ptype: ParallelType) -> Range<EntityId> {
        let e = self.entry(kind);
        match ptype {
            ParallelType::Owned => 0..e.owned,
            ParallelType::Ghost => e.owned..e.used,
            ParallelType::Used => 0..e.used,
        }
    }

    /// Category of an entity, or an error for out-of-range ids.
    pub fn ptype(&self, kind: EntityKind, id: EntityId) -> Result<ParallelType, MeshError> {
        let e = self.entry(kind);
        if id < e.owned {
            Ok(ParallelType::Owned)
        } else if id < e.used {
            Ok(ParallelType::Ghost)
        } else {
            Err(MeshError::InvalidEntityId {
                kind,
                id,
                count: e.used,
            })
        }
    }

    /// Returns true if `id` belongs to category `ptype`.
    pub fn contains(&self, kind: EntityKind, ptype: ParallelType, id: EntityId) -> bool {
        self.ptype(kind, id).is_ok_and(|actual| ptype.admits(actual))
    }

    /// Validate an id against the used range.
    pub fn check(&self, kind: EntityKind, id: EntityId) -> Result<(), MeshError> {
        self.ptype(kind, id).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghosts_follow_owned() {
        let mut own = EntityOwnership::serial(9, 0, 12, 4);
        own.set(EntityKind::Cell, 3, 4).unwrap();
        assert_eq!(own.count(EntityKind::Cell, ParallelType::Owned), 3);
        assert_eq!(own.count(EntityKind::Cell, ParallelType::Ghost), 1);
        assert_eq!(own.ids(EntityKind::Cell, ParallelType::Ghost), 3..4);
        assert_eq!(own.ptype(EntityKind::Cell, 3).unwrap(), ParallelType::Ghost);
        assert!(own.contains(EntityKind::Cell, ParallelType::Used, 3));
        assert!(!own.contains(EntityKind::Cell, ParallelType::Owned, 3));
    }

    #[test]
    fn out_of_range_is_invalid() {
        let own = EntityOwnership::serial(4, 0, 4, 1);
        let err = own.ptype(EntityKind::Face, 4).unwrap_err();
        assert!(matches!(err, MeshError::InvalidEntityId { id: 4, .. }));
        let mut copy = own.clone();
        assert!(copy.set(EntityKind::Node, 5, 4).is_err());
        assert_eq!(copy, own);
    }
}
