//! Reductions and ghost updates across processes.
//!
//! The upwind selector and other global operations only need a handful of
//! collective calls, so the interface stays minimal. [`NoComm`] is the
//! single-process implementation; an MPI-backed type would implement the
//! same trait.

use crate::topology::entity::{EntityId, EntityKind};

pub trait Communicator: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn max_all(&self, local: f64) -> f64;
    fn min_all(&self, local: f64) -> f64;
    fn sum_all(&self, local: f64) -> f64;

    /// Overwrite the ghost entries of `values` (indexed by entity id of
    /// `kind`, owned first) with the values of their owners.
    fn scatter_to_ghosts(&self, kind: EntityKind, values: &mut [f64]);
}

/// Serial communicator: identity reductions, no ghosts to update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn max_all(&self, local: f64) -> f64 {
        local
    }

    fn min_all(&self, local: f64) -> f64 {
        local
    }

    fn sum_all(&self, local: f64) -> f64 {
        local
    }

    fn scatter_to_ghosts(&self, _kind: EntityKind, _values: &mut [f64]) {}
}

/// Single-process communicator whose ghosts are copies of local owners,
/// e.g. periodic images.
#[derive(Clone, Debug, Default)]
pub struct LocalGhostComm {
    /// `(ghost, owner)` pairs per entity kind.
    links: [Vec<(EntityId, EntityId)>; 4],
}

impl LocalGhostComm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(mut self, kind: EntityKind, ghost: EntityId, owner: EntityId) -> Self {
        self.links[kind as usize].push((ghost, owner));
        self
    }
}

impl Communicator for LocalGhostComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn max_all(&self, local: f64) -> f64 {
        local
    }

    fn min_all(&self, local: f64) -> f64 {
        local
    }

    fn sum_all(&self, local: f64) -> f64 {
        local
    }

    fn scatter_to_ghosts(&self, kind: EntityKind, values: &mut [f64]) {
        for &(ghost, owner) in &self.links[kind as usize] {
            if ghost < values.len() && owner < values.len() {
                values[ghost] = values[owner];
            }
        }
    }
}
