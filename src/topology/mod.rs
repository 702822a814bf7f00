//! Top-level module for mesh topology metadata.
//!
//! This module provides the vocabulary shared by every mesh backend:
//! - Entity kinds and parallel categories
//! - Cell types
//! - Ownership (owned/ghost partition) bookkeeping
//! - Labeled entity sets
//!
//! Adjacency itself lives in the backends under [`crate::mesh`].

pub mod cell_type;
pub mod entity;
pub mod labels;
pub mod ownership;

pub use cell_type::CellType;
pub use entity::{EntityId, EntityKind, ParallelType};
pub use labels::LabelSet;
pub use ownership::EntityOwnership;
