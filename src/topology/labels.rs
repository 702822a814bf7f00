//! Labeled entity sets for topology metadata.
//!
//! Labels map a set name to a sorted, deduplicated list of entity ids of a
//! single kind. Meshes read from files carry them (side sets, element
//! blocks); the structured backend publishes its boundary sides this way.
//! Labeled-set regions resolve against this store.

use crate::topology::entity::{EntityId, EntityKind};
use hashbrown::HashMap;

/// Named entity lists, grouped by entity kind.
#[derive(Clone, Debug, Default)]
pub struct LabelSet {
    sets: HashMap<(String, EntityKind), Vec<EntityId>>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set `name` for `kind` with `ids` (sorted and deduplicated).
    ///
    /// Returns the previous contents, if any.
    pub fn insert<I>(&mut self, name: &str, kind: EntityKind, ids: I) -> Option<Vec<EntityId>>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut ids: Vec<EntityId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.sets.insert((name.to_string(), kind), ids)
    }

    /// Add a single entity to a set, creating the set if needed.
    pub fn add(&mut self, name: &str, kind: EntityKind, id: EntityId) {
        let set = self.sets.entry((name.to_string(), kind)).or_default();
        if let Err(pos) = set.binary_search(&id) {
            set.insert(pos, id);
        }
    }

    /// Entities of the set `name` of kind `kind`, if it exists.
    pub fn get(&self, name: &str, kind: EntityKind) -> Option<&[EntityId]> {
        self.sets
            .get(&(name.to_string(), kind))
            .map(Vec::as_slice)
    }

    /// True if there is a set `name` of kind `kind`.
    pub fn contains_set(&self, name: &str, kind: EntityKind) -> bool {
        self.get(name, kind).is_some()
    }

    /// True if `id` is a member of the set.
    pub fn is_member(&self, name: &str, kind: EntityKind, id: EntityId) -> bool {
        self.get(name, kind)
            .is_some_and(|set| set.binary_search(&id).is_ok())
    }

    /// All set names for `kind`, sorted.
    pub fn names(&self, kind: EntityKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .sets
            .keys()
            .filter(|(_, k)| *k == kind)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of stored sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sorts_and_dedups() {
        let mut labels = LabelSet::new();
        labels.insert("inlet", EntityKind::Face, [5, 1, 5, 3]);
        assert_eq!(labels.get("inlet", EntityKind::Face), Some(&[1, 3, 5][..]));
        assert!(labels.get("inlet", EntityKind::Cell).is_none());
        labels.add("inlet", EntityKind::Face, 2);
        labels.add("inlet", EntityKind::Face, 3);
        assert_eq!(
            labels.get("inlet", EntityKind::Face),
            Some(&[1, 2, 3, 5][..])
        );
        assert!(labels.is_member("inlet", EntityKind::Face, 2));
        assert!(!labels.is_member("inlet", EntityKind::Face, 4));
    }

    #[test]
    fn names_are_per_kind() {
        let mut labels = LabelSet::new();
        labels.insert("b", EntityKind::Face, [0]);
        labels.insert("a", EntityKind::Face, [1]);
        labels.insert("block", EntityKind::Cell, [0]);
        assert_eq!(labels.names(EntityKind::Face), vec!["a", "b"]);
        assert_eq!(labels.names(EntityKind::Cell), vec!["block"]);
        assert_eq!(labels.len(), 3);
    }
}
