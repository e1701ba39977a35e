pub mod collection;

pub use collection::{CollectionData, CollectionId, CollectionKind, FaultKind, HorizonKind};

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::ModelError;
use crate::model::EntityId;

/// The geological semantic layer: named groups of base entities.
///
/// Membership is many-to-many. The store keeps a forward index
/// (collection → members) and a reverse index (entity → collections)
/// and updates both on every mutation; round-trip scenarios lean on
/// their agreement.
#[derive(Debug, Default)]
pub struct CollectionStore {
    collections: SlotMap<CollectionId, CollectionData>,
    memberships: HashMap<EntityId, Vec<CollectionId>>,
}

impl CollectionStore {
    /// Creates a new, empty collection store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection of the given kind and returns its ID.
    pub fn add_collection(&mut self, kind: CollectionKind, name: impl Into<String>) -> CollectionId {
        self.collections.insert(CollectionData::new(kind, name))
    }

    /// Returns a reference to the collection data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the store.
    pub fn collection(&self, id: CollectionId) -> Result<&CollectionData, ModelError> {
        self.collections
            .get(id)
            .ok_or_else(|| ModelError::CollectionNotFound(format!("{id:?}")))
    }

    /// Renames a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the store.
    pub fn rename(&mut self, id: CollectionId, name: impl Into<String>) -> Result<(), ModelError> {
        let data = self
            .collections
            .get_mut(id)
            .ok_or_else(|| ModelError::CollectionNotFound(format!("{id:?}")))?;
        data.name = name.into();
        Ok(())
    }

    /// Adds `entity` to `collection`, updating both indexes. Re-adding
    /// an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the store.
    pub fn add_member(&mut self, id: CollectionId, entity: EntityId) -> Result<(), ModelError> {
        let data = self
            .collections
            .get_mut(id)
            .ok_or_else(|| ModelError::CollectionNotFound(format!("{id:?}")))?;
        if data.members.contains(&entity) {
            return Ok(());
        }
        data.members.push(entity);
        self.memberships.entry(entity).or_default().push(id);
        Ok(())
    }

    /// The member entities of `id`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the store.
    pub fn members_of(&self, id: CollectionId) -> Result<&[EntityId], ModelError> {
        Ok(self.collection(id)?.members())
    }

    /// The collections referencing `entity`, in insertion order.
    #[must_use]
    pub fn collections_of(&self, entity: EntityId) -> &[CollectionId] {
        self.memberships.get(&entity).map_or(&[], Vec::as_slice)
    }

    /// Number of collections referencing `entity`.
    #[must_use]
    pub fn nb_collections_of(&self, entity: EntityId) -> usize {
        self.collections_of(entity).len()
    }

    /// Iterates over all collections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (CollectionId, &CollectionData)> {
        self.collections.iter()
    }

    /// Total number of collections.
    #[must_use]
    pub fn nb_collections(&self) -> usize {
        self.collections.len()
    }

    /// Number of fault collections.
    #[must_use]
    pub fn nb_faults(&self) -> usize {
        self.count(|kind| matches!(kind, CollectionKind::Fault(_)))
    }

    /// Number of horizon collections.
    #[must_use]
    pub fn nb_horizons(&self) -> usize {
        self.count(|kind| matches!(kind, CollectionKind::Horizon(_)))
    }

    /// Number of model-boundary collections.
    #[must_use]
    pub fn nb_model_boundaries(&self) -> usize {
        self.count(|kind| matches!(kind, CollectionKind::ModelBoundary))
    }

    fn count(&self, filter: fn(CollectionKind) -> bool) -> usize {
        self.collections
            .values()
            .filter(|data| filter(data.kind()))
            .count()
    }

    /// Drops `entity` from every collection referencing it.
    pub fn remove_entity(&mut self, entity: EntityId) {
        if let Some(owners) = self.memberships.remove(&entity) {
            for owner in owners {
                if let Some(data) = self.collections.get_mut(owner) {
                    data.members.retain(|&m| m != entity);
                }
            }
        }
    }

    /// Removes a collection, dropping it from the reverse index.
    pub fn remove_collection(&mut self, id: CollectionId) {
        if let Some(data) = self.collections.remove(id) {
            for member in data.members {
                if let Some(owners) = self.memberships.get_mut(&member) {
                    owners.retain(|&o| o != id);
                }
            }
        }
    }

    /// Checks that the forward and reverse indexes agree.
    ///
    /// A mismatch is a programming error; this runs at format
    /// boundaries and in tests.
    pub fn verify_integrity(&self) -> Result<(), ModelError> {
        for (id, data) in &self.collections {
            for member in data.members() {
                if !self.collections_of(*member).contains(&id) {
                    return Err(ModelError::Corrupted(format!(
                        "member {member} of \"{}\" missing from reverse index",
                        data.name
                    )));
                }
            }
        }
        for (entity, owners) in &self.memberships {
            for owner in owners {
                let data = self.collection(*owner)?;
                if !data.members().contains(entity) {
                    return Err(ModelError::Corrupted(format!(
                        "reverse index entry {entity} -> \"{}\" missing from forward index",
                        data.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::StructuralModel;

    fn surfaces(model: &mut StructuralModel, n: usize) -> Vec<EntityId> {
        (0..n)
            .map(|i| model.add_surface(format!("s{i}")).into())
            .collect()
    }

    #[test]
    fn membership_is_many_to_many() {
        let mut model = StructuralModel::new("test");
        let s = surfaces(&mut model, 3);
        let mut store = CollectionStore::new();
        let fault = store.add_collection(CollectionKind::Fault(FaultKind::Normal), "f1");
        let boundary = store.add_collection(CollectionKind::ModelBoundary, "top");
        store.add_member(fault, s[0]).unwrap();
        store.add_member(fault, s[1]).unwrap();
        store.add_member(boundary, s[1]).unwrap();

        assert_eq!(store.members_of(fault).unwrap(), &[s[0], s[1]]);
        assert_eq!(store.collections_of(s[1]), &[fault, boundary]);
        assert!(store.collections_of(s[2]).is_empty());
        store.verify_integrity().unwrap();
    }

    #[test]
    fn readding_member_is_noop() {
        let mut model = StructuralModel::new("test");
        let s = surfaces(&mut model, 1);
        let mut store = CollectionStore::new();
        let horizon = store.add_collection(CollectionKind::Horizon(HorizonKind::Conformal), "h");
        store.add_member(horizon, s[0]).unwrap();
        store.add_member(horizon, s[0]).unwrap();
        assert_eq!(store.collection(horizon).unwrap().nb_members(), 1);
        assert_eq!(store.nb_collections_of(s[0]), 1);
    }

    #[test]
    fn counts_by_kind() {
        let mut store = CollectionStore::new();
        store.add_collection(CollectionKind::Fault(FaultKind::NoType), "f1");
        store.add_collection(CollectionKind::Fault(FaultKind::Reverse), "f2");
        store.add_collection(CollectionKind::Horizon(HorizonKind::NoType), "h1");
        store.add_collection(CollectionKind::ModelBoundary, "b1");
        assert_eq!(store.nb_faults(), 2);
        assert_eq!(store.nb_horizons(), 1);
        assert_eq!(store.nb_model_boundaries(), 1);
        assert_eq!(store.nb_collections(), 4);
    }

    #[test]
    fn remove_entity_keeps_indexes_consistent() {
        let mut model = StructuralModel::new("test");
        let s = surfaces(&mut model, 2);
        let mut store = CollectionStore::new();
        let fault = store.add_collection(CollectionKind::Fault(FaultKind::NoType), "f");
        store.add_member(fault, s[0]).unwrap();
        store.add_member(fault, s[1]).unwrap();
        store.remove_entity(s[0]);
        assert_eq!(store.members_of(fault).unwrap(), &[s[1]]);
        assert!(store.collections_of(s[0]).is_empty());
        store.verify_integrity().unwrap();
    }

    #[test]
    fn remove_collection_keeps_indexes_consistent() {
        let mut model = StructuralModel::new("test");
        let s = surfaces(&mut model, 1);
        let mut store = CollectionStore::new();
        let b1 = store.add_collection(CollectionKind::ModelBoundary, "b1");
        let b2 = store.add_collection(CollectionKind::ModelBoundary, "b2");
        store.add_member(b1, s[0]).unwrap();
        store.add_member(b2, s[0]).unwrap();
        store.remove_collection(b1);
        assert_eq!(store.collections_of(s[0]), &[b2]);
        store.verify_integrity().unwrap();
    }
}
