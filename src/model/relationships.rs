use std::collections::HashMap;

use crate::error::ModelError;

use super::EntityId;

/// Relations recorded on top of the entity store.
///
/// Two relation families live here: boundary incidence (a lower-dimension
/// entity bounding a higher-dimension one) and internal embedding (an
/// entity strictly contained in a host's interior). Both sides of each
/// relation are kept indexed so lookups in either direction are O(1).
///
/// The graph stores identifiers only; it never owns entity data.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    /// entity → the lower-dimension entities bounding it.
    boundaries: HashMap<EntityId, Vec<EntityId>>,
    /// entity → the higher-dimension entities it bounds.
    incidences: HashMap<EntityId, Vec<EntityId>>,
    /// inner entity → its unique host.
    hosts: HashMap<EntityId, EntityId>,
    /// host → its internal entities.
    internals: HashMap<EntityId, Vec<EntityId>>,
}

impl RelationshipGraph {
    /// Creates a new, empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `lower` bounds `upper`. Re-adding an existing
    /// incidence is a no-op, so the relation set stays duplicate-free.
    pub fn add_boundary(&mut self, lower: EntityId, upper: EntityId) {
        let bounds = self.boundaries.entry(upper).or_default();
        if bounds.contains(&lower) {
            return;
        }
        bounds.push(lower);
        self.incidences.entry(lower).or_default().push(upper);
    }

    /// The lower-dimension entities bounding `id`, in insertion order.
    #[must_use]
    pub fn boundaries_of(&self, id: EntityId) -> &[EntityId] {
        self.boundaries.get(&id).map_or(&[], Vec::as_slice)
    }

    /// The higher-dimension entities that `id` bounds, in insertion order.
    #[must_use]
    pub fn incidences_of(&self, id: EntityId) -> &[EntityId] {
        self.incidences.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Records that `inner` is internal to `host`.
    ///
    /// Internal embedding is a forest: each entity has at most one host.
    /// Re-adding the same relation is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InternalConflict`] if `inner` already has a
    /// distinct host, and [`ModelError::InternalCycle`] if the relation
    /// would make an entity its own transitive host.
    pub fn add_internal(&mut self, inner: EntityId, host: EntityId) -> Result<(), ModelError> {
        if let Some(&existing) = self.hosts.get(&inner) {
            if existing == host {
                return Ok(());
            }
            return Err(ModelError::InternalConflict {
                inner: inner.to_string(),
                existing: existing.to_string(),
                requested: host.to_string(),
            });
        }
        // Walk up from the host; reaching `inner` would close a cycle.
        let mut ancestor = Some(host);
        while let Some(current) = ancestor {
            if current == inner {
                return Err(ModelError::InternalCycle {
                    inner: inner.to_string(),
                });
            }
            ancestor = self.hosts.get(&current).copied();
        }
        self.hosts.insert(inner, host);
        self.internals.entry(host).or_default().push(inner);
        Ok(())
    }

    /// Number of entities internal to `host`.
    #[must_use]
    pub fn internal_count(&self, host: EntityId) -> usize {
        self.internals.get(&host).map_or(0, Vec::len)
    }

    /// The entities internal to `host`, in insertion order.
    #[must_use]
    pub fn internals_of(&self, host: EntityId) -> &[EntityId] {
        self.internals.get(&host).map_or(&[], Vec::as_slice)
    }

    /// The host of `inner`, if any.
    #[must_use]
    pub fn host_of(&self, inner: EntityId) -> Option<EntityId> {
        self.hosts.get(&inner).copied()
    }

    /// Total number of internal relations in the graph.
    #[must_use]
    pub fn nb_internal_relations(&self) -> usize {
        self.hosts.len()
    }

    /// Iterates over all boundary relations as `(lower, upper)` pairs.
    pub fn boundary_relations(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.boundaries
            .iter()
            .flat_map(|(&upper, lowers)| lowers.iter().map(move |&lower| (lower, upper)))
    }

    /// Iterates over all internal relations as `(inner, host)` pairs.
    pub fn internal_relations(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.hosts.iter().map(|(&inner, &host)| (inner, host))
    }

    /// Drops every relation referencing `id`, in both directions.
    pub fn remove_entity(&mut self, id: EntityId) {
        if let Some(lowers) = self.boundaries.remove(&id) {
            for lower in lowers {
                if let Some(ups) = self.incidences.get_mut(&lower) {
                    ups.retain(|&u| u != id);
                }
            }
        }
        if let Some(uppers) = self.incidences.remove(&id) {
            for upper in uppers {
                if let Some(lows) = self.boundaries.get_mut(&upper) {
                    lows.retain(|&l| l != id);
                }
            }
        }
        if let Some(host) = self.hosts.remove(&id) {
            if let Some(inners) = self.internals.get_mut(&host) {
                inners.retain(|&i| i != id);
            }
        }
        if let Some(inners) = self.internals.remove(&id) {
            for inner in inners {
                self.hosts.remove(&inner);
            }
        }
    }

    /// Checks the mutual consistency of the four indexes.
    ///
    /// Index mismatches are programming errors, so this only runs at
    /// format boundaries and in tests.
    pub fn verify_integrity(&self) -> Result<(), ModelError> {
        for (&upper, lowers) in &self.boundaries {
            for lower in lowers {
                if !self.incidences_of(*lower).contains(&upper) {
                    return Err(ModelError::Corrupted(format!(
                        "boundary {lower} -> {upper} missing from incidence index"
                    )));
                }
            }
        }
        for (&inner, &host) in &self.hosts {
            if !self.internals_of(host).contains(&inner) {
                return Err(ModelError::Corrupted(format!(
                    "internal {inner} -> {host} missing from host index"
                )));
            }
        }
        for (&host, inners) in &self.internals {
            for inner in inners {
                if self.hosts.get(inner) != Some(&host) {
                    return Err(ModelError::Corrupted(format!(
                        "internal {inner} -> {host} missing from inner index"
                    )));
                }
            }
        }
        Ok(())
    }
}
