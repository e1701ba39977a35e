use serde::{Deserialize, Serialize};

use crate::model::EntityId;

slotmap::new_key_type! {
    /// Unique identifier for a geological collection in a model.
    pub struct CollectionId;
}

/// Subtype of a fault, as encoded by legacy geological features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaultKind {
    #[default]
    NoType,
    Normal,
    Reverse,
}

/// Contact subtype of a horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizonKind {
    #[default]
    NoType,
    Conformal,
    NonConformal,
    Topography,
    Intrusion,
}

/// The closed set of geological collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    Fault(FaultKind),
    Horizon(HorizonKind),
    ModelBoundary,
}

impl CollectionKind {
    /// Lowercase label used in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fault(_) => "fault",
            Self::Horizon(_) => "horizon",
            Self::ModelBoundary => "model boundary",
        }
    }
}

/// A named geological grouping of base entities.
///
/// Members are entity identifiers, never entity copies; membership is
/// mutated only through [`CollectionStore`](super::CollectionStore) so
/// the reverse index stays consistent.
#[derive(Debug, Clone)]
pub struct CollectionData {
    /// Display name, free text, not guaranteed unique.
    pub name: String,
    kind: CollectionKind,
    pub(super) members: Vec<EntityId>,
}

impl CollectionData {
    pub(super) fn new(kind: CollectionKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
        }
    }

    /// Returns the kind of this collection.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// The member entities, in insertion order.
    #[must_use]
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Number of member entities.
    #[must_use]
    pub fn nb_members(&self) -> usize {
        self.members.len()
    }
}
