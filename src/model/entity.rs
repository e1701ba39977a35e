use serde::{Deserialize, Serialize};

use super::{BlockId, CornerId, LineId, SurfaceId};

/// The closed set of geometric entity kinds, in dimension order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Corner,
    Line,
    Surface,
    Block,
}

impl EntityKind {
    /// Topological dimension of entities of this kind.
    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            Self::Corner => 0,
            Self::Line => 1,
            Self::Surface => 2,
            Self::Block => 3,
        }
    }

    /// Lowercase label used in diagnostics and file records.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Corner => "corner",
            Self::Line => "line",
            Self::Surface => "surface",
            Self::Block => "block",
        }
    }
}

/// Kind-tagged identifier addressing any entity of a structural model.
///
/// Relations and collections reference entities through this type so
/// the entity store stays the sole owner; the per-kind identifier
/// spaces remain disjoint because the tag is part of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Corner(CornerId),
    Line(LineId),
    Surface(SurfaceId),
    Block(BlockId),
}

impl EntityId {
    /// Returns the kind tag of this identifier.
    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Corner(_) => EntityKind::Corner,
            Self::Line(_) => EntityKind::Line,
            Self::Surface(_) => EntityKind::Surface,
            Self::Block(_) => EntityKind::Block,
        }
    }
}

impl From<CornerId> for EntityId {
    fn from(id: CornerId) -> Self {
        Self::Corner(id)
    }
}

impl From<LineId> for EntityId {
    fn from(id: LineId) -> Self {
        Self::Line(id)
    }
}

impl From<SurfaceId> for EntityId {
    fn from(id: SurfaceId) -> Self {
        Self::Surface(id)
    }
}

impl From<BlockId> for EntityId {
    fn from(id: BlockId) -> Self {
        Self::Block(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corner(id) => write!(f, "corner {id:?}"),
            Self::Line(id) => write!(f, "line {id:?}"),
            Self::Surface(id) => write!(f, "surface {id:?}"),
            Self::Block(id) => write!(f, "block {id:?}"),
        }
    }
}
