use crate::mesh::TriangulatedSurface;

slotmap::new_key_type! {
    /// Unique identifier for a surface in a structural model.
    pub struct SurfaceId;
}

/// Data associated with a surface, the two-dimensional entity kind.
///
/// A surface may carry a triangulated mesh payload; an empty mesh means
/// the geometry is unknown or managed elsewhere. Topological relations
/// (bounding lines, bounded blocks) live in the relationship graph.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    /// Display name, free text, not guaranteed unique.
    pub name: String,
    /// Optional geometric payload.
    pub mesh: TriangulatedSurface,
}

impl SurfaceData {
    /// Creates a new surface with the given display name and no mesh.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: TriangulatedSurface::new(),
        }
    }

    /// Creates a new surface carrying a mesh payload.
    #[must_use]
    pub fn with_mesh(name: impl Into<String>, mesh: TriangulatedSurface) -> Self {
        Self {
            name: name.into(),
            mesh,
        }
    }
}
