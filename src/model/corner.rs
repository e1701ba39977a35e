slotmap::new_key_type! {
    /// Unique identifier for a corner in a structural model.
    pub struct CornerId;
}

/// Data associated with a corner, the zero-dimensional entity kind.
#[derive(Debug, Clone)]
pub struct CornerData {
    /// Display name, free text, not guaranteed unique.
    pub name: String,
}

impl CornerData {
    /// Creates a new corner with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
